use serde::{Deserialize, Serialize};

/// One page of catalog results.
///
/// Mirrors the backend's `{data, total, limit, offset}` envelope. Catalogs
/// that answer with a bare array are read as a single complete page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub total: u64,
    #[serde(default)]
    pub limit: u64,
    #[serde(default)]
    pub offset: u64,
}

impl<T> Page<T> {
    /// A page holding the whole result set.
    #[must_use]
    pub fn complete(data: Vec<T>) -> Self {
        let len = data.len() as u64;
        Self {
            data,
            total: len,
            limit: len,
            offset: 0,
        }
    }

    /// Whether the server has rows beyond this page.
    #[must_use]
    pub fn has_more(&self) -> bool {
        self.offset + (self.data.len() as u64) < self.total
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
#[cfg_attr(not(feature = "client"), allow(dead_code))]
pub(crate) enum ListResponse<T> {
    Paged(Page<T>),
    Flat(Vec<T>),
}

impl<T> From<ListResponse<T>> for Page<T> {
    fn from(response: ListResponse<T>) -> Self {
        match response {
            ListResponse::Paged(page) => page,
            ListResponse::Flat(data) => Page::complete(data),
        }
    }
}

/// Search parameters sent to a catalog list endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub text: String,
    pub limit: usize,
    pub offset: usize,
}

impl SearchQuery {
    #[must_use]
    pub fn new(text: impl Into<String>, limit: usize) -> Self {
        Self {
            text: text.into(),
            limit,
            offset: 0,
        }
    }

    #[must_use]
    pub fn at_offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }
}
