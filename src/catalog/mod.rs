//! Remote catalogs the selectors pick from.

#[cfg(feature = "client")]
mod http;
pub mod models;
mod page;

use std::future::Future;

#[cfg(feature = "client")]
pub use http::{ApiClient, HttpCatalog};
pub use models::{InsuranceCase, Product, Receipt, Sequence, Vehicle, Warehouse};
pub use page::{Page, SearchQuery};
#[cfg(feature = "client")]
pub(crate) use page::ListResponse;

use crate::error::Error;
use crate::selector::Candidate;
use crate::types::EntityId;

/// Search and point-lookup strategy for one catalog.
///
/// Implemented by [`HttpCatalog`] for the REST backend; tests and embedders
/// can provide their own.
///
/// # Example
///
/// ```rust,ignore
/// impl Catalog for FixedWarehouses {
///     type Item = Warehouse;
///
///     async fn search(&self, query: &SearchQuery) -> Result<Page<Warehouse>, Error> {
///         Ok(Page::complete(filter_local(&self.items, &query.text)))
///     }
///
///     async fn fetch(&self, id: &EntityId) -> Result<Warehouse, Error> {
///         self.items.iter().find(|w| &w.id == id).cloned()
///             .ok_or_else(|| Error::Api { operation: "warehouse lookup", status: Some(404), detail: id.to_string() })
///     }
/// }
/// ```
pub trait Catalog: Send + Sync + 'static {
    type Item: Candidate;

    /// List/search endpoint.
    fn search(
        &self,
        query: &SearchQuery,
    ) -> impl Future<Output = Result<Page<Self::Item>, Error>> + Send;

    /// Point lookup by id.
    fn fetch(&self, id: &EntityId) -> impl Future<Output = Result<Self::Item, Error>> + Send;
}
