#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    #[error("Token error: {0}")]
    Token(String),
    #[cfg(feature = "client")]
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("{operation} failed{}: {detail}", status_suffix(.status))]
    Api {
        operation: &'static str,
        status: Option<u16>,
        detail: String,
    },
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Session storage error: {0}")]
    Storage(String),
    #[error("Invalid entity id: {0:?}")]
    InvalidEntityId(String),
}

impl Error {
    /// HTTP status reported by the backend, if any.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => *status,
            #[cfg(feature = "client")]
            Self::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

fn status_suffix(status: &Option<u16>) -> String {
    status.map(|s| format!(" ({s})")).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_error_display_includes_status() {
        let err = Error::Api {
            operation: "warehouse search",
            status: Some(503),
            detail: "unavailable".into(),
        };
        assert_eq!(err.to_string(), "warehouse search failed (503): unavailable");
        assert_eq!(err.status(), Some(503));
    }

    #[test]
    fn api_error_display_without_status() {
        let err = Error::Api {
            operation: "login",
            status: None,
            detail: "no body".into(),
        };
        assert_eq!(err.to_string(), "login failed: no body");
    }
}
