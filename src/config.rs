use std::time::Duration;

use url::Url;

use crate::error::Error;

const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Backend API configuration.
///
/// Required field (`base_url`) is a constructor parameter. Use
/// [`from_env()`](ApiConfig::from_env) for deployment setup.
///
/// ```rust,ignore
/// let config = ApiConfig::new("https://api.taller.example/api/".parse()?)
///     .with_request_timeout(Duration::from_secs(10));
/// ```
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct ApiConfig {
    pub(crate) base_url: Url,
    pub(crate) request_timeout: Duration,
    pub(crate) login_path: String,
}

impl ApiConfig {
    #[must_use]
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url: with_trailing_slash(base_url),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            login_path: "/login".into(),
        }
    }

    /// Create config from environment variables.
    ///
    /// # Required env vars
    /// - `TALLER_API_URL`: base URL of the REST backend
    ///
    /// # Optional env vars
    /// - `TALLER_REQUEST_TIMEOUT_SECS`: per-request timeout (default 30)
    /// - `TALLER_LOGIN_PATH`: client route the user is sent to on logout/expiry
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if `TALLER_API_URL` is missing or a value is invalid.
    pub fn from_env() -> Result<Self, Error> {
        let base = std::env::var("TALLER_API_URL")
            .map_err(|_| Error::Config("TALLER_API_URL is required".into()))?;
        Self::from_lookup(&base, |key| std::env::var(key).ok())
    }

    fn from_lookup(base: &str, lookup: impl Fn(&str) -> Option<String>) -> Result<Self, Error> {
        let base_url: Url = base
            .parse()
            .map_err(|e| Error::Config(format!("TALLER_API_URL: {e}")))?;
        let mut config = Self::new(base_url);

        if let Some(secs) = lookup("TALLER_REQUEST_TIMEOUT_SECS") {
            let secs: u64 = secs
                .trim()
                .parse()
                .map_err(|e| Error::Config(format!("TALLER_REQUEST_TIMEOUT_SECS: {e}")))?;
            config = config.with_request_timeout(Duration::from_secs(secs));
        }
        if let Some(path) = lookup("TALLER_LOGIN_PATH") {
            config = config.with_login_path(path);
        }
        Ok(config)
    }

    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_login_path(mut self, path: impl Into<String>) -> Self {
        self.login_path = path.into();
        self
    }

    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    #[must_use]
    pub fn login_path(&self) -> &str {
        &self.login_path
    }

    /// Resolves `path` (no leading slash) against the base URL.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the joined URL is invalid.
    pub fn endpoint(&self, path: &str) -> Result<Url, Error> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| Error::Config(format!("endpoint {path}: {e}")))
    }
}

fn with_trailing_slash(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn endpoint_keeps_base_path() {
        let config = ApiConfig::new("https://api.taller.test/api".parse().unwrap());

        assert_eq!(config.base_url().as_str(), "https://api.taller.test/api/");
        assert_eq!(
            config.endpoint("bodegas").unwrap().as_str(),
            "https://api.taller.test/api/bodegas"
        );
        assert_eq!(
            config.endpoint("/vehiculos/4").unwrap().as_str(),
            "https://api.taller.test/api/vehiculos/4"
        );
    }

    #[test]
    fn lookup_overrides() {
        let env: HashMap<&str, &str> = [
            ("TALLER_REQUEST_TIMEOUT_SECS", "5"),
            ("TALLER_LOGIN_PATH", "/auth/login"),
        ]
        .into_iter()
        .collect();

        let config = ApiConfig::from_lookup("http://localhost:8000/", |k| {
            env.get(k).map(|v| (*v).to_string())
        })
        .unwrap();

        assert_eq!(config.request_timeout(), Duration::from_secs(5));
        assert_eq!(config.login_path(), "/auth/login");
    }

    #[test]
    fn invalid_values_are_config_errors() {
        assert!(matches!(
            ApiConfig::from_lookup("not a url", |_| None),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            ApiConfig::from_lookup("http://localhost/", |k| {
                (k == "TALLER_REQUEST_TIMEOUT_SECS").then(|| "soon".to_string())
            }),
            Err(Error::Config(_))
        ));
    }
}
