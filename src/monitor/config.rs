use crate::clock::Millis;
use crate::error::Error;
use crate::token::DEFAULT_EXPIRY_MARGIN_MS;

/// Token monitor timing.
///
/// Defaults: poll every 60 s, treat the token as expired 60 s before `exp`,
/// and switch to short re-checks (at most 30 s apart) once less than 120 s
/// remain.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub struct MonitorConfig {
    pub(crate) interval_ms: Millis,
    pub(crate) margin_ms: Millis,
    pub(crate) warning_ms: Millis,
    pub(crate) recheck_cap_ms: Millis,
    pub(crate) check_immediately: bool,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            interval_ms: 60_000,
            margin_ms: DEFAULT_EXPIRY_MARGIN_MS,
            warning_ms: 120_000,
            recheck_cap_ms: 30_000,
            check_immediately: true,
        }
    }
}

impl MonitorConfig {
    /// Defaults overridden by environment variables.
    ///
    /// # Optional env vars
    /// - `TALLER_MONITOR_INTERVAL_MS`: regular polling interval
    /// - `TALLER_TOKEN_MARGIN_MS`: safety margin before `exp`
    /// - `TALLER_TOKEN_WARNING_MS`: remaining time below which re-checks tighten
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if a variable is set but not a positive integer.
    pub fn from_env() -> Result<Self, Error> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, Error> {
        let mut config = Self::default();
        if let Some(v) = lookup("TALLER_MONITOR_INTERVAL_MS") {
            config.interval_ms = parse_ms("TALLER_MONITOR_INTERVAL_MS", &v)?;
        }
        if let Some(v) = lookup("TALLER_TOKEN_MARGIN_MS") {
            config.margin_ms = parse_ms("TALLER_TOKEN_MARGIN_MS", &v)?;
        }
        if let Some(v) = lookup("TALLER_TOKEN_WARNING_MS") {
            config.warning_ms = parse_ms("TALLER_TOKEN_WARNING_MS", &v)?;
        }
        Ok(config)
    }

    #[must_use]
    pub fn with_interval_ms(mut self, interval_ms: Millis) -> Self {
        self.interval_ms = interval_ms.max(1);
        self
    }

    #[must_use]
    pub fn with_margin_ms(mut self, margin_ms: Millis) -> Self {
        self.margin_ms = margin_ms.max(0);
        self
    }

    #[must_use]
    pub fn with_warning_ms(mut self, warning_ms: Millis) -> Self {
        self.warning_ms = warning_ms.max(0);
        self
    }

    #[must_use]
    pub fn with_check_immediately(mut self, check: bool) -> Self {
        self.check_immediately = check;
        self
    }

    #[must_use]
    pub fn interval_ms(&self) -> Millis {
        self.interval_ms
    }

    #[must_use]
    pub fn margin_ms(&self) -> Millis {
        self.margin_ms
    }

    #[must_use]
    pub fn warning_ms(&self) -> Millis {
        self.warning_ms
    }

    #[must_use]
    pub fn check_immediately(&self) -> bool {
        self.check_immediately
    }
}

fn parse_ms(key: &str, value: &str) -> Result<Millis, Error> {
    match value.trim().parse::<Millis>() {
        Ok(ms) if ms > 0 => Ok(ms),
        Ok(ms) => Err(Error::Config(format!("{key}: must be positive, got {ms}"))),
        Err(e) => Err(Error::Config(format!("{key}: {e}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = MonitorConfig::default();
        assert_eq!(config.interval_ms(), 60_000);
        assert_eq!(config.margin_ms(), 60_000);
        assert_eq!(config.warning_ms(), 120_000);
        assert!(config.check_immediately());
    }

    #[test]
    fn lookup_overrides_and_rejects_garbage() {
        let config = MonitorConfig::from_lookup(|k| match k {
            "TALLER_TOKEN_MARGIN_MS" => Some("30000".into()),
            _ => None,
        })
        .unwrap();
        assert_eq!(config.margin_ms(), 30_000);
        assert_eq!(config.interval_ms(), 60_000);

        let err = MonitorConfig::from_lookup(|k| {
            (k == "TALLER_MONITOR_INTERVAL_MS").then(|| "0".to_string())
        });
        assert!(matches!(err, Err(Error::Config(_))));
    }
}
