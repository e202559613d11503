//! Session token expiration monitor.
//!
//! [`ExpirationMonitor`] is a timer-free state machine: [`check`](ExpirationMonitor::check)
//! inspects the current token and [`next_wake`] turns the outcome into the
//! next wake time. [`spawn`] drives it on tokio.
//!
//! ```rust,ignore
//! let monitor = ExpirationMonitor::new(session.clone(), SystemClock, MonitorConfig::default())
//!     .with_navigator(navigator, "/login");
//! let handle = taller_admin::monitor::spawn(monitor);
//! // on teardown
//! handle.stop();
//! ```

mod config;
mod driver;
mod schedule;

use std::sync::Arc;

pub use config::MonitorConfig;
pub use driver::{MonitorHandle, spawn};
pub use schedule::{CheckOutcome, Wake, next_wake};

use crate::access::Navigator;
use crate::clock::{Clock, Millis};
use crate::session::SessionState;
use crate::token::TokenDecoder;

/// Why the session was ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpiryReason {
    /// `now >= exp - margin`.
    Expired,
    /// Wrong segment count, undecodable payload, or no `exp` claim.
    Malformed,
}

/// Passed to the expiry callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpiryEvent {
    pub reason: ExpiryReason,
    pub expires_at_ms: Option<Millis>,
    pub detected_at_ms: Millis,
}

type ExpiryCallback = Box<dyn FnMut(&ExpiryEvent) + Send>;

pub struct ExpirationMonitor<C> {
    session: Arc<SessionState>,
    decoder: TokenDecoder<C>,
    config: MonitorConfig,
    on_expire: Option<ExpiryCallback>,
    navigator: Option<(Arc<dyn Navigator>, String)>,
    fired_for: Option<String>,
}

impl<C: Clock> ExpirationMonitor<C> {
    #[must_use]
    pub fn new(session: Arc<SessionState>, clock: C, config: MonitorConfig) -> Self {
        let decoder = TokenDecoder::new(clock).with_margin_ms(config.margin_ms);
        Self {
            session,
            decoder,
            config,
            on_expire: None,
            navigator: None,
            fired_for: None,
        }
    }

    /// Replaces the default redirect with a custom callback.
    #[must_use]
    pub fn on_expire(mut self, callback: impl FnMut(&ExpiryEvent) + Send + 'static) -> Self {
        self.on_expire = Some(Box::new(callback));
        self
    }

    /// Default action: redirect to `login_path` after clearing the session.
    #[must_use]
    pub fn with_navigator(mut self, navigator: Arc<dyn Navigator>, login_path: impl Into<String>) -> Self {
        self.navigator = Some((navigator, login_path.into()));
        self
    }

    #[must_use]
    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    /// Inspects the current token once.
    ///
    /// On expiry this clears the session and runs the expiry action. The
    /// action runs at most once per token string.
    pub fn check(&mut self) -> CheckOutcome {
        let Some(token) = self.session.token() else {
            return CheckOutcome::NoToken;
        };
        let now = self.decoder.clock().now_ms();

        let (reason, expires_at_ms) = match self.decoder.expires_at_ms(&token) {
            Some(exp) if now < exp.saturating_sub(self.config.margin_ms) => {
                return CheckOutcome::Valid {
                    remaining_ms: exp - now,
                };
            }
            Some(exp) => (ExpiryReason::Expired, Some(exp)),
            None => (ExpiryReason::Malformed, None),
        };

        if self.fired_for.as_deref() == Some(token.as_str()) {
            return CheckOutcome::Expired;
        }
        self.fired_for = Some(token);

        let event = ExpiryEvent {
            reason,
            expires_at_ms,
            detected_at_ms: now,
        };
        tracing::info!(?reason, ?expires_at_ms, "Session token expired; logging out");

        self.session.expire();
        self.decoder.clear();

        if let Some(callback) = self.on_expire.as_mut() {
            callback(&event);
        } else if let Some((navigator, login_path)) = &self.navigator {
            navigator.redirect(login_path);
        } else {
            tracing::warn!("Token expired with no expiry callback or navigator configured");
        }
        CheckOutcome::Expired
    }

    /// [`next_wake`] with this monitor's config.
    #[must_use]
    pub fn next_wake(&self, outcome: CheckOutcome) -> Wake {
        next_wake(outcome, &self.config)
    }
}
