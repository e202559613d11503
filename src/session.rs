//! Session state: the current bearer token and the user profile.
//!
//! [`SessionState`] is the only owner of persisted session data. Other
//! modules receive it behind an `Arc` and go through its accessors; nothing
//! else talks to [`SessionStorage`] directly.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use tokio::sync::watch;

use crate::error::Error;
use crate::types::UserProfile;

pub const TOKEN_KEY: &str = "token";
pub const PROFILE_KEY: &str = "user";

/// Persistent key/value slot store (browser local storage, a file, memory).
///
/// # Example
///
/// ```rust,ignore
/// impl SessionStorage for LocalStorage {
///     fn get(&self, key: &str) -> Result<Option<String>, Error> {
///         self.inner.get_item(key).map_err(|e| Error::Storage(format!("{e:?}")))
///     }
///     // ...
/// }
/// ```
pub trait SessionStorage: Send + Sync + 'static {
    fn get(&self, key: &str) -> Result<Option<String>, Error>;

    fn set(&self, key: &str, value: &str) -> Result<(), Error>;

    fn remove(&self, key: &str) -> Result<(), Error>;
}

/// Process-local storage.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, String>>,
}

impl SessionStorage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, Error> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), Error> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), Error> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.remove(key);
        Ok(())
    }
}

/// Observable session status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Anonymous,
    Authenticated,
    /// Cleared because the token expired (as opposed to an explicit logout).
    Expired,
}

/// Injected session owner.
pub struct SessionState {
    storage: Box<dyn SessionStorage>,
    status: watch::Sender<SessionStatus>,
}

impl SessionState {
    /// Wraps `storage`, picking up a token persisted by a previous run.
    #[must_use]
    pub fn new(storage: impl SessionStorage) -> Self {
        let initial = match storage.get(TOKEN_KEY) {
            Ok(Some(token)) if !token.is_empty() => SessionStatus::Authenticated,
            Ok(_) => SessionStatus::Anonymous,
            Err(e) => {
                tracing::warn!(error = %e, "Session storage unreadable; starting anonymous");
                SessionStatus::Anonymous
            }
        };
        let (status, _) = watch::channel(initial);
        Self {
            storage: Box::new(storage),
            status,
        }
    }

    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(MemoryStorage::default())
    }

    /// Current bearer token, if any. Storage failures read as "no token".
    #[must_use]
    pub fn token(&self) -> Option<String> {
        match self.storage.get(TOKEN_KEY) {
            Ok(token) => token.filter(|t| !t.is_empty()),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read session token");
                None
            }
        }
    }

    /// Persisted profile. A corrupt entry reads as `None`.
    #[must_use]
    pub fn profile(&self) -> Option<UserProfile> {
        let raw = self.storage.get(PROFILE_KEY).ok().flatten()?;
        match serde_json::from_str(&raw) {
            Ok(profile) => Some(profile),
            Err(e) => {
                tracing::warn!(error = %e, "Discarding unreadable stored profile");
                None
            }
        }
    }

    #[must_use]
    pub fn status(&self) -> SessionStatus {
        *self.status.borrow()
    }

    /// Watch status transitions (login, logout, expiry).
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionStatus> {
        self.status.subscribe()
    }

    /// Stores a fresh login.
    ///
    /// # Errors
    ///
    /// Returns `Error::Storage` if the backing store rejects the write.
    pub fn establish(&self, token: &str, profile: &UserProfile) -> Result<(), Error> {
        let profile_json =
            serde_json::to_string(profile).map_err(|e| Error::Storage(e.to_string()))?;
        self.storage.set(TOKEN_KEY, token)?;
        self.storage.set(PROFILE_KEY, &profile_json)?;
        self.status.send_replace(SessionStatus::Authenticated);
        Ok(())
    }

    /// Swaps the token after a refresh, keeping the profile.
    ///
    /// # Errors
    ///
    /// Returns `Error::Storage` if the backing store rejects the write.
    pub fn replace_token(&self, token: &str) -> Result<(), Error> {
        self.storage.set(TOKEN_KEY, token)?;
        self.status.send_replace(SessionStatus::Authenticated);
        Ok(())
    }

    /// Explicit logout.
    pub fn logout(&self) {
        self.clear_with(SessionStatus::Anonymous);
    }

    /// Logout forced by token expiry.
    pub fn expire(&self) {
        self.clear_with(SessionStatus::Expired);
    }

    fn clear_with(&self, status: SessionStatus) {
        // Token and profile always go together; keep going if one removal fails.
        for key in [TOKEN_KEY, PROFILE_KEY] {
            if let Err(e) = self.storage.remove(key) {
                tracing::error!(error = %e, key, "Failed to clear session entry");
            }
        }
        self.status.send_replace(status);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{RoleFlags, UserId};

    fn profile() -> UserProfile {
        UserProfile::new(UserId(9), "Marta").with_roles(RoleFlags {
            billing: true,
            ..RoleFlags::default()
        })
    }

    #[test]
    fn starts_anonymous_on_empty_storage() {
        let session = SessionState::in_memory();
        assert_eq!(session.status(), SessionStatus::Anonymous);
        assert_eq!(session.token(), None);
        assert_eq!(session.profile(), None);
    }

    #[test]
    fn picks_up_persisted_token() {
        let storage = MemoryStorage::default();
        storage.set(TOKEN_KEY, "a.b.c").unwrap();
        let session = SessionState::new(storage);

        assert_eq!(session.status(), SessionStatus::Authenticated);
        assert_eq!(session.token().as_deref(), Some("a.b.c"));
    }

    #[test]
    fn establish_then_logout_clears_both_entries() {
        let session = SessionState::in_memory();
        session.establish("a.b.c", &profile()).unwrap();

        assert_eq!(session.profile(), Some(profile()));
        assert_eq!(session.status(), SessionStatus::Authenticated);

        session.logout();
        assert_eq!(session.token(), None);
        assert_eq!(session.profile(), None);
        assert_eq!(session.status(), SessionStatus::Anonymous);
    }

    #[test]
    fn replace_token_keeps_profile() {
        let session = SessionState::in_memory();
        session.establish("old.t.k", &profile()).unwrap();
        session.replace_token("new.t.k").unwrap();

        assert_eq!(session.token().as_deref(), Some("new.t.k"));
        assert_eq!(session.profile(), Some(profile()));
    }

    #[test]
    fn expire_is_observable() {
        let session = SessionState::in_memory();
        session.establish("a.b.c", &profile()).unwrap();
        let mut rx = session.subscribe();

        session.expire();
        assert!(rx.has_changed().unwrap());
        assert_eq!(*rx.borrow_and_update(), SessionStatus::Expired);
        assert_eq!(session.token(), None);
    }

    #[test]
    fn empty_token_reads_as_absent() {
        let storage = MemoryStorage::default();
        storage.set(TOKEN_KEY, "").unwrap();
        let session = SessionState::new(storage);
        assert_eq!(session.token(), None);
    }
}
