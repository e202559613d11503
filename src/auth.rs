use serde::{Deserialize, Serialize};

use crate::catalog::ApiClient;
use crate::error::Error;
use crate::types::UserProfile;

#[derive(Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

/// Response from `POST auth/login`.
#[derive(Debug, Clone, Deserialize)]
#[non_exhaustive]
pub struct LoginResponse {
    pub token: String,
    pub user: UserProfile,
}

#[derive(Deserialize)]
struct RefreshResponse {
    token: String,
}

/// Login, refresh and logout against the backend's auth endpoints.
///
/// The session is written here and nowhere else; other modules read it
/// through [`SessionState`](crate::session::SessionState).
#[derive(Clone)]
pub struct AuthClient {
    api: ApiClient,
}

impl AuthClient {
    #[must_use]
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    /// Exchange credentials for a token and store the session.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Http`] on network failure, [`Error::Api`] if the
    /// credentials are rejected, or [`Error::Storage`] if the session cannot
    /// be persisted.
    pub async fn login(&self, email: &str, password: &str) -> Result<UserProfile, Error> {
        let response: LoginResponse = self
            .api
            .post_json("auth/login", &LoginRequest { email, password }, "login")
            .await?;
        self.api.session().establish(&response.token, &response.user)?;
        tracing::info!(user = %response.user.id, "Logged in");
        Ok(response.user)
    }

    /// Trade the current token for a fresh one.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Token`] if there is no session, or the request error.
    /// A rejected refresh (401) ends the session.
    pub async fn refresh(&self) -> Result<(), Error> {
        if self.api.session().token().is_none() {
            return Err(Error::Token("no session to refresh".into()));
        }
        let result: Result<RefreshResponse, Error> = self
            .api
            .post_json("auth/refresh", &serde_json::json!({}), "token refresh")
            .await;
        match result {
            Ok(response) => self.api.session().replace_token(&response.token),
            Err(e) => {
                if e.status() == Some(401) {
                    tracing::warn!("Refresh rejected; ending session");
                    self.api.session().expire();
                }
                Err(e)
            }
        }
    }

    /// Clears the local session. The backend keeps no server-side session.
    pub fn logout(&self) {
        self.api.session().logout();
    }
}
