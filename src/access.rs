//! Panel route guard.

use crate::clock::Clock;
use crate::session::SessionState;
use crate::token::TokenDecoder;
use crate::types::{RoleFlags, UserProfile};

/// Client-side navigation, implemented by the host UI.
pub trait Navigator: Send + Sync + 'static {
    fn redirect(&self, path: &str);
}

/// Dashboard sections behind the guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum Panel {
    Dashboard,
    Invoicing,
    Purchasing,
    Inventory,
    Clients,
    Vehicles,
    Receptions,
    Users,
}

/// Guard decision for a panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Granted,
    /// No usable session; send the user to the login route.
    Login,
    /// Authenticated, but the role flags do not cover the panel.
    Forbidden,
}

/// Whether `roles` may open `panel`.
#[must_use]
pub fn roles_allow(roles: RoleFlags, panel: Panel) -> bool {
    if roles.admin {
        return true;
    }
    match panel {
        Panel::Dashboard => true,
        Panel::Invoicing => roles.billing,
        Panel::Purchasing | Panel::Inventory => roles.inventory,
        Panel::Clients | Panel::Vehicles => roles.billing || roles.workshop,
        Panel::Receptions => roles.workshop,
        Panel::Users => false,
    }
}

#[must_use]
pub fn can_access(profile: &UserProfile, panel: Panel) -> bool {
    roles_allow(profile.roles, panel)
}

/// Decides access to `panel` from the current session.
///
/// A missing, malformed or expired token, or a missing profile, means
/// [`Access::Login`].
#[must_use]
pub fn guard<C: Clock>(session: &SessionState, decoder: &TokenDecoder<C>, panel: Panel) -> Access {
    let Some(token) = session.token() else {
        return Access::Login;
    };
    if decoder.is_expired(&token) {
        return Access::Login;
    }
    let Some(profile) = session.profile() else {
        return Access::Login;
    };
    if can_access(&profile, panel) {
        Access::Granted
    } else {
        tracing::debug!(?panel, user = %profile.id, "Panel access denied");
        Access::Forbidden
    }
}

/// Runs [`guard`] and performs the redirect for non-granted outcomes.
pub fn enforce<C: Clock>(
    session: &SessionState,
    decoder: &TokenDecoder<C>,
    panel: Panel,
    navigator: &dyn Navigator,
    login_path: &str,
) -> Access {
    let access = guard(session, decoder, panel);
    match access {
        Access::Granted => {}
        Access::Login => navigator.redirect(login_path),
        Access::Forbidden => navigator.redirect("/"),
    }
    access
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Mutex;

    use super::Navigator;

    #[derive(Default)]
    pub(crate) struct RecordingNavigator {
        pub(crate) visited: Mutex<Vec<String>>,
    }

    impl Navigator for RecordingNavigator {
        fn redirect(&self, path: &str) {
            self.visited.lock().unwrap().push(path.to_owned());
        }
    }
}
