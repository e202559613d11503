#![doc = include_str!("../README.md")]

pub mod access;
#[cfg(feature = "client")]
pub mod auth;
pub mod catalog;
pub mod clock;
pub mod config;
pub mod error;
pub mod monitor;
pub mod selector;
pub mod session;
pub mod token;
pub mod types;
pub mod validation;

// Re-exports for convenient access
pub use access::{Access, Navigator, Panel, can_access, guard};
#[cfg(feature = "client")]
pub use auth::{AuthClient, LoginResponse};
#[cfg(feature = "client")]
pub use catalog::{ApiClient, HttpCatalog};
pub use catalog::{Catalog, Page, SearchQuery};
pub use clock::{Clock, ManualClock, Millis, SystemClock};
pub use config::ApiConfig;
pub use error::Error;
pub use monitor::{ExpirationMonitor, ExpiryEvent, MonitorConfig, MonitorHandle};
pub use selector::{Candidate, SelectOutcome, Selector, SelectorConfig};
pub use session::{MemoryStorage, SessionState, SessionStatus, SessionStorage};
pub use token::{TokenClaims, TokenDecoder, decode_claims, is_token_expired};
pub use types::{EntityId, RoleFlags, UserId, UserProfile};
