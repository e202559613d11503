use derive_more::{Display, From, Into};
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Catalog record identifier.
///
/// The backend hands out numeric ids for most catalogs and string codes for a
/// few (consecutive-number sequences). Both are carried as their canonical
/// string form so selectors can compare ids without knowing which catalog
/// they came from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display, Into)]
#[serde(try_from = "RawEntityId", into = "String")]
pub struct EntityId(String);

impl EntityId {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Numeric view of the id, for catalogs keyed by integers.
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        self.0.parse().ok()
    }
}

impl From<i64> for EntityId {
    fn from(id: i64) -> Self {
        Self(id.to_string())
    }
}

impl From<u32> for EntityId {
    fn from(id: u32) -> Self {
        Self(id.to_string())
    }
}

impl TryFrom<String> for EntityId {
    type Error = Error;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(Error::InvalidEntityId(s));
        }
        Ok(Self(trimmed.to_owned()))
    }
}

impl TryFrom<&str> for EntityId {
    type Error = Error;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        Self::try_from(s.to_owned())
    }
}

impl std::str::FromStr for EntityId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::try_from(s)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawEntityId {
    Number(i64),
    Text(String),
}

impl TryFrom<RawEntityId> for EntityId {
    type Error = Error;

    fn try_from(raw: RawEntityId) -> Result<Self, Self::Error> {
        match raw {
            RawEntityId::Number(n) => Ok(Self::from(n)),
            RawEntityId::Text(s) => Self::try_from(s),
        }
    }
}

/// Backend user identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Display, From, Into)]
#[serde(transparent)]
pub struct UserId(pub i64);

/// Role flags carried on the user profile.
///
/// The dashboard only looks at these flags; the backend enforces the real
/// permissions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoleFlags {
    #[serde(rename = "is_admin")]
    pub admin: bool,
    #[serde(rename = "is_billing")]
    pub billing: bool,
    #[serde(rename = "is_inventory")]
    pub inventory: bool,
    #[serde(rename = "is_workshop")]
    pub workshop: bool,
}

/// Profile of the logged-in user, persisted next to the session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[non_exhaustive]
pub struct UserProfile {
    pub id: UserId,
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(flatten)]
    pub roles: RoleFlags,
}

impl UserProfile {
    #[must_use]
    pub fn new(id: UserId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            email: None,
            roles: RoleFlags::default(),
        }
    }

    #[must_use]
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    #[must_use]
    pub fn with_roles(mut self, roles: RoleFlags) -> Self {
        self.roles = roles;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entity_id_accepts_numbers_and_strings() {
        let numeric: EntityId = serde_json::from_str("42").unwrap();
        let textual: EntityId = serde_json::from_str("\"FAC-0001\"").unwrap();

        assert_eq!(numeric.as_str(), "42");
        assert_eq!(numeric.as_i64(), Some(42));
        assert_eq!(textual.as_str(), "FAC-0001");
        assert_eq!(textual.as_i64(), None);
    }

    #[test]
    fn entity_id_numeric_and_string_forms_compare_equal() {
        let from_number = EntityId::from(7_i64);
        let from_text: EntityId = "7".parse().unwrap();
        assert_eq!(from_number, from_text);
    }

    #[test]
    fn entity_id_rejects_blank() {
        assert!("".parse::<EntityId>().is_err());
        assert!("   ".parse::<EntityId>().is_err());
        assert!(serde_json::from_str::<EntityId>("\"\"").is_err());
    }

    #[test]
    fn entity_id_serializes_as_string() {
        let id = EntityId::from(12_i64);
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"12\"");
    }

    #[test]
    fn profile_reads_flat_role_flags() {
        let json = r#"{"id":3,"name":"Ana","email":"ana@taller.test","is_admin":true}"#;
        let profile: UserProfile = serde_json::from_str(json).unwrap();

        assert_eq!(profile.id, UserId(3));
        assert!(profile.roles.admin);
        assert!(!profile.roles.billing);
    }

    #[test]
    fn profile_without_flags_has_no_roles() {
        let profile: UserProfile = serde_json::from_str(r#"{"id":1,"name":"Luis"}"#).unwrap();
        assert_eq!(profile.roles, RoleFlags::default());
        assert_eq!(profile.email, None);
    }
}
