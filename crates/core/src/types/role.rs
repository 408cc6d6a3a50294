//! User roles, parsed strictly at the external-interface boundary.
//!
//! The backend has historically encoded roles three different ways: as a
//! string (`"admin"`, `"cliente"`), as a numeric code (`1`, `2`), and as a
//! small object (`{"name": "admin"}`). [`RawRole`] accepts all of them;
//! [`Role`] is the closed set everything past the boundary works with.
//! Anything that does not map onto the closed set is a parse error; raw
//! role values are never carried forward.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`Role`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum RoleParseError {
    /// The role name is not one of the known spellings.
    #[error("unknown role name: {0:?}")]
    UnknownName(String),
    /// The numeric role code is not one of the known codes.
    #[error("unknown role code: {0}")]
    UnknownCode(i64),
    /// The role object carried neither a `name` nor a `role` field.
    #[error("role object has no name")]
    EmptyObject,
}

/// A user's role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Back-office administrator.
    Admin,
    /// Regular storefront customer.
    Customer,
}

impl Role {
    /// Whether this role grants back-office access.
    #[must_use]
    pub const fn is_admin(self) -> bool {
        matches!(self, Self::Admin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Admin => write!(f, "admin"),
            Self::Customer => write!(f, "customer"),
        }
    }
}

impl std::str::FromStr for Role {
    type Err = RoleParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "admin" | "administrador" | "administrator" => Ok(Self::Admin),
            "customer" | "cliente" | "client" | "user" => Ok(Self::Customer),
            _ => Err(RoleParseError::UnknownName(s.to_string())),
        }
    }
}

/// A role value as it may arrive from the backend.
///
/// Deserialized leniently (string, number, or object), then converted into
/// the closed [`Role`] enum via [`TryFrom`]. Numeric codes follow the
/// backend's user table: `1` is admin, `2` is customer.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawRole {
    /// Role spelled out, e.g. `"admin"` or `"cliente"`.
    Name(String),
    /// Numeric role code from older backend revisions.
    Code(i64),
    /// Object wrapper, e.g. `{"name": "admin"}`.
    Object(RawRoleObject),
}

/// Object form of a wire role.
#[derive(Debug, Clone, Deserialize)]
pub struct RawRoleObject {
    /// Role name under the `name` key.
    #[serde(default)]
    pub name: Option<String>,
    /// Role name under the `role` key (seen in some user payloads).
    #[serde(default)]
    pub role: Option<String>,
}

impl TryFrom<RawRole> for Role {
    type Error = RoleParseError;

    fn try_from(raw: RawRole) -> Result<Self, Self::Error> {
        match raw {
            RawRole::Name(name) => name.parse(),
            RawRole::Code(1) => Ok(Self::Admin),
            RawRole::Code(2) => Ok(Self::Customer),
            RawRole::Code(other) => Err(RoleParseError::UnknownCode(other)),
            RawRole::Object(obj) => obj
                .name
                .or(obj.role)
                .ok_or(RoleParseError::EmptyObject)?
                .parse(),
        }
    }
}
