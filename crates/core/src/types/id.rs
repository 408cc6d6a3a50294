//! Newtype IDs for type-safe entity references.
//!
//! Use the `define_id!` macro to create type-safe ID wrappers that prevent
//! accidentally mixing IDs from different entity types. Product ids are
//! special-cased: they are carried as strings (see [`ProductId`]).

use core::fmt;

use serde::{Deserialize, Serialize};

/// Macro to define a type-safe ID wrapper.
///
/// Creates a newtype wrapper around `i64` with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `Copy`, `PartialEq`, `Eq`, `Hash`
/// - Conversion methods: `new()`, `as_i64()`
/// - `From<i64>` and `Into<i64>` implementations
///
/// # Example
///
/// ```rust
/// # use huerta_core::define_id;
/// define_id!(UserId);
/// define_id!(OrderId);
///
/// let user_id = UserId::new(1);
/// let order_id = OrderId::new(1);
///
/// // These are different types, so this won't compile:
/// // let _: UserId = order_id;
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            Hash,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            /// Create a new ID from an i64 value.
            #[must_use]
            pub const fn new(id: i64) -> Self {
                Self(id)
            }

            /// Get the underlying i64 value.
            #[must_use]
            pub const fn as_i64(&self) -> i64 {
                self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i64> for $name {
            fn from(id: i64) -> Self {
                Self(id)
            }
        }

        impl From<$name> for i64 {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

// Define standard entity IDs
define_id!(UserId);
define_id!(OrderId);

/// Stable external product identifier.
///
/// The backend assigns products integer ids, but everything on this side of
/// the boundary carries them as their canonical decimal string: cart lines
/// are keyed by it, persisted carts store it, and order submissions echo it
/// back verbatim. The string form sidesteps precision issues if the backend
/// ever widens its id space.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(String);

impl ProductId {
    /// Create a product id from an already-canonical string.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the id and returns its inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for ProductId {
    fn from(id: i64) -> Self {
        Self(id.to_string())
    }
}

impl From<&str> for ProductId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl AsRef<str> for ProductId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_ids_are_distinct_types() {
        let user_id = UserId::new(1);
        let order_id = OrderId::new(1);
        assert_eq!(user_id.as_i64(), order_id.as_i64());
    }

    #[test]
    fn test_entity_id_display() {
        assert_eq!(UserId::new(42).to_string(), "42");
        assert_eq!(OrderId::new(7).to_string(), "7");
    }

    #[test]
    fn test_entity_id_serde_transparent() {
        let id = UserId::new(3);
        assert_eq!(serde_json::to_string(&id).unwrap(), "3");
        let back: UserId = serde_json::from_str("3").unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn test_product_id_from_wire_integer() {
        let id = ProductId::from(5_i64);
        assert_eq!(id.as_str(), "5");
        assert_eq!(id, ProductId::new("5"));
    }

    #[test]
    fn test_product_id_serde_is_string() {
        let id = ProductId::from(12_i64);
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"12\"");
        let back: ProductId = serde_json::from_str("\"12\"").unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn test_product_id_equality_is_string_equality() {
        // "05" and "5" are different ids on purpose: the canonical form is
        // whatever the boundary produced, and we never re-parse it.
        assert_ne!(ProductId::new("05"), ProductId::new("5"));
    }
}
