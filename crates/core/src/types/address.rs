//! Shipping address type.

use serde::{Deserialize, Serialize};

/// A Chilean shipping address.
///
/// All three fields are required for checkout; completeness is judged after
/// trimming whitespace so a street of `"   "` does not pass the address
/// check.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingAddress {
    /// Street name and number.
    pub street: String,
    /// Comuna (municipality).
    pub comuna: String,
    /// Region.
    pub region: String,
}

impl ShippingAddress {
    /// Create a new shipping address.
    #[must_use]
    pub fn new(
        street: impl Into<String>,
        comuna: impl Into<String>,
        region: impl Into<String>,
    ) -> Self {
        Self {
            street: street.into(),
            comuna: comuna.into(),
            region: region.into(),
        }
    }

    /// Names of the fields that are empty (after trimming).
    #[must_use]
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.street.trim().is_empty() {
            missing.push("street");
        }
        if self.comuna.trim().is_empty() {
            missing.push("comuna");
        }
        if self.region.trim().is_empty() {
            missing.push("region");
        }
        missing
    }

    /// Whether every field is present and non-blank.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.missing_fields().is_empty()
    }
}
