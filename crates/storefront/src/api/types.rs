//! Wire-format DTOs for the Huerta backend REST API.
//!
//! The backend is permissive about numeric fields: prices arrive as decimal
//! strings or bare numbers, stock counts as numbers or numeric strings, and
//! roles in three different encodings. Everything is parsed here into the
//! strict types from `huerta-core`; raw values do not travel past this
//! module.

use serde::Deserialize;
use thiserror::Error;

use huerta_core::{
    Money, MoneyParseError, ProductId, RawRole, Role, RoleParseError, ShippingAddress, UserId,
    WireAmount,
};

use crate::models::{CurrentUser, Product};

/// A payload that deserialized but does not describe a valid entity.
#[derive(Debug, Error)]
pub enum PayloadError {
    /// A product arrived with an unparseable or negative price.
    #[error("product {id}: bad unit price: {source}")]
    ProductPrice {
        /// Wire-side product id.
        id: i64,
        /// Underlying parse failure.
        source: MoneyParseError,
    },
    /// A product arrived with a stock count that is not a non-negative
    /// integer.
    #[error("product {id}: invalid stock quantity {raw:?}")]
    ProductStock {
        /// Wire-side product id.
        id: i64,
        /// The offending raw value.
        raw: String,
    },
    /// A user arrived with a role outside the known encodings.
    #[error("user {id}: unrecognized role: {source}")]
    UserRole {
        /// Wire-side user id.
        id: i64,
        /// Underlying parse failure.
        source: RoleParseError,
    },
    /// The backend accepted an order but did not assign an id.
    #[error("order accepted without an order id")]
    MissingOrderId,
}

// =============================================================================
// Products
// =============================================================================

/// A stock count as it may arrive from the backend.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum WireCount {
    /// Plain JSON number.
    Int(i64),
    /// Numeric string (legacy rows).
    Text(String),
}

impl WireCount {
    /// Interpret as a non-negative integer count.
    fn as_u32(&self) -> Option<u32> {
        match self {
            Self::Int(n) => u32::try_from(*n).ok(),
            Self::Text(s) => s.trim().parse::<u32>().ok(),
        }
    }

    /// The raw value, for error reporting.
    fn raw(&self) -> String {
        match self {
            Self::Int(n) => n.to_string(),
            Self::Text(s) => s.clone(),
        }
    }
}

/// Product record as returned by `GET /products`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireProduct {
    pub id: i64,
    pub name: String,
    pub unit_price: WireAmount,
    pub stock_quantity: WireCount,
    pub active: bool,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl TryFrom<WireProduct> for Product {
    type Error = PayloadError;

    fn try_from(wire: WireProduct) -> Result<Self, Self::Error> {
        let unit_price = Money::from_wire(&wire.unit_price)
            .map_err(|source| PayloadError::ProductPrice { id: wire.id, source })?;
        let stock_quantity = wire
            .stock_quantity
            .as_u32()
            .ok_or_else(|| PayloadError::ProductStock {
                id: wire.id,
                raw: wire.stock_quantity.raw(),
            })?;
        Ok(Self {
            id: ProductId::from(wire.id),
            name: wire.name,
            unit_price,
            stock_quantity,
            active: wire.active,
            image_url: wire.image_url,
            category: wire.category,
            description: wire.description,
        })
    }
}

// =============================================================================
// Users
// =============================================================================

/// User record as returned by `GET /users/{id}`.
///
/// Address fields may be absent or empty; completeness is only judged at
/// checkout.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireUser {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub role: RawRole,
    #[serde(default)]
    pub street: String,
    #[serde(default)]
    pub comuna: String,
    #[serde(default)]
    pub region: String,
}

impl TryFrom<WireUser> for CurrentUser {
    type Error = PayloadError;

    fn try_from(wire: WireUser) -> Result<Self, Self::Error> {
        let role = Role::try_from(wire.role)
            .map_err(|source| PayloadError::UserRole { id: wire.id, source })?;
        Ok(Self {
            id: UserId::new(wire.id),
            name: wire.name,
            email: wire.email,
            role,
            address: ShippingAddress::new(wire.street, wire.comuna, wire.region),
        })
    }
}

// =============================================================================
// Orders
// =============================================================================

/// Response body of `POST /orders`.
///
/// Rejections sometimes ride on error statuses with only a `message`, so
/// every field is defaulted.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub order_id: Option<i64>,
    #[serde(default)]
    pub message: Option<String>,
}
