//! Domain models for the storefront.
//!
//! Everything here is already parsed: wire payloads go through
//! [`crate::api::types`] first, so these types never carry raw values.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use huerta_core::{CartLine, Money, OrderId, ProductId, Role, ShippingAddress, UserId};

// =============================================================================
// Catalog
// =============================================================================

/// A product as seen by the storefront.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Stable product identifier.
    pub id: ProductId,
    /// Display name.
    pub name: String,
    /// Unit price.
    pub unit_price: Money,
    /// Units currently in stock according to the backend.
    pub stock_quantity: u32,
    /// Whether the product is published on the storefront.
    pub active: bool,
    /// Optional product image URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    /// Optional category name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Optional long description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Product {
    /// Whether the product can currently be added to a cart.
    #[must_use]
    pub const fn is_purchasable(&self) -> bool {
        self.active && self.stock_quantity > 0
    }

    /// Build a cart line for this product with the given quantity.
    #[must_use]
    pub fn to_cart_line(&self, quantity: u32) -> CartLine {
        let mut line = CartLine::new(self.id.clone(), self.name.clone(), self.unit_price, quantity);
        if let Some(url) = &self.image_url {
            line = line.with_image_ref(url.clone());
        }
        line
    }
}

// =============================================================================
// Stock snapshot
// =============================================================================

/// Point-in-time view of backend stock levels.
///
/// Indexes active products only: an inactive product is indistinguishable
/// from one that no longer exists, and both make a cart line unsellable.
#[derive(Debug, Clone)]
pub struct StockSnapshot {
    available: HashMap<ProductId, u32>,
    fetched_at: DateTime<Utc>,
}

impl StockSnapshot {
    /// Index a freshly fetched product list.
    #[must_use]
    pub fn from_products(products: &[Product]) -> Self {
        let available = products
            .iter()
            .filter(|p| p.active)
            .map(|p| (p.id.clone(), p.stock_quantity))
            .collect();
        Self {
            available,
            fetched_at: Utc::now(),
        }
    }

    /// Units available for `product_id`, or `None` if the product is absent
    /// from the snapshot (deleted or deactivated).
    #[must_use]
    pub fn available_for(&self, product_id: &ProductId) -> Option<u32> {
        self.available.get(product_id).copied()
    }

    /// When the snapshot was taken.
    #[must_use]
    pub const fn fetched_at(&self) -> DateTime<Utc> {
        self.fetched_at
    }

    /// Iterate over `(product_id, available)` pairs.
    pub fn entries(&self) -> impl Iterator<Item = (&ProductId, u32)> {
        self.available.iter().map(|(id, qty)| (id, *qty))
    }
}

// =============================================================================
// Identity
// =============================================================================

/// The signed-in user, persisted locally between runs.
///
/// Identity is consumed as an opaque value fetched from the backend; how
/// the user authenticated is not this crate's concern.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentUser {
    /// Backend user id.
    pub id: UserId,
    /// Display name.
    pub name: String,
    /// Contact email.
    pub email: String,
    /// Parsed role.
    pub role: Role,
    /// Shipping address on file; may be incomplete until checkout.
    pub address: ShippingAddress,
}

// =============================================================================
// Order submission
// =============================================================================

/// One line of an order as sent to the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionLine {
    /// Product identifier, canonical string form.
    pub product_id: ProductId,
    /// Units ordered.
    pub quantity: u32,
    /// Unit price at submission time.
    pub unit_price: Money,
}

impl From<&CartLine> for SubmissionLine {
    fn from(line: &CartLine) -> Self {
        Self {
            product_id: line.product_id.clone(),
            quantity: line.quantity,
            unit_price: line.unit_price,
        }
    }
}

/// A complete order as sent to the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderSubmission {
    /// Ordering user.
    pub user_id: UserId,
    /// Shipping address, complete by the time an order is built.
    pub shipping_address: ShippingAddress,
    /// Total recomputed from the lines below.
    pub total: Money,
    /// Order lines.
    pub lines: Vec<SubmissionLine>,
}

impl OrderSubmission {
    /// Build a submission from frozen cart lines, recomputing the total.
    #[must_use]
    pub fn from_lines(user_id: UserId, shipping_address: ShippingAddress, lines: &[CartLine]) -> Self {
        let total = lines.iter().map(CartLine::line_total).sum();
        Self {
            user_id,
            shipping_address,
            total,
            lines: lines.iter().map(SubmissionLine::from).collect(),
        }
    }
}

/// Backend acknowledgement of an accepted order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderReceipt {
    /// Identifier assigned by the backend.
    pub order_id: OrderId,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn product(id: i64, stock: u32, active: bool) -> Product {
        Product {
            id: ProductId::from(id),
            name: format!("Product {id}"),
            unit_price: Money::parse("1990").unwrap(),
            stock_quantity: stock,
            active,
            image_url: None,
            category: None,
            description: None,
        }
    }

    #[test]
    fn test_snapshot_indexes_active_only() {
        let products = vec![product(1, 5, true), product(2, 3, false), product(3, 0, true)];
        let snapshot = StockSnapshot::from_products(&products);
        assert_eq!(snapshot.available_for(&ProductId::from(1)), Some(5));
        assert_eq!(snapshot.available_for(&ProductId::from(2)), None);
        assert_eq!(snapshot.available_for(&ProductId::from(3)), Some(0));
        assert_eq!(snapshot.available_for(&ProductId::from(9)), None);
    }

    #[test]
    fn test_is_purchasable() {
        assert!(product(1, 5, true).is_purchasable());
        assert!(!product(1, 0, true).is_purchasable());
        assert!(!product(1, 5, false).is_purchasable());
    }

    #[test]
    fn test_to_cart_line_carries_image() {
        let mut p = product(1, 5, true);
        p.image_url = Some("tomate.webp".to_string());
        let line = p.to_cart_line(2);
        assert_eq!(line.quantity, 2);
        assert_eq!(line.image_ref.as_deref(), Some("tomate.webp"));
    }

    #[test]
    fn test_submission_recomputes_total() {
        let lines = vec![
            product(1, 9, true).to_cart_line(3),
            product(2, 9, true).to_cart_line(1),
        ];
        let submission = OrderSubmission::from_lines(
            UserId::new(7),
            ShippingAddress::new("Calle 1", "Ñuñoa", "Metropolitana"),
            &lines,
        );
        assert_eq!(submission.total, Money::parse("7960").unwrap());
        assert_eq!(submission.lines.len(), 2);
        assert_eq!(submission.lines[0].quantity, 3);
    }

    #[test]
    fn test_submission_serializes_camel_case() {
        let lines = vec![product(5, 9, true).to_cart_line(2)];
        let submission = OrderSubmission::from_lines(
            UserId::new(3),
            ShippingAddress::new("Av. Matta 456", "Santiago", "Metropolitana"),
            &lines,
        );
        let json = serde_json::to_value(&submission).unwrap();
        assert_eq!(json["userId"], 3);
        assert_eq!(json["total"], "3980");
        assert_eq!(json["shippingAddress"]["comuna"], "Santiago");
        assert_eq!(json["lines"][0]["productId"], "5");
        assert_eq!(json["lines"][0]["unitPrice"], "1990");
    }
}
