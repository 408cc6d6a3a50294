//! Cart line and cart collection types.
//!
//! A [`Cart`] maintains two structural invariants: at most one line per
//! product id, and every stored line has `quantity >= 1`. Mutations that
//! would leave a zero-quantity line remove the line instead. Totals and
//! item counts are derived on demand and never stored.

use serde::{Deserialize, Serialize};

use super::id::ProductId;
use super::money::Money;

// ===== CartLine =====

/// One product entry in the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    /// Stable product identifier.
    pub product_id: ProductId,
    /// Product name captured when the line was added.
    pub name: String,
    /// Unit price captured when the line was added.
    pub unit_price: Money,
    /// Requested quantity, at least 1 once stored in a [`Cart`].
    pub quantity: u32,
    /// Optional product image reference for display.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_ref: Option<String>,
}

impl CartLine {
    /// Create a new cart line.
    #[must_use]
    pub fn new(
        product_id: ProductId,
        name: impl Into<String>,
        unit_price: Money,
        quantity: u32,
    ) -> Self {
        Self {
            product_id,
            name: name.into(),
            unit_price,
            quantity,
            image_ref: None,
        }
    }

    /// Attach an image reference.
    #[must_use]
    pub fn with_image_ref(mut self, image_ref: impl Into<String>) -> Self {
        self.image_ref = Some(image_ref.into());
        self
    }

    /// `unit_price * quantity`.
    #[must_use]
    pub fn line_total(&self) -> Money {
        self.unit_price.times(self.quantity)
    }
}

// ===== Cart =====

/// Ordered collection of cart lines.
///
/// Lines keep insertion order. Replacing an existing line keeps its
/// position so the rendered cart does not reshuffle on quantity edits.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    /// An empty cart.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a cart from previously persisted lines.
    ///
    /// Normalizes untrusted input: zero-quantity lines are dropped and only
    /// the first line per product id is kept.
    #[must_use]
    pub fn from_lines(lines: Vec<CartLine>) -> Self {
        let mut cart = Self::new();
        for line in lines {
            if line.quantity == 0 || cart.line(&line.product_id).is_some() {
                continue;
            }
            cart.lines.push(line);
        }
        cart
    }

    /// All lines in insertion order.
    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    /// The line for `product_id`, if present.
    #[must_use]
    pub fn line(&self, product_id: &ProductId) -> Option<&CartLine> {
        self.lines.iter().find(|l| l.product_id == *product_id)
    }

    /// Current quantity for `product_id`, 0 if absent.
    #[must_use]
    pub fn quantity_of(&self, product_id: &ProductId) -> u32 {
        self.line(product_id).map_or(0, |l| l.quantity)
    }

    /// Insert a line, or replace the existing line for the same product id
    /// in place. A zero-quantity line removes the entry instead.
    pub fn push_or_replace(&mut self, line: CartLine) {
        if line.quantity == 0 {
            self.remove(&line.product_id);
            return;
        }
        match self.line_mut(&line.product_id) {
            Some(existing) => *existing = line,
            None => self.lines.push(line),
        }
    }

    /// Set the quantity for an existing line. `quantity == 0` removes the
    /// line. Returns `false` when no line for `product_id` exists.
    pub fn set_quantity(&mut self, product_id: &ProductId, quantity: u32) -> bool {
        if quantity == 0 {
            return self.remove(product_id).is_some();
        }
        match self.line_mut(product_id) {
            Some(line) => {
                line.quantity = quantity;
                true
            }
            None => false,
        }
    }

    /// Remove the line for `product_id`, returning it if it was present.
    pub fn remove(&mut self, product_id: &ProductId) -> Option<CartLine> {
        let idx = self.position(product_id)?;
        Some(self.lines.remove(idx))
    }

    /// Remove every line.
    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Number of distinct lines.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Sum of all line totals.
    #[must_use]
    pub fn total(&self) -> Money {
        self.lines.iter().map(CartLine::line_total).sum()
    }

    /// Sum of all line quantities.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.lines.iter().map(|l| l.quantity).sum()
    }

    fn position(&self, product_id: &ProductId) -> Option<usize> {
        self.lines.iter().position(|l| l.product_id == *product_id)
    }

    fn line_mut(&mut self, product_id: &ProductId) -> Option<&mut CartLine> {
        self.lines.iter_mut().find(|l| l.product_id == *product_id)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn line(id: i64, price: &str, quantity: u32) -> CartLine {
        CartLine::new(
            ProductId::from(id),
            format!("Product {id}"),
            Money::parse(price).unwrap(),
            quantity,
        )
    }

    #[test]
    fn test_push_appends_new_line() {
        let mut cart = Cart::new();
        cart.push_or_replace(line(1, "1990", 2));
        cart.push_or_replace(line(2, "500", 1));
        assert_eq!(cart.len(), 2);
        assert_eq!(cart.lines()[0].product_id, ProductId::from(1));
        assert_eq!(cart.lines()[1].product_id, ProductId::from(2));
    }

    #[test]
    fn test_replace_keeps_position() {
        let mut cart = Cart::new();
        cart.push_or_replace(line(1, "1990", 2));
        cart.push_or_replace(line(2, "500", 1));
        cart.push_or_replace(line(1, "1990", 5));
        assert_eq!(cart.len(), 2);
        assert_eq!(cart.lines()[0].product_id, ProductId::from(1));
        assert_eq!(cart.lines()[0].quantity, 5);
    }

    #[test]
    fn test_zero_quantity_push_removes() {
        let mut cart = Cart::new();
        cart.push_or_replace(line(1, "1990", 2));
        cart.push_or_replace(line(1, "1990", 0));
        assert!(cart.is_empty());
    }

    #[test]
    fn test_set_quantity() {
        let mut cart = Cart::new();
        cart.push_or_replace(line(1, "1990", 2));
        assert!(cart.set_quantity(&ProductId::from(1), 7));
        assert_eq!(cart.quantity_of(&ProductId::from(1)), 7);
        assert!(!cart.set_quantity(&ProductId::from(9), 3));
    }

    #[test]
    fn test_set_quantity_zero_removes() {
        let mut cart = Cart::new();
        cart.push_or_replace(line(1, "1990", 2));
        assert!(cart.set_quantity(&ProductId::from(1), 0));
        assert!(cart.line(&ProductId::from(1)).is_none());
    }

    #[test]
    fn test_remove_is_idempotent() {
        let mut cart = Cart::new();
        cart.push_or_replace(line(1, "1990", 2));
        let removed = cart.remove(&ProductId::from(1));
        assert_eq!(removed.map(|l| l.quantity), Some(2));
        assert!(cart.remove(&ProductId::from(1)).is_none());
    }

    #[test]
    fn test_derived_totals() {
        let mut cart = Cart::new();
        cart.push_or_replace(line(1, "1990", 3));
        cart.push_or_replace(line(2, "500", 2));
        assert_eq!(cart.total(), Money::parse("6970").unwrap());
        assert_eq!(cart.item_count(), 5);
    }

    #[test]
    fn test_empty_cart_totals_are_zero() {
        let cart = Cart::new();
        assert!(cart.total().is_zero());
        assert_eq!(cart.item_count(), 0);
    }

    #[test]
    fn test_from_lines_normalizes() {
        let cart = Cart::from_lines(vec![
            line(1, "1990", 2),
            line(2, "500", 0),
            line(1, "1990", 9),
            line(3, "750", 1),
        ]);
        assert_eq!(cart.len(), 2);
        assert_eq!(cart.quantity_of(&ProductId::from(1)), 2);
        assert_eq!(cart.quantity_of(&ProductId::from(3)), 1);
    }

    #[test]
    fn test_line_total() {
        let l = line(1, "1990", 3);
        assert_eq!(l.line_total(), Money::parse("5970").unwrap());
    }

    #[test]
    fn test_line_serde_camel_case() {
        let l = line(5, "1990", 2).with_image_ref("tomate.webp");
        let json = serde_json::to_value(&l).unwrap();
        assert_eq!(json["productId"], "5");
        assert_eq!(json["unitPrice"], "1990");
        assert_eq!(json["imageRef"], "tomate.webp");
        let back: CartLine = serde_json::from_value(json).unwrap();
        assert_eq!(back, l);
    }
}
