//! Persistent cart store with stock-aware mutations.
//!
//! # Architecture
//!
//! - The store owns the session's [`Cart`] and persists it after every
//!   mutation; nothing else writes the cart file.
//! - Stock bounds are best-effort hints recorded from the latest product
//!   data seen; the authoritative check happens at checkout against a
//!   fresh snapshot.
//! - Bound violations are outcomes, not errors: the operation simply does
//!   not apply and the caller decides how to present that.

use std::collections::HashMap;

use tracing::warn;

use huerta_core::{Cart, CartLine, Money, ProductId};

use crate::checkout::reconcile::{DiscrepancyKind, ReconcileReport};
use crate::models::{Product, StockSnapshot};
use crate::storage::{LocalStore, StorageError};

// ===== Outcomes =====

/// Result of [`CartStore::add_or_increment`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    /// New line created with quantity 1.
    Added,
    /// Existing line incremented; carries the new quantity.
    Incremented(u32),
    /// The product has no stock at all; cart unchanged.
    OutOfStock,
    /// The cart already holds every available unit; cart unchanged.
    LimitReached {
        /// Units the backend reports as available.
        available: u32,
    },
}

/// Result of [`CartStore::increment`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IncrementOutcome {
    /// Quantity raised; carries the new quantity.
    Incremented(u32),
    /// The known stock hint is already exhausted; cart unchanged.
    LimitReached {
        /// Units the last hint reported as available.
        available: u32,
    },
    /// No line for that product exists.
    Absent,
}

/// Result of [`CartStore::decrement`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecrementOutcome {
    /// Quantity lowered; carries the new quantity.
    Decremented(u32),
    /// Quantity was 1, so the line was removed.
    Removed,
    /// No line for that product exists.
    Absent,
}

/// Result of [`CartStore::set_quantity`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetOutcome {
    /// Requested quantity stored verbatim.
    Set,
    /// Requested quantity exceeded the stock hint and was clamped.
    Clamped {
        /// The quantity actually stored (0 removes the line).
        available: u32,
    },
    /// Quantity 0 requested, line removed.
    Removed,
    /// No line for that product exists.
    Absent,
}

// ===== CartStore =====

/// The session's cart plus persistence and stock hints.
#[derive(Debug)]
pub struct CartStore {
    cart: Cart,
    hints: HashMap<ProductId, u32>,
    store: LocalStore,
    session: String,
}

impl CartStore {
    /// Restore the cart for `session` from local storage.
    ///
    /// A missing cart file yields an empty cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart file exists but cannot be read or
    /// parsed.
    pub fn restore(store: LocalStore, session: impl Into<String>) -> Result<Self, StorageError> {
        let session = session.into();
        let lines = store
            .load_cart(&session)?
            .map(|persisted| persisted.lines)
            .unwrap_or_default();
        Ok(Self {
            cart: Cart::from_lines(lines),
            hints: HashMap::new(),
            store,
            session,
        })
    }

    /// The current cart contents.
    #[must_use]
    pub const fn cart(&self) -> &Cart {
        &self.cart
    }

    /// Lines in insertion order.
    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        self.cart.lines()
    }

    /// Whether the cart is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cart.is_empty()
    }

    /// Sum of all line totals.
    #[must_use]
    pub fn total(&self) -> Money {
        self.cart.total()
    }

    /// Sum of all line quantities.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.cart.item_count()
    }

    /// Record stock hints from a fresh snapshot.
    ///
    /// Hints bound [`increment`](Self::increment) and
    /// [`set_quantity`](Self::set_quantity) until fresher data arrives.
    pub fn record_stock_hints(&mut self, snapshot: &StockSnapshot) {
        for (product_id, available) in snapshot.entries() {
            self.hints.insert(product_id.clone(), available);
        }
    }

    /// Add one unit of `product`, creating the line if needed.
    ///
    /// The product's own stock count is the bound: a fresh catalog read is
    /// the most recent stock information available at call time.
    pub fn add_or_increment(&mut self, product: &Product) -> AddOutcome {
        self.hints
            .insert(product.id.clone(), product.stock_quantity);

        let current = self.cart.quantity_of(&product.id);
        if current == 0 {
            if product.stock_quantity == 0 {
                return AddOutcome::OutOfStock;
            }
            self.cart.push_or_replace(product.to_cart_line(1));
            self.persist();
            return AddOutcome::Added;
        }

        if current >= product.stock_quantity {
            return AddOutcome::LimitReached {
                available: product.stock_quantity,
            };
        }
        let next = current + 1;
        self.cart.set_quantity(&product.id, next);
        self.persist();
        AddOutcome::Incremented(next)
    }

    /// Raise an existing line's quantity by one, bounded by the stock hint.
    ///
    /// Without a hint for the product the increment proceeds optimistically;
    /// checkout revalidates against fresh data anyway.
    pub fn increment(&mut self, product_id: &ProductId) -> IncrementOutcome {
        let current = self.cart.quantity_of(product_id);
        if current == 0 {
            return IncrementOutcome::Absent;
        }
        if let Some(available) = self.hints.get(product_id).copied()
            && current >= available
        {
            return IncrementOutcome::LimitReached { available };
        }
        let next = current + 1;
        self.cart.set_quantity(product_id, next);
        self.persist();
        IncrementOutcome::Incremented(next)
    }

    /// Lower an existing line's quantity by one; quantity 1 removes the
    /// line.
    pub fn decrement(&mut self, product_id: &ProductId) -> DecrementOutcome {
        match self.cart.quantity_of(product_id) {
            0 => DecrementOutcome::Absent,
            1 => {
                self.cart.remove(product_id);
                self.persist();
                DecrementOutcome::Removed
            }
            quantity => {
                let next = quantity - 1;
                self.cart.set_quantity(product_id, next);
                self.persist();
                DecrementOutcome::Decremented(next)
            }
        }
    }

    /// Set an existing line's quantity. Zero removes the line; values above
    /// the stock hint are clamped to it.
    pub fn set_quantity(&mut self, product_id: &ProductId, quantity: u32) -> SetOutcome {
        if self.cart.line(product_id).is_none() {
            return SetOutcome::Absent;
        }
        if quantity == 0 {
            self.cart.remove(product_id);
            self.persist();
            return SetOutcome::Removed;
        }

        let outcome = match self.hints.get(product_id).copied() {
            Some(available) if quantity > available => {
                // A zero hint clamps the line away entirely
                self.cart.set_quantity(product_id, available);
                SetOutcome::Clamped { available }
            }
            _ => {
                self.cart.set_quantity(product_id, quantity);
                SetOutcome::Set
            }
        };
        self.persist();
        outcome
    }

    /// Remove the line for `product_id`. Idempotent.
    pub fn remove(&mut self, product_id: &ProductId) -> Option<CartLine> {
        let removed = self.cart.remove(product_id);
        if removed.is_some() {
            self.persist();
        }
        removed
    }

    /// Empty the cart unconditionally.
    pub fn clear(&mut self) {
        self.cart.clear();
        self.persist();
    }

    /// Apply a reconciliation report's fixes: remove unsellable lines and
    /// clamp insufficient ones. Returns the number of lines changed.
    pub fn apply_remediation(&mut self, report: &ReconcileReport) -> usize {
        let mut changed = 0;
        for discrepancy in report.discrepancies() {
            let applied = match discrepancy.kind {
                DiscrepancyKind::Absent | DiscrepancyKind::OutOfStock => {
                    self.cart.remove(&discrepancy.product_id).is_some()
                }
                DiscrepancyKind::Insufficient => self
                    .cart
                    .set_quantity(&discrepancy.product_id, discrepancy.available),
            };
            if applied {
                changed += 1;
            }
        }
        if changed > 0 {
            self.persist();
        }
        changed
    }

    /// Clone the current lines for submission.
    ///
    /// The copy is what gets submitted, so cart edits that land while the
    /// order is in flight cannot leak into it.
    #[must_use]
    pub fn freeze(&self) -> Vec<CartLine> {
        self.cart.lines().to_vec()
    }

    /// Write the cart to local storage.
    ///
    /// A failed write never rolls back the in-memory mutation; the next
    /// successful write catches up.
    fn persist(&self) {
        if let Err(e) = self.store.save_cart(&self.session, self.cart.lines()) {
            warn!(error = %e, session = %self.session, "failed to persist cart");
        }
    }
}
