//! Cart-against-snapshot stock reconciliation.
//!
//! [`reconcile`] is a pure comparison: it never mutates the cart and never
//! talks to the network, so the orchestrator can run it as often as it
//! likes. Applying the resulting [`ReconcileReport`] is a separate step
//! that goes through the cart store, gated on user consent via a
//! [`RemediationPrompt`].

use std::future::Future;

use huerta_core::{CartLine, ProductId};
use tracing::debug;

use crate::cart::CartStore;
use crate::models::StockSnapshot;

// ===== Report =====

/// How a cart line disagrees with the latest stock snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscrepancyKind {
    /// The product vanished from the catalog.
    Absent,
    /// The product is listed with zero stock.
    OutOfStock,
    /// Some stock remains, but less than the cart wants.
    Insufficient,
}

impl DiscrepancyKind {
    /// Whether the only remedy is dropping the line.
    #[must_use]
    pub const fn must_remove(self) -> bool {
        matches!(self, Self::Absent | Self::OutOfStock)
    }
}

/// One cart line the snapshot can no longer honor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockDiscrepancy {
    /// Product the line refers to.
    pub product_id: ProductId,
    /// Display name captured when the line was added.
    pub name: String,
    /// The nature of the disagreement.
    pub kind: DiscrepancyKind,
    /// Units the snapshot still offers. Zero for absent and out-of-stock
    /// lines.
    pub available: u32,
    /// Units the cart asked for.
    pub requested: u32,
}

/// Outcome of checking a cart against a stock snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    discrepancies: Vec<StockDiscrepancy>,
}

impl ReconcileReport {
    /// Whether every line can be honored as-is.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.discrepancies.is_empty()
    }

    /// All discrepancies, in cart order.
    pub fn discrepancies(&self) -> impl Iterator<Item = &StockDiscrepancy> {
        self.discrepancies.iter()
    }

    /// Lines whose only remedy is removal.
    pub fn must_remove(&self) -> impl Iterator<Item = &StockDiscrepancy> {
        self.discrepancies.iter().filter(|d| d.kind.must_remove())
    }

    /// Lines that survive at a reduced quantity.
    pub fn insufficient(&self) -> impl Iterator<Item = &StockDiscrepancy> {
        self.discrepancies
            .iter()
            .filter(|d| d.kind == DiscrepancyKind::Insufficient)
    }
}

/// Compare each cart line against `snapshot`.
///
/// Lines the snapshot fully covers produce no entry; a line asking for
/// exactly the available stock is clean.
#[must_use]
pub fn reconcile(lines: &[CartLine], snapshot: &StockSnapshot) -> ReconcileReport {
    let mut discrepancies = Vec::new();
    for line in lines {
        let available = snapshot.available_for(&line.product_id);
        let kind = match available {
            None => DiscrepancyKind::Absent,
            Some(0) => DiscrepancyKind::OutOfStock,
            Some(stock) if stock < line.quantity => DiscrepancyKind::Insufficient,
            Some(_) => continue,
        };
        discrepancies.push(StockDiscrepancy {
            product_id: line.product_id.clone(),
            name: line.name.clone(),
            kind,
            available: available.unwrap_or(0),
            requested: line.quantity,
        });
    }
    ReconcileReport { discrepancies }
}

// ===== Remediation =====

/// The user's answer to a remediation prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemediationChoice {
    /// Adjust the cart to match the snapshot and keep going.
    ApplyFix,
    /// Leave the cart alone and stop this checkout.
    Defer,
}

/// Presents stock discrepancies to the user and collects a decision.
///
/// The CLI implements this over stdin; tests script it.
pub trait RemediationPrompt {
    /// Show `report` and ask whether to fix the cart or stop.
    fn resolve(&self, report: &ReconcileReport) -> impl Future<Output = RemediationChoice> + Send;
}

/// Run one remediation round: prompt, then apply fixes on consent.
///
/// A clean report passes without consulting the prompt. Returns `false`
/// when the user defers, in which case the cart is left untouched.
pub async fn resolve_report<P: RemediationPrompt>(
    cart: &mut CartStore,
    report: &ReconcileReport,
    prompt: &P,
) -> bool {
    if report.is_clean() {
        return true;
    }
    match prompt.resolve(report).await {
        RemediationChoice::ApplyFix => {
            let changed = cart.apply_remediation(report);
            debug!(changed, "applied stock remediation to cart");
            true
        }
        RemediationChoice::Defer => false,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use huerta_core::Money;

    use crate::models::Product;
    use crate::storage::LocalStore;

    fn product(id: i64, stock: u32) -> Product {
        Product {
            id: ProductId::from(id),
            name: format!("Product {id}"),
            unit_price: Money::parse("1990").unwrap(),
            stock_quantity: stock,
            active: true,
            image_url: None,
            category: None,
            description: None,
        }
    }

    fn line(id: i64, quantity: u32) -> CartLine {
        CartLine::new(
            ProductId::from(id),
            format!("Product {id}"),
            Money::parse("1990").unwrap(),
            quantity,
        )
    }

    struct Scripted(RemediationChoice);

    impl RemediationPrompt for Scripted {
        async fn resolve(&self, _report: &ReconcileReport) -> RemediationChoice {
            self.0
        }
    }

    struct NeverAsked;

    impl RemediationPrompt for NeverAsked {
        async fn resolve(&self, _report: &ReconcileReport) -> RemediationChoice {
            panic!("prompt consulted for a clean report")
        }
    }

    #[test]
    fn test_clean_when_stock_covers_requests() {
        let snapshot = StockSnapshot::from_products(&[product(1, 5), product(2, 2)]);
        // Asking for exactly the available stock is still clean
        let report = reconcile(&[line(1, 3), line(2, 2)], &snapshot);
        assert!(report.is_clean());
    }

    #[test]
    fn test_insufficient_reports_available_units() {
        let snapshot = StockSnapshot::from_products(&[product(1, 2)]);
        let report = reconcile(&[line(1, 3)], &snapshot);

        let found: Vec<_> = report.discrepancies().collect();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].kind, DiscrepancyKind::Insufficient);
        assert_eq!(found[0].available, 2);
        assert_eq!(found[0].requested, 3);
        assert!(!found[0].kind.must_remove());
    }

    #[test]
    fn test_absent_and_out_of_stock_are_distinct() {
        let snapshot = StockSnapshot::from_products(&[product(2, 0)]);
        let report = reconcile(&[line(1, 1), line(2, 1)], &snapshot);

        let found: Vec<_> = report.discrepancies().collect();
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].kind, DiscrepancyKind::Absent);
        assert_eq!(found[1].kind, DiscrepancyKind::OutOfStock);
        assert!(found.iter().all(|d| d.kind.must_remove()));
        assert!(found.iter().all(|d| d.available == 0));
    }

    #[test]
    fn test_report_follows_cart_order() {
        let snapshot = StockSnapshot::from_products(&[product(2, 1)]);
        let report = reconcile(&[line(3, 1), line(2, 4), line(1, 1)], &snapshot);

        let ids: Vec<_> = report
            .discrepancies()
            .map(|d| d.product_id.as_str().to_string())
            .collect();
        assert_eq!(ids, vec!["3", "2", "1"]);
    }

    #[test]
    fn test_iterators_partition_by_remedy() {
        let snapshot = StockSnapshot::from_products(&[product(1, 2), product(2, 0)]);
        let report = reconcile(&[line(1, 5), line(2, 1), line(3, 1)], &snapshot);

        assert_eq!(report.insufficient().count(), 1);
        assert_eq!(report.must_remove().count(), 2);
    }

    #[tokio::test]
    async fn test_resolve_applies_fix_on_consent() {
        let dir = tempfile::tempdir().unwrap();
        let local = LocalStore::open(dir.path()).unwrap();
        let mut cart = CartStore::restore(local, "default").unwrap();
        cart.add_or_increment(&product(1, 9));
        cart.set_quantity(&ProductId::from(1), 5);

        let snapshot = StockSnapshot::from_products(&[product(1, 2)]);
        let report = reconcile(cart.lines(), &snapshot);
        assert!(resolve_report(&mut cart, &report, &Scripted(RemediationChoice::ApplyFix)).await);
        assert_eq!(cart.lines()[0].quantity, 2);
    }

    #[tokio::test]
    async fn test_resolve_defer_leaves_cart_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let local = LocalStore::open(dir.path()).unwrap();
        let mut cart = CartStore::restore(local, "default").unwrap();
        cart.add_or_increment(&product(1, 9));
        cart.set_quantity(&ProductId::from(1), 5);

        let snapshot = StockSnapshot::from_products(&[product(1, 2)]);
        let report = reconcile(cart.lines(), &snapshot);
        assert!(!resolve_report(&mut cart, &report, &Scripted(RemediationChoice::Defer)).await);
        assert_eq!(cart.lines()[0].quantity, 5);
    }

    #[tokio::test]
    async fn test_resolve_skips_prompt_when_clean() {
        let dir = tempfile::tempdir().unwrap();
        let local = LocalStore::open(dir.path()).unwrap();
        let mut cart = CartStore::restore(local, "default").unwrap();
        cart.add_or_increment(&product(1, 9));

        let snapshot = StockSnapshot::from_products(&[product(1, 9)]);
        let report = reconcile(cart.lines(), &snapshot);
        assert!(resolve_report(&mut cart, &report, &NeverAsked).await);
    }
}
