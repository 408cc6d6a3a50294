//! Checkout orchestration.
//!
//! A checkout attempt walks a fixed sequence of phases: identity, shipping
//! address, stock reconciliation against a fresh snapshot, a pre-submit
//! revalidation against a second snapshot, then submission. Stock
//! conflicts loop back through reconciliation at most once per attempt;
//! everything else halts with a [`CheckoutError`] naming the phase that
//! stopped it. The orchestrator never auto-resumes: after any halt the
//! user re-triggers checkout explicitly.

pub mod reconcile;

mod orchestrator;

pub use orchestrator::CheckoutOrchestrator;

use huerta_core::{Money, OrderId};
use thiserror::Error;

use crate::api::ApiError;

/// Where a checkout attempt currently is, or where it stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckoutPhase {
    /// No attempt in progress.
    Idle,
    /// Verifying a signed-in user exists and the cart is non-empty.
    IdentityCheck,
    /// Verifying the shipping address is complete.
    AddressCheck,
    /// Reconciling the cart against a fresh stock snapshot.
    PreReconcile,
    /// Order submission in flight.
    Submitting,
    /// The order was accepted.
    Success,
    /// Stock changed and the attempt needs a user re-trigger.
    StockConflict,
    /// The order was declined for a non-stock reason.
    Failed,
}

/// Why a checkout attempt stopped short of an accepted order.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// Another attempt on this orchestrator has not finished yet.
    #[error("a checkout is already in progress")]
    AlreadyInFlight,

    /// No signed-in user.
    #[error("sign in to check out")]
    AuthRequired,

    /// Nothing to submit.
    #[error("the cart is empty")]
    EmptyCart,

    /// The shipping address is missing required fields.
    #[error("shipping address is incomplete: missing {}", .missing.join(", "))]
    IncompleteAddress {
        /// Names of the blank fields.
        missing: Vec<&'static str>,
    },

    /// A stock snapshot could not be fetched.
    #[error("failed to fetch stock snapshot")]
    SnapshotFetch {
        /// Underlying backend error.
        #[source]
        source: ApiError,
    },

    /// Stock changed and the attempt halted pending a user re-trigger,
    /// either because remediation was deferred or because the conflict
    /// retry budget ran out.
    #[error("stock changed during checkout")]
    StockConflict,

    /// The backend declined the order for a non-stock reason.
    #[error("order submission failed: {message}")]
    Submission {
        /// Backend-provided reason.
        message: String,
    },
}

impl CheckoutError {
    /// The phase the attempt stopped in.
    #[must_use]
    pub const fn phase(&self) -> CheckoutPhase {
        match self {
            Self::AlreadyInFlight => CheckoutPhase::Idle,
            Self::AuthRequired | Self::EmptyCart => CheckoutPhase::IdentityCheck,
            Self::IncompleteAddress { .. } => CheckoutPhase::AddressCheck,
            Self::SnapshotFetch { .. } => CheckoutPhase::PreReconcile,
            Self::StockConflict => CheckoutPhase::StockConflict,
            Self::Submission { .. } => CheckoutPhase::Failed,
        }
    }
}

/// Proof of an accepted order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutReceipt {
    /// Backend-assigned order id.
    pub order_id: OrderId,
    /// Total charged, recomputed from the submitted lines.
    pub total: Money,
    /// Number of distinct lines submitted.
    pub line_count: usize,
}
