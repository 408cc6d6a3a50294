//! The checkout state machine driver.

use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::api::{ApiError, StoreBackend};
use crate::checkout::reconcile::{RemediationPrompt, reconcile, resolve_report};
use crate::checkout::{CheckoutError, CheckoutPhase, CheckoutReceipt};
use crate::models::OrderSubmission;
use crate::notify::{Notification, Notifier};
use crate::session::Session;

/// Substrings that mark an order rejection as stock-caused.
const STOCK_CAUSE_MARKERS: [&str; 3] = ["stock", "insuficiente", "disponible"];

/// Coordinates one checkout attempt at a time.
///
/// Holds no session state of its own; the session, backend, remediation
/// prompt, and notifier all arrive through seams, so tests can script each
/// one independently.
#[derive(Debug)]
pub struct CheckoutOrchestrator {
    in_flight: AtomicBool,
}

impl CheckoutOrchestrator {
    /// Create an idle orchestrator.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            in_flight: AtomicBool::new(false),
        }
    }

    /// Run one checkout attempt end to end.
    ///
    /// On success the cart has been cleared and persisted, a
    /// [`Notification::CheckoutSuccess`] has been emitted, and the receipt
    /// describes the submitted order.
    ///
    /// # Errors
    ///
    /// Returns a [`CheckoutError`] naming the phase that halted the
    /// attempt. [`CheckoutError::AlreadyInFlight`] means another attempt
    /// on this orchestrator has not finished; callers treat it as an
    /// ignored trigger.
    #[instrument(skip_all, fields(attempt = %Uuid::new_v4()))]
    pub async fn run<B, P, N>(
        &self,
        session: &mut Session,
        backend: &B,
        prompt: &P,
        notifier: &N,
    ) -> Result<CheckoutReceipt, CheckoutError>
    where
        B: StoreBackend,
        P: RemediationPrompt,
        N: Notifier,
    {
        let _guard = self.begin()?;
        Self::attempt(session, backend, prompt, notifier).await
    }

    /// Claim the in-flight flag for one attempt.
    fn begin(&self) -> Result<InFlightGuard<'_>, CheckoutError> {
        if self.in_flight.swap(true, Ordering::Acquire) {
            return Err(CheckoutError::AlreadyInFlight);
        }
        Ok(InFlightGuard {
            flag: &self.in_flight,
        })
    }

    async fn attempt<B, P, N>(
        session: &mut Session,
        backend: &B,
        prompt: &P,
        notifier: &N,
    ) -> Result<CheckoutReceipt, CheckoutError>
    where
        B: StoreBackend,
        P: RemediationPrompt,
        N: Notifier,
    {
        let Some(user) = session.current_user() else {
            notifier.notify(Notification::CheckoutBlockedAuth);
            return Err(CheckoutError::AuthRequired);
        };
        let user_id = user.id;
        let address = user.address.clone();

        if session.cart().is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        let missing = address.missing_fields();
        if !missing.is_empty() {
            notifier.notify(Notification::CheckoutBlockedAddress);
            return Err(CheckoutError::IncompleteAddress { missing });
        }

        // One automatic retry, shared between a pre-submit conflict and a
        // server-side stock rejection.
        let mut conflict_retries_left = 1u8;

        loop {
            debug!(phase = ?CheckoutPhase::PreReconcile, "fetching stock snapshot");
            let snapshot = backend
                .fetch_stock_snapshot()
                .await
                .map_err(|source| CheckoutError::SnapshotFetch { source })?;
            session.cart_mut().record_stock_hints(&snapshot);
            let report = reconcile(session.cart().lines(), &snapshot);
            if !resolve_report(session.cart_mut(), &report, prompt).await {
                return Err(CheckoutError::StockConflict);
            }
            // Remediation can strip every line
            if session.cart().is_empty() {
                return Err(CheckoutError::EmptyCart);
            }

            // Second fresh snapshot immediately before submission narrows
            // the race window between reconciliation and the order call.
            let recheck = backend
                .fetch_stock_snapshot()
                .await
                .map_err(|source| CheckoutError::SnapshotFetch { source })?;
            session.cart_mut().record_stock_hints(&recheck);
            let report = reconcile(session.cart().lines(), &recheck);
            if !report.is_clean() {
                warn!(
                    discrepancies = report.discrepancies().count(),
                    "stock changed between reconciliation and submission"
                );
                notifier.notify(Notification::StockConflict);
                if !resolve_report(session.cart_mut(), &report, prompt).await {
                    return Err(CheckoutError::StockConflict);
                }
                if conflict_retries_left == 0 {
                    return Err(CheckoutError::StockConflict);
                }
                conflict_retries_left -= 1;
                continue;
            }

            // The frozen copy is what goes out; cart edits landing while
            // the call is in flight cannot leak into the order.
            let frozen = session.cart().freeze();
            let submission = OrderSubmission::from_lines(user_id, address.clone(), &frozen);
            let total = submission.total;
            debug!(
                phase = ?CheckoutPhase::Submitting,
                lines = frozen.len(),
                %total,
                "submitting order"
            );
            match backend.submit_order(&submission).await {
                Ok(receipt) => {
                    let order_id = receipt.order_id;
                    session.cart_mut().clear();
                    notifier.notify(Notification::CheckoutSuccess { order_id });
                    info!(phase = ?CheckoutPhase::Success, %order_id, "order accepted");
                    return Ok(CheckoutReceipt {
                        order_id,
                        total,
                        line_count: frozen.len(),
                    });
                }
                Err(ApiError::OrderRejected { message }) if is_stock_cause(&message) => {
                    // A late conflict the pre-submit check missed; loop
                    // back through reconciliation with fresh data.
                    warn!(rejection = %message, "order rejected for stock");
                    notifier.notify(Notification::StockConflict);
                    if conflict_retries_left == 0 {
                        return Err(CheckoutError::StockConflict);
                    }
                    conflict_retries_left -= 1;
                }
                Err(e) => {
                    let message = match e {
                        ApiError::OrderRejected { message } => message,
                        other => other.to_string(),
                    };
                    notifier.notify(Notification::CheckoutFailed {
                        message: message.clone(),
                    });
                    return Err(CheckoutError::Submission { message });
                }
            }
        }
    }
}

impl Default for CheckoutOrchestrator {
    fn default() -> Self {
        Self::new()
    }
}

/// Clears the in-flight flag when an attempt ends, however it ends.
struct InFlightGuard<'a> {
    flag: &'a AtomicBool,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// Whether a rejection message cites stock as the cause.
fn is_stock_cause(message: &str) -> bool {
    let lowered = message.to_lowercase();
    STOCK_CAUSE_MARKERS
        .iter()
        .any(|marker| lowered.contains(marker))
}
