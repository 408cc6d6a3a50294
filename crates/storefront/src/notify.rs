//! User-facing notifications.
//!
//! The store and orchestrator emit [`Notification`] values through a
//! [`Notifier`]; how they are rendered (terminal line, toast, dialog) is
//! the frontend's business. [`NotificationGate`] implements the
//! per-kind cooldown the UI applies to repetitive notifications. The gate
//! only ever suppresses presentation: the mutation or event that produced
//! the notification has already happened.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

use huerta_core::OrderId;

/// Default per-kind cooldown applied by the UI layer.
pub const DEFAULT_COOLDOWN: Duration = Duration::from_secs(5);

/// Something the user should be told about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    /// A product was added to the cart.
    AddedToCart {
        /// Product name.
        name: String,
    },
    /// A quantity request exceeded available stock.
    StockInsufficient {
        /// Product name.
        name: String,
        /// Units actually available.
        available: u32,
    },
    /// A product is no longer sellable at all.
    StockAbsent {
        /// Product name.
        name: String,
    },
    /// Checkout needs a signed-in user.
    CheckoutBlockedAuth,
    /// Checkout needs a complete shipping address.
    CheckoutBlockedAddress,
    /// Stock changed under an in-progress checkout.
    StockConflict,
    /// The order was accepted.
    CheckoutSuccess {
        /// Backend-assigned order id.
        order_id: OrderId,
    },
    /// The order was declined for a non-stock reason.
    CheckoutFailed {
        /// Backend-provided reason.
        message: String,
    },
}

impl Notification {
    /// The kind, used for cooldown bucketing.
    #[must_use]
    pub const fn kind(&self) -> NotificationKind {
        match self {
            Self::AddedToCart { .. } => NotificationKind::AddedToCart,
            Self::StockInsufficient { .. } => NotificationKind::StockInsufficient,
            Self::StockAbsent { .. } => NotificationKind::StockAbsent,
            Self::CheckoutBlockedAuth => NotificationKind::CheckoutBlockedAuth,
            Self::CheckoutBlockedAddress => NotificationKind::CheckoutBlockedAddress,
            Self::StockConflict => NotificationKind::StockConflict,
            Self::CheckoutSuccess { .. } => NotificationKind::CheckoutSuccess,
            Self::CheckoutFailed { .. } => NotificationKind::CheckoutFailed,
        }
    }

    /// User-facing message text.
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::AddedToCart { name } => format!("{name} agregado al carrito"),
            Self::StockInsufficient { name, available } => {
                format!("Stock insuficiente para {name}: quedan {available}")
            }
            Self::StockAbsent { name } => format!("{name} ya no está disponible"),
            Self::CheckoutBlockedAuth => "Inicia sesión para finalizar tu compra".to_string(),
            Self::CheckoutBlockedAddress => {
                "Completa tu dirección de envío para continuar".to_string()
            }
            Self::StockConflict => {
                "El stock cambió mientras comprabas; revisa tu carrito".to_string()
            }
            Self::CheckoutSuccess { order_id } => format!("¡Pedido #{order_id} confirmado!"),
            Self::CheckoutFailed { message } => {
                format!("No pudimos procesar tu pedido: {message}")
            }
        }
    }
}

/// Discriminant of [`Notification`], used as the cooldown key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NotificationKind {
    AddedToCart,
    StockInsufficient,
    StockAbsent,
    CheckoutBlockedAuth,
    CheckoutBlockedAddress,
    StockConflict,
    CheckoutSuccess,
    CheckoutFailed,
}

/// Sink for user-facing notifications.
///
/// The CLI renders them to the terminal; tests record them for assertions.
pub trait Notifier {
    /// Deliver one notification.
    fn notify(&self, notification: Notification);
}

/// Per-kind cooldown for repetitive notifications.
///
/// Repeatedly adding the same product should not stack identical toasts;
/// one per kind per cooldown window is enough. Presentation-only: callers
/// consult the gate before rendering, never before mutating.
#[derive(Debug)]
pub struct NotificationGate {
    cooldown: Duration,
    last_shown: Mutex<HashMap<NotificationKind, Instant>>,
}

impl NotificationGate {
    /// Create a gate with the given cooldown.
    #[must_use]
    pub fn new(cooldown: Duration) -> Self {
        Self {
            cooldown,
            last_shown: Mutex::new(HashMap::new()),
        }
    }

    /// Whether a notification of `kind` may be shown now.
    ///
    /// Records the presentation when it answers yes.
    pub fn allow(&self, kind: NotificationKind) -> bool {
        self.allow_at(kind, Instant::now())
    }

    /// Clock-injectable form of [`allow`](Self::allow).
    pub fn allow_at(&self, kind: NotificationKind, now: Instant) -> bool {
        let mut last_shown = self
            .last_shown
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        match last_shown.get(&kind) {
            Some(prev) if now.duration_since(*prev) < self.cooldown => false,
            _ => {
                last_shown.insert(kind, now);
                true
            }
        }
    }
}

impl Default for NotificationGate {
    fn default() -> Self {
        Self::new(DEFAULT_COOLDOWN)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_gate_suppresses_within_cooldown() {
        let gate = NotificationGate::new(Duration::from_secs(5));
        let t0 = Instant::now();
        assert!(gate.allow_at(NotificationKind::AddedToCart, t0));
        assert!(!gate.allow_at(NotificationKind::AddedToCart, t0 + Duration::from_secs(2)));
        assert!(gate.allow_at(NotificationKind::AddedToCart, t0 + Duration::from_secs(5)));
    }

    #[test]
    fn test_gate_kinds_are_independent() {
        let gate = NotificationGate::new(Duration::from_secs(5));
        let t0 = Instant::now();
        assert!(gate.allow_at(NotificationKind::AddedToCart, t0));
        assert!(gate.allow_at(NotificationKind::StockInsufficient, t0));
    }

    #[test]
    fn test_cooldown_runs_from_last_shown() {
        let gate = NotificationGate::new(Duration::from_secs(5));
        let t0 = Instant::now();
        assert!(gate.allow_at(NotificationKind::StockConflict, t0));
        // Suppressed attempts do not extend the window
        assert!(!gate.allow_at(NotificationKind::StockConflict, t0 + Duration::from_secs(4)));
        assert!(gate.allow_at(NotificationKind::StockConflict, t0 + Duration::from_secs(6)));
    }

    #[test]
    fn test_messages_name_the_product() {
        let n = Notification::StockInsufficient {
            name: "Tomate orgánico".to_string(),
            available: 2,
        };
        assert_eq!(n.kind(), NotificationKind::StockInsufficient);
        assert!(n.message().contains("Tomate orgánico"));
        assert!(n.message().contains('2'));
    }

    #[test]
    fn test_success_message_references_order() {
        let n = Notification::CheckoutSuccess {
            order_id: OrderId::new(42),
        };
        assert!(n.message().contains("42"));
    }
}
