//! CLI command implementations.

#![allow(clippy::print_stdout)]

use huerta_core::ProductId;
use huerta_storefront::api::ApiError;
use huerta_storefront::checkout::CheckoutError;
use huerta_storefront::config::ConfigError;
use huerta_storefront::notify::{Notification, NotificationGate, Notifier};
use huerta_storefront::session::SessionError;
use huerta_storefront::storage::StorageError;
use thiserror::Error;

pub mod account;
pub mod cart;
pub mod checkout;
pub mod products;

/// Errors shared by the CLI commands.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Session state could not be opened or persisted.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// A backend call failed.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// Local persistence failed.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// No published product with the given id.
    #[error("no product with id {0}")]
    ProductNotFound(ProductId),

    /// Checkout halted before an order was accepted.
    #[error(transparent)]
    Checkout(#[from] CheckoutError),
}

/// Prints notifications to the terminal, cooldown-gated per kind.
pub struct TerminalNotifier {
    gate: NotificationGate,
}

impl TerminalNotifier {
    #[must_use]
    pub fn new() -> Self {
        Self {
            gate: NotificationGate::default(),
        }
    }
}

impl Default for TerminalNotifier {
    fn default() -> Self {
        Self::new()
    }
}

impl Notifier for TerminalNotifier {
    fn notify(&self, notification: Notification) {
        if self.gate.allow(notification.kind()) {
            println!("• {}", notification.message());
        }
    }
}
