//! The checkout command.
//!
//! Drives the orchestrator with a terminal notifier and a stdin
//! remediation prompt. Every halt state prints an actionable next step;
//! the exit code still reflects that no order was placed.

#![allow(clippy::print_stdout)]

use std::io::Write;

use huerta_storefront::api::BackendClient;
use huerta_storefront::checkout::reconcile::{
    ReconcileReport, RemediationChoice, RemediationPrompt,
};
use huerta_storefront::checkout::{CheckoutError, CheckoutOrchestrator};
use huerta_storefront::config::StorefrontConfig;
use huerta_storefront::session::Session;
use tokio::io::{AsyncBufReadExt, BufReader};

use super::{CliError, TerminalNotifier};

/// Reconcile stock and submit the cart as an order.
pub async fn run() -> Result<(), CliError> {
    let config = StorefrontConfig::from_env()?;
    let mut session = Session::open(&config)?;
    let backend = BackendClient::new(&config)?;

    let orchestrator = CheckoutOrchestrator::new();
    let notifier = TerminalNotifier::new();
    let prompt = StdinPrompt;

    match orchestrator
        .run(&mut session, &backend, &prompt, &notifier)
        .await
    {
        Ok(receipt) => {
            println!("Order #{} confirmed", receipt.order_id);
            println!("  {} lines, total {}", receipt.line_count, receipt.total);
            Ok(())
        }
        Err(e) => {
            println!("{}", guidance(&e));
            Err(e.into())
        }
    }
}

/// Actionable next step for each halt state.
const fn guidance(error: &CheckoutError) -> &'static str {
    match error {
        CheckoutError::AlreadyInFlight => "A checkout is already running; wait for it to finish.",
        CheckoutError::AuthRequired => "Sign in first: huerta account login <user-id>",
        CheckoutError::EmptyCart => "The cart is empty: huerta cart add <product-id>",
        CheckoutError::IncompleteAddress { .. } => {
            "Complete your shipping address in your profile, then run checkout again."
        }
        CheckoutError::SnapshotFetch { .. } => {
            "Could not reach the backend; check your connection and retry."
        }
        CheckoutError::StockConflict => {
            "Stock changed during checkout; review the cart (huerta cart show) and retry."
        }
        CheckoutError::Submission { .. } => "The order was declined; your cart is unchanged.",
    }
}

/// Asks on stdin whether to apply stock fixes.
struct StdinPrompt;

impl RemediationPrompt for StdinPrompt {
    async fn resolve(&self, report: &ReconcileReport) -> RemediationChoice {
        println!("El stock cambió para productos de tu carrito:");
        for d in report.must_remove() {
            println!("  - {}: ya no está disponible, se quitará", d.name);
        }
        for d in report.insufficient() {
            println!(
                "  - {}: quedan {} (pedías {}), se ajustará",
                d.name, d.available, d.requested
            );
        }
        print!("¿Aplicar los cambios y continuar? [S/n] ");
        let _ = std::io::stdout().flush();

        let mut answer = String::new();
        let mut reader = BufReader::new(tokio::io::stdin());
        if reader.read_line(&mut answer).await.is_err() {
            return RemediationChoice::Defer;
        }
        match answer.trim().to_lowercase().as_str() {
            "" | "s" | "si" | "sí" | "y" | "yes" => RemediationChoice::ApplyFix,
            _ => RemediationChoice::Defer,
        }
    }
}
