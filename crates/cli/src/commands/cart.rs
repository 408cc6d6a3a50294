//! Cart commands.
//!
//! Mutations go through the cart store, which persists after every
//! accepted change; rejected changes print why and leave the cart alone.
//! `add` needs the backend for a current product read; everything else
//! works offline against the persisted cart and the last seen stock.

#![allow(clippy::print_stdout)]

use huerta_core::ProductId;
use huerta_storefront::api::{BackendClient, StoreBackend};
use huerta_storefront::cart::{AddOutcome, CartStore, DecrementOutcome, IncrementOutcome, SetOutcome};
use huerta_storefront::config::StorefrontConfig;
use huerta_storefront::notify::{Notification, Notifier};
use huerta_storefront::session::Session;

use super::{CliError, TerminalNotifier};

fn open_session() -> Result<(StorefrontConfig, Session), CliError> {
    let config = StorefrontConfig::from_env()?;
    let session = Session::open(&config)?;
    Ok((config, session))
}

fn print_summary(cart: &CartStore) {
    println!("Cart: {} items, total {}", cart.item_count(), cart.total());
}

/// Add one unit of a product, or increment its existing line.
pub async fn add(id: &str) -> Result<(), CliError> {
    let (config, mut session) = open_session()?;
    let backend = BackendClient::new(&config)?;
    let product_id = ProductId::from(id);

    let products = backend.list_products().await?;
    let Some(product) = products
        .into_iter()
        .find(|p| p.id == product_id && p.active)
    else {
        return Err(CliError::ProductNotFound(product_id));
    };

    let notifier = TerminalNotifier::new();
    match session.cart_mut().add_or_increment(&product) {
        AddOutcome::Added | AddOutcome::Incremented(_) => {
            notifier.notify(Notification::AddedToCart {
                name: product.name.clone(),
            });
        }
        AddOutcome::OutOfStock => {
            notifier.notify(Notification::StockAbsent {
                name: product.name.clone(),
            });
        }
        AddOutcome::LimitReached { available } => {
            notifier.notify(Notification::StockInsufficient {
                name: product.name.clone(),
                available,
            });
        }
    }
    print_summary(session.cart());
    Ok(())
}

/// Increment a line by one, bounded by the last seen stock.
pub fn inc(id: &str) -> Result<(), CliError> {
    let (_config, mut session) = open_session()?;
    let product_id = ProductId::from(id);
    let name = line_name(&session, &product_id);

    let notifier = TerminalNotifier::new();
    match session.cart_mut().increment(&product_id) {
        IncrementOutcome::Incremented(quantity) => println!("Quantity now {quantity}"),
        IncrementOutcome::LimitReached { available } => {
            if let Some(name) = name {
                notifier.notify(Notification::StockInsufficient { name, available });
            }
        }
        IncrementOutcome::Absent => println!("No cart line for product {product_id}"),
    }
    print_summary(session.cart());
    Ok(())
}

/// Decrement a line by one; a quantity of 1 removes the line.
pub fn dec(id: &str) -> Result<(), CliError> {
    let (_config, mut session) = open_session()?;
    let product_id = ProductId::from(id);

    match session.cart_mut().decrement(&product_id) {
        DecrementOutcome::Decremented(quantity) => println!("Quantity now {quantity}"),
        DecrementOutcome::Removed => println!("Line removed"),
        DecrementOutcome::Absent => println!("No cart line for product {product_id}"),
    }
    print_summary(session.cart());
    Ok(())
}

/// Set a line's quantity; 0 removes the line.
pub fn set(id: &str, quantity: u32) -> Result<(), CliError> {
    let (_config, mut session) = open_session()?;
    let product_id = ProductId::from(id);
    let name = line_name(&session, &product_id);

    let notifier = TerminalNotifier::new();
    match session.cart_mut().set_quantity(&product_id, quantity) {
        SetOutcome::Set => println!("Quantity set to {quantity}"),
        SetOutcome::Clamped { available } => {
            if let Some(name) = name {
                notifier.notify(Notification::StockInsufficient { name, available });
            }
            println!("Quantity clamped to {available}");
        }
        SetOutcome::Removed => println!("Line removed"),
        SetOutcome::Absent => println!("No cart line for product {product_id}"),
    }
    print_summary(session.cart());
    Ok(())
}

/// Remove a line entirely.
pub fn remove(id: &str) -> Result<(), CliError> {
    let (_config, mut session) = open_session()?;
    let product_id = ProductId::from(id);

    match session.cart_mut().remove(&product_id) {
        Some(line) => println!("Removed {}", line.name),
        None => println!("No cart line for product {product_id}"),
    }
    print_summary(session.cart());
    Ok(())
}

/// Show the cart.
pub fn show() -> Result<(), CliError> {
    let (_config, session) = open_session()?;
    let cart = session.cart();

    if cart.is_empty() {
        println!("Cart is empty");
        return Ok(());
    }

    for line in cart.lines() {
        let unit = line.unit_price.to_string();
        let total = line.line_total().to_string();
        println!(
            "{:>3} x {:<30} @ {:>10} = {:>10}  (id {})",
            line.quantity, line.name, unit, total, line.product_id
        );
    }
    println!("Total: {} ({} items)", cart.total(), cart.item_count());
    Ok(())
}

/// Empty the cart.
pub fn clear() -> Result<(), CliError> {
    let (_config, mut session) = open_session()?;
    session.cart_mut().clear();
    println!("Cart emptied");
    Ok(())
}

fn line_name(session: &Session, product_id: &ProductId) -> Option<String> {
    session
        .cart()
        .cart()
        .line(product_id)
        .map(|line| line.name.clone())
}
