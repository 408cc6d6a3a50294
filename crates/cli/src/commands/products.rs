//! Catalog browsing commands.
//!
//! Every successful `products list` refreshes the local catalog cache;
//! `--offline-ok` falls back to that cache when the backend is
//! unreachable. Checkout reconciliation never reads this cache.

#![allow(clippy::print_stdout)]

use huerta_core::ProductId;
use huerta_storefront::api::{BackendClient, StoreBackend};
use huerta_storefront::config::StorefrontConfig;
use huerta_storefront::models::Product;
use huerta_storefront::storage::LocalStore;
use tracing::warn;

use super::CliError;

/// List the published catalog.
pub async fn list(offline_ok: bool) -> Result<(), CliError> {
    let config = StorefrontConfig::from_env()?;
    let store = LocalStore::open(&config.data_dir)?;
    let backend = BackendClient::new(&config)?;

    let products = match backend.list_products().await {
        Ok(products) => {
            store.save_catalog_cache(&products)?;
            products
        }
        Err(e) if offline_ok => {
            warn!(error = %e, "backend unreachable, using cached catalog");
            let Some(cache) = store.load_catalog_cache()? else {
                return Err(e.into());
            };
            println!(
                "(backend unreachable; showing catalog cached at {})",
                cache.fetched_at.format("%Y-%m-%d %H:%M UTC")
            );
            cache.products
        }
        Err(e) => return Err(e.into()),
    };

    let published: Vec<&Product> = products.iter().filter(|p| p.active).collect();
    if published.is_empty() {
        println!("No products published");
        return Ok(());
    }

    println!("{:<6} {:<30} {:>12} {:>7}", "ID", "NAME", "PRICE", "STOCK");
    for product in published {
        let price = product.unit_price.to_string();
        println!(
            "{:<6} {:<30} {:>12} {:>7}",
            product.id.as_str(),
            product.name,
            price,
            product.stock_quantity
        );
    }
    Ok(())
}

/// Show one product in detail.
pub async fn show(id: &str) -> Result<(), CliError> {
    let config = StorefrontConfig::from_env()?;
    let backend = BackendClient::new(&config)?;
    let product_id = ProductId::from(id);

    let products = backend.list_products().await?;
    let Some(product) = products
        .into_iter()
        .find(|p| p.id == product_id && p.active)
    else {
        return Err(CliError::ProductNotFound(product_id));
    };

    println!("{} (id {})", product.name, product.id);
    println!("  Price: {}", product.unit_price);
    println!("  Stock: {}", product.stock_quantity);
    if let Some(category) = &product.category {
        println!("  Category: {category}");
    }
    if let Some(description) = &product.description {
        println!("  {description}");
    }
    if let Some(image_url) = &product.image_url {
        println!("  Image: {image_url}");
    }
    Ok(())
}
