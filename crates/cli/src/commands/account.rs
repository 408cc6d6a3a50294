//! Account commands.
//!
//! Identity is an opaque persisted value: `login` fetches a user record
//! from the backend by id and keeps it locally until `logout`.

#![allow(clippy::print_stdout)]

use huerta_core::UserId;
use huerta_storefront::api::BackendClient;
use huerta_storefront::config::StorefrontConfig;
use huerta_storefront::session::Session;

use super::CliError;

/// Sign in by backend user id.
pub async fn login(user_id: i64) -> Result<(), CliError> {
    let config = StorefrontConfig::from_env()?;
    let mut session = Session::open(&config)?;
    let backend = BackendClient::new(&config)?;

    let user = session.login(&backend, UserId::new(user_id)).await?;
    println!("Signed in as {} <{}> ({})", user.name, user.email, user.role);
    Ok(())
}

/// Sign out.
pub fn logout() -> Result<(), CliError> {
    let config = StorefrontConfig::from_env()?;
    let mut session = Session::open(&config)?;
    session.logout()?;
    println!("Signed out");
    Ok(())
}

/// Show the signed-in user.
pub fn whoami() -> Result<(), CliError> {
    let config = StorefrontConfig::from_env()?;
    let session = Session::open(&config)?;

    match session.current_user() {
        Some(user) => {
            println!("{} <{}> ({})", user.name, user.email, user.role);
            let missing = user.address.missing_fields();
            if missing.is_empty() {
                println!(
                    "Shipping: {}, {}, {}",
                    user.address.street, user.address.comuna, user.address.region
                );
            } else {
                println!("Shipping address incomplete: missing {}", missing.join(", "));
            }
        }
        None => println!("Not signed in"),
    }
    Ok(())
}
