//! Session state: the signed-in user and the restored cart.
//!
//! A [`Session`] is opened once per process from configuration and passed
//! explicitly to whatever needs it. Identity is an opaque persisted value;
//! signing in means fetching a user record through the backend seam and
//! keeping it locally until sign-out.

use huerta_core::UserId;
use thiserror::Error;
use tracing::{debug, instrument};

use crate::api::{ApiError, StoreBackend};
use crate::cart::CartStore;
use crate::config::StorefrontConfig;
use crate::models::CurrentUser;
use crate::storage::{LocalStore, StorageError};

/// Errors opening or mutating a session.
#[derive(Debug, Error)]
pub enum SessionError {
    /// A backend call failed.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// Local persistence failed.
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// The per-session context: local storage, the restored cart, and the
/// optional persisted identity.
#[derive(Debug)]
pub struct Session {
    store: LocalStore,
    cart: CartStore,
    user: Option<CurrentUser>,
}

impl Session {
    /// Open the session described by `config`: prepare the data directory,
    /// load the persisted identity, restore the session's cart.
    ///
    /// # Errors
    ///
    /// [`SessionError::Storage`] if the data directory cannot be prepared
    /// or a persisted file exists but cannot be read.
    pub fn open(config: &StorefrontConfig) -> Result<Self, SessionError> {
        let store = LocalStore::open(&config.data_dir)?;
        let user = store.load_current_user()?;
        let cart = CartStore::restore(store.clone(), &config.session_name)?;
        debug!(
            signed_in = user.is_some(),
            cart_lines = cart.lines().len(),
            "session opened"
        );
        Ok(Self { store, cart, user })
    }

    /// The signed-in user, if any.
    #[must_use]
    pub fn current_user(&self) -> Option<&CurrentUser> {
        self.user.as_ref()
    }

    /// Read access to the cart.
    #[must_use]
    pub const fn cart(&self) -> &CartStore {
        &self.cart
    }

    /// Mutable access to the cart.
    pub const fn cart_mut(&mut self) -> &mut CartStore {
        &mut self.cart
    }

    /// The underlying local store, for adjacent persisted state such as
    /// the catalog browse cache.
    #[must_use]
    pub const fn store(&self) -> &LocalStore {
        &self.store
    }

    /// Sign in as `id`: fetch the user through the backend, then persist
    /// the identity for future sessions.
    ///
    /// # Errors
    ///
    /// [`SessionError::Api`] if the fetch fails or no such user exists;
    /// [`SessionError::Storage`] if the identity cannot be persisted.
    #[instrument(skip(self, backend), fields(user_id = %id))]
    pub async fn login<B: StoreBackend>(
        &mut self,
        backend: &B,
        id: UserId,
    ) -> Result<&CurrentUser, SessionError> {
        let user = backend.get_user(id).await?;
        self.store.save_current_user(&user)?;
        debug!(role = ?user.role, "signed in");
        Ok(self.user.insert(user))
    }

    /// Sign out: drop the in-memory identity and delete the persisted one.
    ///
    /// Signing out while already signed out is a no-op.
    ///
    /// # Errors
    ///
    /// [`SessionError::Storage`] if the persisted identity cannot be
    /// removed.
    pub fn logout(&mut self) -> Result<(), SessionError> {
        self.store.clear_current_user()?;
        self.user = None;
        Ok(())
    }
}
