//! Integration tests for Huerta.
//!
//! The harness runs the real storefront library against a scripted
//! in-process backend: [`TestBackend`] implements the backend seam with
//! queued responses, [`ScriptedPrompt`] answers remediation prompts, and
//! [`RecordingNotifier`] captures what the user would have been told.
//! Session state lives in a per-test temp directory owned by
//! [`TestHome`].
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p huerta-integration-tests
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::collections::{HashMap, VecDeque};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use tempfile::TempDir;

use huerta_core::{Money, OrderId, Role, ShippingAddress, UserId};
use huerta_storefront::api::{ApiError, StoreBackend};
use huerta_storefront::checkout::reconcile::{
    ReconcileReport, RemediationChoice, RemediationPrompt,
};
use huerta_storefront::config::StorefrontConfig;
use huerta_storefront::models::{
    CurrentUser, OrderReceipt, OrderSubmission, Product, StockSnapshot,
};
use huerta_storefront::notify::{Notification, NotificationKind, Notifier};
use huerta_storefront::session::Session;
use huerta_storefront::storage::LocalStore;

// ===== Fixtures =====

/// An active product with the given stock.
///
/// # Panics
///
/// Panics if `price` is not a valid amount.
#[must_use]
pub fn product(id: i64, name: &str, price: &str, stock: u32) -> Product {
    let unit_price = match Money::parse(price) {
        Ok(money) => money,
        Err(e) => panic!("bad fixture price {price:?}: {e}"),
    };
    Product {
        id: id.into(),
        name: name.to_string(),
        unit_price,
        stock_quantity: stock,
        active: true,
        image_url: None,
        category: None,
        description: None,
    }
}

/// A customer with a complete shipping address.
#[must_use]
pub fn customer(id: i64) -> CurrentUser {
    CurrentUser {
        id: UserId::new(id),
        name: "María Pérez".to_string(),
        email: "maria@example.com".to_string(),
        role: Role::Customer,
        address: ShippingAddress::new("Av. Los Aromos 123", "Ñuñoa", "RM"),
    }
}

/// A customer whose address is missing its comuna.
#[must_use]
pub fn customer_missing_comuna(id: i64) -> CurrentUser {
    CurrentUser {
        address: ShippingAddress::new("Av. Los Aromos 123", "", "RM"),
        ..customer(id)
    }
}

// ===== Local state =====

/// A per-test data directory with helpers for seeding persisted state.
pub struct TestHome {
    dir: TempDir,
}

impl TestHome {
    /// Create an empty data directory.
    ///
    /// # Panics
    ///
    /// Panics if the temp directory cannot be created.
    #[must_use]
    pub fn new() -> Self {
        match tempfile::tempdir() {
            Ok(dir) => Self { dir },
            Err(e) => panic!("failed to create temp dir: {e}"),
        }
    }

    /// Path of the data directory.
    #[must_use]
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Configuration pointing at this directory.
    #[must_use]
    pub fn config(&self) -> StorefrontConfig {
        StorefrontConfig {
            api_base_url: "http://localhost:0/api".to_string(),
            api_token: None,
            data_dir: self.path().to_path_buf(),
            session_name: "default".to_string(),
            http_timeout: std::time::Duration::from_secs(5),
        }
    }

    /// The local store over this directory.
    ///
    /// # Panics
    ///
    /// Panics if the directory cannot be opened.
    #[must_use]
    pub fn store(&self) -> LocalStore {
        match LocalStore::open(self.path()) {
            Ok(store) => store,
            Err(e) => panic!("failed to open local store: {e}"),
        }
    }

    /// Persist `user` as the signed-in identity.
    ///
    /// # Panics
    ///
    /// Panics if the identity cannot be written.
    pub fn sign_in(&self, user: &CurrentUser) {
        if let Err(e) = self.store().save_current_user(user) {
            panic!("failed to persist identity: {e}");
        }
    }

    /// Open a session over this directory.
    ///
    /// # Panics
    ///
    /// Panics if the session cannot be opened.
    #[must_use]
    pub fn open_session(&self) -> Session {
        match Session::open(&self.config()) {
            Ok(session) => session,
            Err(e) => panic!("failed to open session: {e}"),
        }
    }
}

impl Default for TestHome {
    fn default() -> Self {
        Self::new()
    }
}

// ===== Scripted backend =====

/// In-process backend with queued responses.
///
/// Stock snapshots and order outcomes are consumed in FIFO order, one per
/// call; running dry panics, so a test's script documents exactly how many
/// backend calls it expects. Submissions are recorded for assertions.
#[derive(Default)]
pub struct TestBackend {
    products: Mutex<Vec<Product>>,
    users: Mutex<HashMap<UserId, CurrentUser>>,
    snapshots: Mutex<VecDeque<Result<StockSnapshot, ApiError>>>,
    orders: Mutex<VecDeque<Result<OrderReceipt, ApiError>>>,
    submitted: Mutex<Vec<OrderSubmission>>,
    snapshot_fetches: AtomicUsize,
}

impl TestBackend {
    /// An empty backend; every queue starts dry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve this catalog from `list_products`.
    #[must_use]
    pub fn with_products(self, products: Vec<Product>) -> Self {
        *lock(&self.products) = products;
        self
    }

    /// Make `get_user` know this user.
    #[must_use]
    pub fn with_user(self, user: CurrentUser) -> Self {
        lock(&self.users).insert(user.id, user);
        self
    }

    /// Queue a stock snapshot built from `products`.
    pub fn push_snapshot(&self, products: &[Product]) {
        lock(&self.snapshots).push_back(Ok(StockSnapshot::from_products(products)));
    }

    /// Queue a snapshot fetch failure.
    pub fn push_snapshot_error(&self, error: ApiError) {
        lock(&self.snapshots).push_back(Err(error));
    }

    /// Queue an accepted order.
    pub fn push_order_ok(&self, order_id: i64) {
        lock(&self.orders).push_back(Ok(OrderReceipt {
            order_id: OrderId::new(order_id),
        }));
    }

    /// Queue an order rejection with the given reason.
    pub fn push_order_rejection(&self, message: &str) {
        lock(&self.orders).push_back(Err(ApiError::OrderRejected {
            message: message.to_string(),
        }));
    }

    /// Queue an order transport-level failure.
    pub fn push_order_error(&self, error: ApiError) {
        lock(&self.orders).push_back(Err(error));
    }

    /// How many stock snapshots were fetched.
    #[must_use]
    pub fn snapshot_fetches(&self) -> usize {
        self.snapshot_fetches.load(Ordering::SeqCst)
    }

    /// Every submission the backend received, in order.
    #[must_use]
    pub fn submitted(&self) -> Vec<OrderSubmission> {
        lock(&self.submitted).clone()
    }
}

impl StoreBackend for TestBackend {
    async fn fetch_stock_snapshot(&self) -> Result<StockSnapshot, ApiError> {
        self.snapshot_fetches.fetch_add(1, Ordering::SeqCst);
        match lock(&self.snapshots).pop_front() {
            Some(result) => result,
            None => panic!("no scripted stock snapshot left"),
        }
    }

    async fn list_products(&self) -> Result<Vec<Product>, ApiError> {
        Ok(lock(&self.products).clone())
    }

    async fn get_user(&self, user_id: UserId) -> Result<CurrentUser, ApiError> {
        lock(&self.users)
            .get(&user_id)
            .cloned()
            .ok_or_else(|| ApiError::NotFound(format!("user {user_id}")))
    }

    async fn submit_order(&self, submission: &OrderSubmission) -> Result<OrderReceipt, ApiError> {
        lock(&self.submitted).push(submission.clone());
        match lock(&self.orders).pop_front() {
            Some(result) => result,
            None => panic!("no scripted order outcome left"),
        }
    }
}

// ===== Scripted prompt =====

/// Remediation prompt with a scripted answer sequence.
///
/// Queued overrides are consumed first; once dry, every further prompt
/// gets the default answer.
pub struct ScriptedPrompt {
    default: RemediationChoice,
    overrides: Mutex<VecDeque<RemediationChoice>>,
    calls: AtomicUsize,
}

impl ScriptedPrompt {
    /// Always consent to the fix.
    #[must_use]
    pub fn always_apply() -> Self {
        Self::with_default(RemediationChoice::ApplyFix)
    }

    /// Always defer, leaving the cart alone.
    #[must_use]
    pub fn always_defer() -> Self {
        Self::with_default(RemediationChoice::Defer)
    }

    /// Answer from `choices` first, then fall back to `always_apply`.
    #[must_use]
    pub fn with_choices(choices: impl IntoIterator<Item = RemediationChoice>) -> Self {
        let prompt = Self::with_default(RemediationChoice::ApplyFix);
        lock(&prompt.overrides).extend(choices);
        prompt
    }

    fn with_default(default: RemediationChoice) -> Self {
        Self {
            default,
            overrides: Mutex::new(VecDeque::new()),
            calls: AtomicUsize::new(0),
        }
    }

    /// How many times the user was prompted.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl RemediationPrompt for ScriptedPrompt {
    async fn resolve(&self, _report: &ReconcileReport) -> RemediationChoice {
        self.calls.fetch_add(1, Ordering::SeqCst);
        lock(&self.overrides).pop_front().unwrap_or(self.default)
    }
}

// ===== Recording notifier =====

/// Captures notifications for assertions.
#[derive(Default)]
pub struct RecordingNotifier {
    seen: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    /// An empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Every notification seen so far, in order.
    #[must_use]
    pub fn notifications(&self) -> Vec<Notification> {
        lock(&self.seen).clone()
    }

    /// The kinds seen so far, in order.
    #[must_use]
    pub fn kinds(&self) -> Vec<NotificationKind> {
        lock(&self.seen).iter().map(Notification::kind).collect()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notification: Notification) {
        lock(&self.seen).push(notification);
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
