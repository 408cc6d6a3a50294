//! Huerta storefront client library.
//!
//! Everything a storefront frontend needs between "add to cart" and a
//! submitted order: the backend API client, the persistent cart store,
//! stock reconciliation against fresh snapshots, and the checkout
//! orchestration that ties them together.
//!
//! # Architecture
//!
//! - The backend is the source of truth for stock; the cart only carries
//!   hints. Checkout revalidates against fresh snapshots and never trusts
//!   cached availability.
//! - Wire payloads are parsed at the boundary into the strict types from
//!   `huerta-core`; raw values never travel further inward.
//! - [`api::StoreBackend`] is the seam between orchestration and HTTP, so
//!   checkout flows are testable against an in-memory backend.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod cart;
pub mod checkout;
pub mod config;
pub mod models;
pub mod notify;
pub mod session;
pub mod storage;
