//! Huerta Core - shared types library.
//!
//! This crate provides the domain types used across all Huerta components:
//! - `storefront` - the storefront client library (cart, stock
//!   reconciliation, checkout)
//! - `cli` - the terminal storefront driving the library
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no HTTP clients, no
//! filesystem access. Values that cross the external-interface boundary
//! (backend ids, prices, roles) are parsed into these types exactly once,
//! at that boundary; nothing downstream ever sees a raw wire value.
//!
//! # Modules
//!
//! - [`types`] - Product/user/order ids, money, roles, addresses, and the
//!   cart model

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
