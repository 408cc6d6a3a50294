//! Core types for Huerta.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod address;
pub mod cart;
pub mod id;
pub mod money;
pub mod role;

pub use address::ShippingAddress;
pub use cart::{Cart, CartLine};
pub use id::*;
pub use money::{Money, MoneyParseError, WireAmount};
pub use role::{RawRole, Role, RoleParseError};
