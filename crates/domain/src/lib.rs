//! Domain layer for the supplier catalog and order placement system.
//!
//! This crate provides the entities the placement workflow depends on:
//! - `Product` with its stock rules
//! - `Order` with its status state machine and total computation
//! - `Money` fixed-point amounts
//!
//! Entities are value snapshots. Every mutation returns a new value or a
//! typed error.

pub mod money;
pub mod order;
pub mod product;

pub use money::Money;
pub use order::{Order, OrderError, OrderItem, OrderStatus, UnknownStatus};
pub use product::{NewProduct, Product, ProductError};
