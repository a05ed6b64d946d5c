//! Order placement over supplier-routed catalog stores.
//!
//! Placing an order spans several independently owned stores that share no
//! transaction. The workflow runs as a saga:
//! 1. Resolve each line's store and load the product
//! 2. Validate every line before mutating anything
//! 3. Commit stock line by line with an atomic conditional decrement
//! 4. Confirm and save the order
//!
//! If a commit or the save fails, previously committed lines are restored
//! in reverse order.

pub mod catalog;
pub mod coordinator;
pub mod error;
pub mod request;
pub mod saga;
pub mod state;
pub mod steps;

pub use catalog::CatalogService;
pub use coordinator::OrderPlacement;
pub use error::{PlacementError, Result};
pub use request::OrderLineRequest;
pub use saga::CommittedLine;
pub use state::SagaState;
