//! Placement step names, used as the `step` field in logs.

/// Step name: resolve each line's store and load the product.
pub const STEP_RESOLVE: &str = "resolve";

/// Step name: check every line can be sold, before any mutation.
pub const STEP_VALIDATE: &str = "validate";

/// Step name: conditionally decrement stock, line by line.
pub const STEP_COMMIT_STOCK: &str = "commit_stock";

/// Step name: confirm and save the order.
pub const STEP_PERSIST_ORDER: &str = "persist_order";

/// Step name: restore stock committed before a failure.
pub const STEP_COMPENSATE: &str = "compensate";
