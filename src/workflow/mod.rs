//! Inventory workflows.
//!
//! The inventory check compares recorded stock against a physical count:
//! [`builder`] turns a product selection into rows, [`check`] holds the
//! working state, [`variance`] summarises it and [`submitter`] validates and
//! sends it. [`CheckSession`] ties these together over the backend traits.
//! [`stock_in`] covers the receiving side.

pub mod builder;
pub mod check;
pub mod session;
pub mod stock_in;
pub mod submitter;
pub mod variance;

pub use builder::{build_rows, AddedRows};
pub use check::{CheckPhase, InventoryCheck};
pub use session::{CheckDependencies, CheckSession};
pub use stock_in::{submit_stock_in, ReceiptTotals, StockInReceipt};
pub use submitter::{build_payload, submit};
pub use variance::{classify_row, row_variance, VarianceClass, VarianceSummary};
