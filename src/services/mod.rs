//! Backend capabilities the workflows depend on.
//!
//! Each capability is a trait so the workflows can run against the REST
//! client in production and against in-memory fakes in tests.

pub mod catalog;
pub mod ledger;
pub mod stock;

pub use catalog::{CatalogLookup, WarehouseLookup};
pub use ledger::{CheckLedger, StockInLedger};
pub use stock::{lookup_stock, StockLookup, StockOracle};
