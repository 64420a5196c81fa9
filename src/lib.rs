//! Inventory check library
//!
//! Back-office inventory workflows over a REST backend: physical stock counts
//! compared against recorded stock, and stock-in receipts.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod client;
pub mod config;
pub mod errors;
pub mod events;
pub mod models;
pub mod services;
pub mod workflow;

pub use client::ApiClient;
pub use config::{init_tracing, load_config, AppConfig};
pub use errors::{ApiError, ErrorCategory, WorkflowError};

/// Common imports for callers driving the workflows.
pub mod prelude {
    pub use crate::client::ApiClient;
    pub use crate::config::AppConfig;
    pub use crate::errors::{ApiError, WorkflowError};
    pub use crate::events::{Event, EventSender, NoticeLevel, Notification};
    pub use crate::models::{CheckRow, Product, RowKey, Warehouse};
    pub use crate::services::{
        CatalogLookup, CheckLedger, StockInLedger, StockLookup, StockOracle, WarehouseLookup,
    };
    pub use crate::workflow::{
        CheckDependencies, CheckPhase, CheckSession, InventoryCheck, StockInReceipt,
        VarianceSummary,
    };
}
