//! Data shapes exchanged with the backend and held by the workflows.

pub mod catalog;
pub mod inventory_check;
pub mod stock_in;

pub use catalog::{Product, Warehouse};
pub use inventory_check::{CheckRow, InventoryCheckItem, InventoryCheckPayload, RowKey};
pub use stock_in::{ReceiptLine, StockInItem, StockInPayload};

use serde::{Deserialize, Deserializer};

/// Accepts identifiers sent either as JSON strings or numbers.
pub(crate) fn flexible_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum IdRepr {
        Text(String),
        Integer(i64),
        Unsigned(u64),
    }

    Ok(match IdRepr::deserialize(deserializer)? {
        IdRepr::Text(text) => text,
        IdRepr::Integer(value) => value.to_string(),
        IdRepr::Unsigned(value) => value.to_string(),
    })
}
