use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{Product, RowKey};

/// One received product on a stock-in receipt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptLine {
    pub key: RowKey,
    pub product_id: String,
    pub product_name: String,
    pub quantity: i64,
    pub unit_cost: Decimal,
}

impl ReceiptLine {
    pub fn new(product: &Product, quantity: i64, unit_cost: Decimal) -> Self {
        Self {
            key: RowKey::generate(),
            product_id: product.id.clone(),
            product_name: product.name.clone(),
            quantity,
            unit_cost,
        }
    }

    pub fn line_total(&self) -> Decimal {
        self.unit_cost * Decimal::from(self.quantity)
    }
}

/// Body of `POST /stock-ins`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockInPayload {
    pub warehouse_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    pub items: Vec<StockInItem>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockInItem {
    pub product_id: String,
    pub quantity: i64,
    pub unit_cost: Decimal,
}

impl From<&ReceiptLine> for StockInItem {
    fn from(line: &ReceiptLine) -> Self {
        Self {
            product_id: line.product_id.clone(),
            quantity: line.quantity,
            unit_cost: line.unit_cost,
        }
    }
}
