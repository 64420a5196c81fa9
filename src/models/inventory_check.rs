use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use super::Product;

/// Locally generated identity of a row in a count sheet.
///
/// Never derived from the product id: the same product may be added twice and
/// each row must stay individually addressable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RowKey(Uuid);

impl RowKey {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl fmt::Display for RowKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for RowKey {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// One working line of an inventory check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckRow {
    pub key: RowKey,
    pub product_id: Option<String>,
    pub product_name: Option<String>,
    /// Snapshot of the recorded stock taken when the row was created.
    pub system_quantity: i64,
    pub actual_quantity: i64,
}

impl CheckRow {
    /// Row for a selected product, with nothing counted yet.
    pub fn for_product(product: &Product, system_quantity: i64) -> Self {
        Self {
            key: RowKey::generate(),
            product_id: Some(product.id.clone()),
            product_name: Some(product.name.clone()),
            system_quantity,
            actual_quantity: 0,
        }
    }

    /// Row whose product has not been chosen yet.
    pub fn blank() -> Self {
        Self {
            key: RowKey::generate(),
            product_id: None,
            product_name: None,
            system_quantity: 0,
            actual_quantity: 0,
        }
    }

    /// The row as a submission line, if its product is resolved.
    pub fn to_item(&self) -> Option<InventoryCheckItem> {
        let product_id = self.product_id.as_ref().filter(|id| !id.is_empty())?;
        Some(InventoryCheckItem {
            product_id: product_id.clone(),
            system_quantity: self.system_quantity,
            actual_quantity: self.actual_quantity,
        })
    }
}

/// Body of `POST /inventory-checks`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryCheckPayload {
    pub warehouse_id: String,
    pub items: Vec<InventoryCheckItem>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryCheckItem {
    pub product_id: String,
    pub system_quantity: i64,
    pub actual_quantity: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn keys_are_unique_per_row() {
        let product = Product::new("P1", "Rice");
        let first = CheckRow::for_product(&product, 3);
        let second = CheckRow::for_product(&product, 3);
        assert_ne!(first.key, second.key);
        assert_eq!(first.product_id, second.product_id);
    }

    #[test]
    fn blank_rows_are_excluded_from_submission() {
        assert_eq!(CheckRow::blank().to_item(), None);

        let mut row = CheckRow::blank();
        row.product_id = Some(String::new());
        assert_eq!(row.to_item(), None);
    }

    #[test]
    fn payload_uses_camel_case_wire_names() {
        let payload = InventoryCheckPayload {
            warehouse_id: "W1".into(),
            items: vec![InventoryCheckItem {
                product_id: "P1".into(),
                system_quantity: 10,
                actual_quantity: 8,
            }],
        };

        assert_eq!(
            serde_json::to_value(&payload).unwrap(),
            json!({
                "warehouseId": "W1",
                "items": [{ "productId": "P1", "systemQuantity": 10, "actualQuantity": 8 }]
            })
        );
    }

    #[test]
    fn row_key_round_trips_through_text() {
        let key = RowKey::generate();
        let parsed: RowKey = key.to_string().parse().unwrap();
        assert_eq!(parsed, key);
    }
}
