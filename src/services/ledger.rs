use async_trait::async_trait;
use serde_json::Value;
use tracing::{info, instrument};

use crate::client::{ApiClient, INVENTORY_CHECKS_PATH, STOCK_INS_PATH};
use crate::errors::ApiError;
use crate::models::{InventoryCheckPayload, StockInPayload};

/// Persists completed inventory checks.
#[async_trait]
pub trait CheckLedger: Send + Sync {
    /// Returns the record the backend created; callers never read it back.
    async fn create_inventory_check(
        &self,
        payload: &InventoryCheckPayload,
    ) -> Result<Value, ApiError>;
}

/// Persists stock-in receipts.
#[async_trait]
pub trait StockInLedger: Send + Sync {
    async fn create_stock_in(&self, payload: &StockInPayload) -> Result<Value, ApiError>;
}

#[async_trait]
impl CheckLedger for ApiClient {
    #[instrument(skip(self, payload), fields(warehouse_id = %payload.warehouse_id, items = payload.items.len()))]
    async fn create_inventory_check(
        &self,
        payload: &InventoryCheckPayload,
    ) -> Result<Value, ApiError> {
        let record: Value = self.post_json(INVENTORY_CHECKS_PATH, payload).await?;
        info!("Inventory check created");
        Ok(record)
    }
}

#[async_trait]
impl StockInLedger for ApiClient {
    #[instrument(skip(self, payload), fields(warehouse_id = %payload.warehouse_id, items = payload.items.len()))]
    async fn create_stock_in(&self, payload: &StockInPayload) -> Result<Value, ApiError> {
        let record: Value = self.post_json(STOCK_INS_PATH, payload).await?;
        info!("Stock-in receipt created");
        Ok(record)
    }
}
