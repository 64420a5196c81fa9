use async_trait::async_trait;
use tracing::{info, instrument};

use crate::client::{ApiClient, PRODUCTS_PATH, WAREHOUSES_PATH};
use crate::errors::ApiError;
use crate::models::{Product, Warehouse};

/// Lists every sellable product.
#[async_trait]
pub trait CatalogLookup: Send + Sync {
    async fn fetch_products(&self) -> Result<Vec<Product>, ApiError>;
}

/// Lists every storage location that can be counted.
#[async_trait]
pub trait WarehouseLookup: Send + Sync {
    async fn fetch_warehouses(&self) -> Result<Vec<Warehouse>, ApiError>;
}

#[async_trait]
impl CatalogLookup for ApiClient {
    #[instrument(skip(self))]
    async fn fetch_products(&self) -> Result<Vec<Product>, ApiError> {
        let products: Vec<Product> = self.get_json(PRODUCTS_PATH).await?;
        info!(count = products.len(), "Fetched product catalog");
        Ok(products)
    }
}

#[async_trait]
impl WarehouseLookup for ApiClient {
    #[instrument(skip(self))]
    async fn fetch_warehouses(&self) -> Result<Vec<Warehouse>, ApiError> {
        let warehouses: Vec<Warehouse> = self.get_json(WAREHOUSES_PATH).await?;
        info!(count = warehouses.len(), "Fetched warehouses");
        Ok(warehouses)
    }
}
