use async_trait::async_trait;
use serde::Serialize;
use tracing::{instrument, warn};

use crate::client::{ApiClient, STOCK_PATH};
use crate::errors::ApiError;

/// Answers how many units of a product the backend currently records.
#[async_trait]
pub trait StockOracle: Send + Sync {
    async fn get_stock(&self, product_id: &str) -> Result<i64, ApiError>;
}

#[async_trait]
impl StockOracle for ApiClient {
    #[instrument(skip(self))]
    async fn get_stock(&self, product_id: &str) -> Result<i64, ApiError> {
        let segments: Vec<&str> = STOCK_PATH
            .iter()
            .copied()
            .chain(std::iter::once(product_id))
            .collect();
        self.get_json(&segments).await
    }
}

/// Outcome of a single stock lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StockLookup {
    /// The backend answered with its recorded quantity.
    Recorded { quantity: i64 },
    /// The lookup failed and zero was assumed instead.
    Substituted { reason: String },
}

impl StockLookup {
    pub fn quantity(&self) -> i64 {
        match self {
            StockLookup::Recorded { quantity } => *quantity,
            StockLookup::Substituted { .. } => 0,
        }
    }

    pub fn is_substituted(&self) -> bool {
        matches!(self, StockLookup::Substituted { .. })
    }
}

/// Look up stock for one product, assuming an empty shelf if the lookup fails.
///
/// A substituted zero cannot be told apart from a genuinely empty shelf in the
/// resulting variance, so every substitution is logged.
pub async fn lookup_stock(oracle: &dyn StockOracle, product_id: &str) -> StockLookup {
    match oracle.get_stock(product_id).await {
        Ok(quantity) => StockLookup::Recorded { quantity },
        Err(err) => {
            warn!(
                product_id = %product_id,
                error = %err,
                "Stock lookup failed; assuming zero on hand"
            );
            StockLookup::Substituted {
                reason: err.user_message(),
            }
        }
    }
}
