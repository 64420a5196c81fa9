//! Turns a product selection into count rows.

use futures::future::join_all;
use std::sync::Arc;
use tracing::{debug, error};

use crate::errors::WorkflowError;
use crate::models::{CheckRow, Product};
use crate::services::{lookup_stock, StockLookup, StockOracle};

/// Rows built for one confirmed selection, in selection order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddedRows {
    pub rows: Vec<CheckRow>,
    /// Per-product lookup outcome, parallel to `rows`.
    pub lookups: Vec<StockLookup>,
}

impl AddedRows {
    /// Products whose recorded stock could not be read, with the reason.
    pub fn substituted(&self) -> impl Iterator<Item = (&CheckRow, &str)> + '_ {
        self.rows
            .iter()
            .zip(&self.lookups)
            .filter_map(|(row, lookup)| match lookup {
                StockLookup::Substituted { reason } => Some((row, reason.as_str())),
                StockLookup::Recorded { .. } => None,
            })
    }
}

/// Build one row per selected product.
///
/// Stock for every product is looked up concurrently, each lookup as its own
/// task. A failed lookup degrades to zero for that product only; a lookup task
/// that dies (panic, cancellation) or a product without an identifier fails
/// the whole batch and no rows are returned.
pub async fn build_rows(
    oracle: Arc<dyn StockOracle>,
    selected: &[Product],
) -> Result<AddedRows, WorkflowError> {
    if selected.is_empty() {
        return Err(WorkflowError::NoProductsSelected);
    }

    if let Some(product) = selected.iter().find(|p| p.id.trim().is_empty()) {
        return Err(WorkflowError::BatchOperationFailure(format!(
            "product '{}' has no identifier",
            product.name
        )));
    }

    let handles: Vec<_> = selected
        .iter()
        .map(|product| {
            let oracle = Arc::clone(&oracle);
            let product_id = product.id.clone();
            tokio::spawn(async move { lookup_stock(oracle.as_ref(), &product_id).await })
        })
        .collect();

    let outcomes = join_all(handles).await;

    let mut rows = Vec::with_capacity(selected.len());
    let mut lookups = Vec::with_capacity(selected.len());
    for (product, outcome) in selected.iter().zip(outcomes) {
        let lookup = outcome.map_err(|err| {
            error!(product_id = %product.id, error = %err, "Stock lookup task failed");
            WorkflowError::BatchOperationFailure(err.to_string())
        })?;
        rows.push(CheckRow::for_product(product, lookup.quantity()));
        lookups.push(lookup);
    }

    debug!(count = rows.len(), "Built count rows");
    Ok(AddedRows { rows, lookups })
}
