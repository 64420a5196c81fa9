//! Async driver for one inventory check.
//!
//! `CheckSession` owns an [`InventoryCheck`] and the backend capabilities it
//! needs, performs the network calls, and reports every outcome as a
//! notification. Locks are only held between awaits, never across them, so the
//! session stays usable while a lookup or submission is outstanding.

use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{error, info, instrument, warn};

use super::builder::build_rows;
use super::check::{CheckPhase, InventoryCheck};
use super::submitter::send_payload;
use super::variance::VarianceSummary;
use crate::client::ApiClient;
use crate::errors::{ApiError, ErrorCategory, WorkflowError};
use crate::events::{notify, Event, EventSender};
use crate::models::{CheckRow, Product, RowKey, Warehouse};
use crate::services::{
    lookup_stock, CatalogLookup, CheckLedger, StockLookup, StockOracle, WarehouseLookup,
};

/// Backend capabilities a session talks to.
#[derive(Clone)]
pub struct CheckDependencies {
    pub catalog: Arc<dyn CatalogLookup>,
    pub warehouses: Arc<dyn WarehouseLookup>,
    pub oracle: Arc<dyn StockOracle>,
    pub ledger: Arc<dyn CheckLedger>,
}

impl CheckDependencies {
    pub fn from_client(client: Arc<ApiClient>) -> Self {
        Self {
            catalog: client.clone(),
            warehouses: client.clone(),
            oracle: client.clone(),
            ledger: client,
        }
    }
}

pub struct CheckSession {
    deps: CheckDependencies,
    state: Mutex<InventoryCheck>,
    products: RwLock<Vec<Product>>,
    warehouses: RwLock<Vec<Warehouse>>,
    events: Option<EventSender>,
}

impl CheckSession {
    pub fn new(deps: CheckDependencies) -> Self {
        Self {
            deps,
            state: Mutex::new(InventoryCheck::new()),
            products: RwLock::new(Vec::new()),
            warehouses: RwLock::new(Vec::new()),
            events: None,
        }
    }

    pub fn with_events(mut self, events: EventSender) -> Self {
        self.events = Some(events);
        self
    }

    /// Fetch the product list for selection. Errors are returned to the
    /// caller, who retries by calling again.
    #[instrument(skip(self))]
    pub async fn load_products(&self) -> Result<Vec<Product>, ApiError> {
        match self.deps.catalog.fetch_products().await {
            Ok(products) => {
                *self.products.write().await = products.clone();
                self.emit(Event::ProductsLoaded {
                    count: products.len(),
                })
                .await;
                Ok(products)
            }
            Err(err) => {
                error!(error = %err, "Failed to load products");
                self.emit(Event::LoadFailed {
                    resource: "products".into(),
                    message: err.user_message(),
                })
                .await;
                Err(err)
            }
        }
    }

    #[instrument(skip(self))]
    pub async fn load_warehouses(&self) -> Result<Vec<Warehouse>, ApiError> {
        match self.deps.warehouses.fetch_warehouses().await {
            Ok(warehouses) => {
                *self.warehouses.write().await = warehouses.clone();
                self.emit(Event::WarehousesLoaded {
                    count: warehouses.len(),
                })
                .await;
                Ok(warehouses)
            }
            Err(err) => {
                error!(error = %err, "Failed to load warehouses");
                self.emit(Event::LoadFailed {
                    resource: "warehouses".into(),
                    message: err.user_message(),
                })
                .await;
                Err(err)
            }
        }
    }

    pub async fn products(&self) -> Vec<Product> {
        self.products.read().await.clone()
    }

    pub async fn warehouses(&self) -> Vec<Warehouse> {
        self.warehouses.read().await.clone()
    }

    /// Choose one of the loaded warehouses as the count location.
    pub async fn choose_warehouse(&self, warehouse_id: &str) -> Result<Warehouse, WorkflowError> {
        let found = self
            .warehouses
            .read()
            .await
            .iter()
            .find(|w| w.id == warehouse_id)
            .cloned();

        let Some(warehouse) = found else {
            let err = WorkflowError::UnknownWarehouse(warehouse_id.to_string());
            self.report(&err).await;
            return Err(err);
        };

        if self.state.lock().await.choose_warehouse(warehouse.clone()) {
            self.emit(Event::WarehouseChosen {
                warehouse_id: warehouse.id.clone(),
            })
            .await;
        }
        Ok(warehouse)
    }

    /// Add one row per product in `selection`, looking up stock for each.
    ///
    /// On success the selection is cleared. If the session was discarded
    /// while lookups were running, the late rows are dropped and an empty list
    /// is returned.
    #[instrument(skip(self, selection), fields(selected = selection.len()))]
    pub async fn add_products(
        &self,
        selection: &mut Vec<Product>,
    ) -> Result<Vec<CheckRow>, WorkflowError> {
        let added = match build_rows(Arc::clone(&self.deps.oracle), selection).await {
            Ok(added) => added,
            Err(err) => {
                self.report(&err).await;
                return Err(err);
            }
        };

        let degraded: Vec<(String, String)> = added
            .substituted()
            .filter_map(|(row, reason)| {
                row.product_id
                    .clone()
                    .map(|product_id| (product_id, reason.to_string()))
            })
            .collect();

        let committed = self.state.lock().await.append_rows(added.rows.clone());
        if committed == 0 {
            warn!("Inventory check closed before stock lookups finished; dropping rows");
            return Ok(Vec::new());
        }

        selection.clear();
        info!(count = committed, "Added count rows");
        self.emit(Event::RowsAdded { count: committed }).await;
        for (product_id, reason) in degraded {
            self.emit(Event::StockLookupDegraded { product_id, reason })
                .await;
        }

        Ok(added.rows)
    }

    /// Append a row with no product yet.
    pub async fn add_blank_row(&self) -> Option<RowKey> {
        self.state.lock().await.add_blank_row()
    }

    /// Resolve the product of an existing row, snapshotting its stock.
    ///
    /// Returns `None` when the row no longer exists.
    pub async fn select_product(&self, key: RowKey, product: &Product) -> Option<StockLookup> {
        let lookup = lookup_stock(self.deps.oracle.as_ref(), &product.id).await;
        let assigned = self
            .state
            .lock()
            .await
            .assign_product(key, product, lookup.quantity());

        if !assigned {
            return None;
        }
        if let StockLookup::Substituted { reason } = &lookup {
            self.emit(Event::StockLookupDegraded {
                product_id: product.id.clone(),
                reason: reason.clone(),
            })
            .await;
        }
        Some(lookup)
    }

    pub async fn remove_row(&self, key: RowKey) -> bool {
        let removed = self.state.lock().await.remove_row(key);
        self.emit(Event::RowRemoved { key }).await;
        removed
    }

    pub async fn edit_actual_quantity(&self, key: RowKey, value: Option<i64>) -> bool {
        self.state.lock().await.edit_actual_quantity(key, value)
    }

    pub async fn rows(&self) -> Vec<CheckRow> {
        self.state.lock().await.rows().to_vec()
    }

    pub async fn summary(&self) -> VarianceSummary {
        self.state.lock().await.summary()
    }

    pub async fn phase(&self) -> CheckPhase {
        self.state.lock().await.phase()
    }

    /// Copy of the current state.
    pub async fn snapshot(&self) -> InventoryCheck {
        self.state.lock().await.clone()
    }

    /// Validate and send the count.
    ///
    /// Only one submission can be outstanding; a second call made meanwhile
    /// fails with [`WorkflowError::SubmissionInFlight`]. On failure all rows
    /// and edits are kept and the user may submit again.
    #[instrument(skip(self))]
    pub async fn submit(&self) -> Result<(), WorkflowError> {
        let payload = match self.state.lock().await.begin_submission() {
            Ok(payload) => payload,
            Err(err) => {
                self.report(&err).await;
                return Err(err);
            }
        };

        let outcome = send_payload(self.deps.ledger.as_ref(), &payload).await;
        let result = self.state.lock().await.finish_submission(outcome);

        match &result {
            Ok(()) => {
                self.emit(Event::Submitted {
                    warehouse_id: payload.warehouse_id.clone(),
                    item_count: payload.items.len(),
                })
                .await
            }
            Err(err) => self.report(err).await,
        }
        result
    }

    /// The user left the screen; drop all local state.
    pub async fn discard(&self) {
        self.state.lock().await.discard();
    }

    async fn report(&self, err: &WorkflowError) {
        let message = err.to_string();
        let event = match err.category() {
            ErrorCategory::BatchOperationFailure => Event::BatchFailed { message },
            ErrorCategory::SubmissionFailure => Event::SubmissionFailed { message },
            _ => Event::ValidationFailed { message },
        };
        self.emit(event).await;
    }

    async fn emit(&self, event: Event) {
        notify(self.events.as_ref(), event).await;
    }
}
