//! Stock-in receipts: goods received into a warehouse.

use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{error, info, instrument};

use crate::errors::WorkflowError;
use crate::events::{notify, Event, EventSender};
use crate::models::{Product, ReceiptLine, RowKey, StockInItem, StockInPayload};
use crate::services::StockInLedger;

/// Running totals shown under the receipt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptTotals {
    pub line_count: usize,
    pub total_quantity: i64,
    pub total_cost: Decimal,
}

#[derive(Debug, Clone, Default)]
pub struct StockInReceipt {
    warehouse_id: Option<String>,
    note: Option<String>,
    lines: Vec<ReceiptLine>,
}

impl StockInReceipt {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_warehouse(&mut self, warehouse_id: impl Into<String>) {
        self.warehouse_id = Some(warehouse_id.into());
    }

    pub fn warehouse_id(&self) -> Option<&str> {
        self.warehouse_id.as_deref()
    }

    /// Attach a free-text note. Blank text clears it.
    pub fn set_note(&mut self, note: impl Into<String>) {
        let note = note.into();
        self.note = if note.trim().is_empty() {
            None
        } else {
            Some(note)
        };
    }

    pub fn note(&self) -> Option<&str> {
        self.note.as_deref()
    }

    pub fn add_line(&mut self, product: &Product, quantity: i64, unit_cost: Decimal) -> RowKey {
        let line = ReceiptLine::new(product, quantity, unit_cost);
        let key = line.key;
        self.lines.push(line);
        key
    }

    pub fn remove_line(&mut self, key: RowKey) -> bool {
        let before = self.lines.len();
        self.lines.retain(|line| line.key != key);
        before != self.lines.len()
    }

    pub fn update_quantity(&mut self, key: RowKey, quantity: i64) -> bool {
        self.line_mut(key)
            .map(|line| line.quantity = quantity)
            .is_some()
    }

    pub fn update_unit_cost(&mut self, key: RowKey, unit_cost: Decimal) -> bool {
        self.line_mut(key)
            .map(|line| line.unit_cost = unit_cost)
            .is_some()
    }

    pub fn lines(&self) -> &[ReceiptLine] {
        &self.lines
    }

    pub fn totals(&self) -> ReceiptTotals {
        self.lines.iter().fold(
            ReceiptTotals {
                line_count: self.lines.len(),
                ..Default::default()
            },
            |mut totals, line| {
                totals.total_quantity += line.quantity;
                totals.total_cost += line.line_total();
                totals
            },
        )
    }

    /// Validate and build the creation request.
    ///
    /// Checks run in order: warehouse, at least one line, then every quantity
    /// must be positive. The first failing line is reported.
    pub fn payload(&self) -> Result<StockInPayload, WorkflowError> {
        let warehouse_id = self
            .warehouse_id
            .as_deref()
            .filter(|id| !id.trim().is_empty())
            .ok_or(WorkflowError::MissingWarehouse)?;

        if self.lines.is_empty() {
            return Err(WorkflowError::NoItems);
        }

        if let Some(line) = self.lines.iter().find(|line| line.quantity <= 0) {
            return Err(WorkflowError::InvalidQuantity {
                product_id: line.product_id.clone(),
            });
        }

        Ok(StockInPayload {
            warehouse_id: warehouse_id.to_string(),
            note: self.note.clone(),
            items: self.lines.iter().map(StockInItem::from).collect(),
        })
    }

    fn line_mut(&mut self, key: RowKey) -> Option<&mut ReceiptLine> {
        self.lines.iter_mut().find(|line| line.key == key)
    }
}

/// Validate and send a receipt. Validation failures send nothing.
#[instrument(skip_all, fields(lines = receipt.lines().len()))]
pub async fn submit_stock_in(
    ledger: &dyn StockInLedger,
    receipt: &StockInReceipt,
    events: Option<&EventSender>,
) -> Result<StockInPayload, WorkflowError> {
    let payload = match receipt.payload() {
        Ok(payload) => payload,
        Err(err) => {
            notify(
                events,
                Event::ValidationFailed {
                    message: err.to_string(),
                },
            )
            .await;
            return Err(err);
        }
    };

    match ledger.create_stock_in(&payload).await {
        Ok(_) => {
            info!(warehouse_id = %payload.warehouse_id, "Stock-in receipt submitted");
            notify(
                events,
                Event::StockInSubmitted {
                    warehouse_id: payload.warehouse_id.clone(),
                    item_count: payload.items.len(),
                },
            )
            .await;
            Ok(payload)
        }
        Err(err) => {
            error!(warehouse_id = %payload.warehouse_id, error = %err, "Stock-in submission rejected");
            let err = WorkflowError::from(err);
            notify(
                events,
                Event::SubmissionFailed {
                    message: err.to_string(),
                },
            )
            .await;
            Err(err)
        }
    }
}
