//! State container for one inventory check.
//!
//! Holds the chosen warehouse and the working rows and enforces the
//! lifecycle `Empty -> WarehouseChosen -> ItemsAdded -> Submitting ->
//! Submitted`, with a failed submission falling back to `ItemsAdded`. It does
//! no I/O; [`super::CheckSession`] drives it across network calls.

use serde::Serialize;
use strum::Display;
use tracing::{debug, warn};

use super::submitter::build_payload;
use super::variance::VarianceSummary;
use crate::errors::WorkflowError;
use crate::models::{CheckRow, InventoryCheckPayload, Product, RowKey, Warehouse};

/// Observable state of the workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
pub enum CheckPhase {
    Empty,
    WarehouseChosen,
    ItemsAdded,
    Submitting,
    /// Terminal; local state has been dropped.
    Submitted,
    /// Terminal; the user left without submitting.
    Discarded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lifecycle {
    Editing,
    Submitting,
    Submitted,
    Discarded,
}

#[derive(Debug, Clone)]
pub struct InventoryCheck {
    warehouse: Option<Warehouse>,
    rows: Vec<CheckRow>,
    lifecycle: Lifecycle,
    last_error: Option<WorkflowError>,
}

impl Default for InventoryCheck {
    fn default() -> Self {
        Self::new()
    }
}

impl InventoryCheck {
    pub fn new() -> Self {
        Self {
            warehouse: None,
            rows: Vec::new(),
            lifecycle: Lifecycle::Editing,
            last_error: None,
        }
    }

    pub fn phase(&self) -> CheckPhase {
        match self.lifecycle {
            Lifecycle::Submitted => CheckPhase::Submitted,
            Lifecycle::Discarded => CheckPhase::Discarded,
            Lifecycle::Submitting => CheckPhase::Submitting,
            Lifecycle::Editing if !self.rows.is_empty() => CheckPhase::ItemsAdded,
            Lifecycle::Editing if self.warehouse.is_some() => CheckPhase::WarehouseChosen,
            Lifecycle::Editing => CheckPhase::Empty,
        }
    }

    /// Whether the check still accepts edits.
    pub fn is_open(&self) -> bool {
        matches!(self.lifecycle, Lifecycle::Editing | Lifecycle::Submitting)
    }

    pub fn warehouse(&self) -> Option<&Warehouse> {
        self.warehouse.as_ref()
    }

    pub fn warehouse_id(&self) -> Option<&str> {
        self.warehouse.as_ref().map(|w| w.id.as_str())
    }

    pub fn rows(&self) -> &[CheckRow] {
        &self.rows
    }

    pub fn row(&self, key: RowKey) -> Option<&CheckRow> {
        self.rows.iter().find(|row| row.key == key)
    }

    /// Error from the most recent failed submission, cleared on the next attempt.
    pub fn last_error(&self) -> Option<&WorkflowError> {
        self.last_error.as_ref()
    }

    pub fn summary(&self) -> VarianceSummary {
        VarianceSummary::from_rows(&self.rows)
    }

    pub fn choose_warehouse(&mut self, warehouse: Warehouse) -> bool {
        if !self.accepts_edits("choose warehouse") {
            return false;
        }
        self.warehouse = Some(warehouse);
        true
    }

    pub fn clear_warehouse(&mut self) {
        if self.accepts_edits("clear warehouse") {
            self.warehouse = None;
        }
    }

    /// Append rows after the existing ones. Returns how many were added.
    pub fn append_rows(&mut self, rows: Vec<CheckRow>) -> usize {
        if !self.accepts_edits("append rows") {
            return 0;
        }
        let added = rows.len();
        self.rows.extend(rows);
        added
    }

    /// Append a row whose product is still to be chosen.
    pub fn add_blank_row(&mut self) -> Option<RowKey> {
        if !self.accepts_edits("add blank row") {
            return None;
        }
        let row = CheckRow::blank();
        let key = row.key;
        self.rows.push(row);
        Some(key)
    }

    /// Point an existing row at `product`, replacing its stock snapshot.
    pub fn assign_product(&mut self, key: RowKey, product: &Product, system_quantity: i64) -> bool {
        if !self.accepts_edits("assign product") {
            return false;
        }
        match self.rows.iter_mut().find(|row| row.key == key) {
            Some(row) => {
                row.product_id = Some(product.id.clone());
                row.product_name = Some(product.name.clone());
                row.system_quantity = system_quantity;
                true
            }
            None => false,
        }
    }

    /// Remove the row with `key`; absent keys are ignored.
    pub fn remove_row(&mut self, key: RowKey) -> bool {
        if !self.accepts_edits("remove row") {
            return false;
        }
        let before = self.rows.len();
        self.rows.retain(|row| row.key != key);
        before != self.rows.len()
    }

    /// Set the counted quantity. Any value is stored as given; a cleared input
    /// counts as zero.
    pub fn edit_actual_quantity(&mut self, key: RowKey, value: Option<i64>) -> bool {
        if !self.accepts_edits("edit quantity") {
            return false;
        }
        match self.rows.iter_mut().find(|row| row.key == key) {
            Some(row) => {
                row.actual_quantity = value.unwrap_or(0);
                true
            }
            None => false,
        }
    }

    /// Validate without changing state.
    pub fn submission_payload(&self) -> Result<InventoryCheckPayload, WorkflowError> {
        build_payload(self.warehouse_id(), &self.rows)
    }

    /// Enter `Submitting` and hand back the payload to send.
    ///
    /// Fails while another submission is outstanding, after the check was
    /// closed, or when validation fails; in each case state is unchanged.
    pub fn begin_submission(&mut self) -> Result<InventoryCheckPayload, WorkflowError> {
        match self.lifecycle {
            Lifecycle::Submitting => return Err(WorkflowError::SubmissionInFlight),
            Lifecycle::Submitted | Lifecycle::Discarded => {
                return Err(WorkflowError::CheckClosed)
            }
            Lifecycle::Editing => {}
        }

        let payload = self.submission_payload()?;
        self.lifecycle = Lifecycle::Submitting;
        self.last_error = None;
        Ok(payload)
    }

    /// Leave `Submitting`. Success drops all local state; failure keeps every
    /// row and edit and records the error.
    pub fn finish_submission(
        &mut self,
        outcome: Result<(), WorkflowError>,
    ) -> Result<(), WorkflowError> {
        if self.lifecycle != Lifecycle::Submitting {
            warn!(phase = %self.phase(), "Submission finished outside of Submitting");
        }

        match outcome {
            Ok(()) => {
                self.rows.clear();
                self.warehouse = None;
                self.lifecycle = Lifecycle::Submitted;
                Ok(())
            }
            Err(err) => {
                if self.lifecycle == Lifecycle::Submitting {
                    self.lifecycle = Lifecycle::Editing;
                }
                self.last_error = Some(err.clone());
                Err(err)
            }
        }
    }

    /// Drop everything; the user navigated away.
    pub fn discard(&mut self) {
        if matches!(self.lifecycle, Lifecycle::Submitted) {
            return;
        }
        self.rows.clear();
        self.warehouse = None;
        self.lifecycle = Lifecycle::Discarded;
    }

    fn accepts_edits(&self, action: &str) -> bool {
        if self.is_open() {
            true
        } else {
            debug!(action, phase = %self.phase(), "Ignoring edit on a closed inventory check");
            false
        }
    }
}
