//! Validation and submission of a finished count.

use tracing::{error, info};

use crate::errors::WorkflowError;
use crate::models::{CheckRow, InventoryCheckPayload};
use crate::services::CheckLedger;

/// Validate the count and flatten it into the creation request.
///
/// Checks run in order: a warehouse must be chosen, then at least one row must
/// have a resolved product. Rows without a product are left out silently.
pub fn build_payload(
    warehouse_id: Option<&str>,
    rows: &[CheckRow],
) -> Result<InventoryCheckPayload, WorkflowError> {
    let warehouse_id = warehouse_id
        .filter(|id| !id.trim().is_empty())
        .ok_or(WorkflowError::MissingWarehouse)?;

    let items: Vec<_> = rows.iter().filter_map(CheckRow::to_item).collect();
    if items.is_empty() {
        return Err(WorkflowError::NoItems);
    }

    Ok(InventoryCheckPayload {
        warehouse_id: warehouse_id.to_string(),
        items,
    })
}

/// Validate and persist a count in one step. Nothing is sent when validation
/// fails, and nothing is retried when the backend rejects the request.
pub async fn submit(
    ledger: &dyn CheckLedger,
    warehouse_id: Option<&str>,
    rows: &[CheckRow],
) -> Result<(), WorkflowError> {
    let payload = build_payload(warehouse_id, rows)?;
    send_payload(ledger, &payload).await
}

pub(crate) async fn send_payload(
    ledger: &dyn CheckLedger,
    payload: &InventoryCheckPayload,
) -> Result<(), WorkflowError> {
    match ledger.create_inventory_check(payload).await {
        Ok(_) => {
            info!(
                warehouse_id = %payload.warehouse_id,
                items = payload.items.len(),
                "Inventory check submitted"
            );
            Ok(())
        }
        Err(err) => {
            error!(
                warehouse_id = %payload.warehouse_id,
                error = %err,
                "Inventory check submission rejected"
            );
            Err(WorkflowError::SubmissionFailure(err.user_message()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ApiError;
    use crate::models::Product;
    use assert_matches::assert_matches;
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingLedger {
        received: Mutex<Vec<InventoryCheckPayload>>,
        reject_with: Option<String>,
    }

    #[async_trait]
    impl CheckLedger for RecordingLedger {
        async fn create_inventory_check(
            &self,
            payload: &InventoryCheckPayload,
        ) -> Result<Value, ApiError> {
            self.received.lock().unwrap().push(payload.clone());
            match &self.reject_with {
                Some(body) => Err(ApiError::Status {
                    status: 400,
                    message: crate::errors::extract_error_message(body),
                    body: body.clone(),
                }),
                None => Ok(json!({ "id": 1 })),
            }
        }
    }

    fn counted(id: &str, system: i64, actual: i64) -> CheckRow {
        let mut row = CheckRow::for_product(&Product::new(id, id), system);
        row.actual_quantity = actual;
        row
    }

    #[test]
    fn missing_warehouse_wins_over_missing_items() {
        assert_eq!(build_payload(None, &[]), Err(WorkflowError::MissingWarehouse));
        assert_eq!(
            build_payload(Some("  "), &[counted("P1", 1, 1)]),
            Err(WorkflowError::MissingWarehouse)
        );
    }

    #[test]
    fn rows_without_product_do_not_count_as_items() {
        assert_eq!(
            build_payload(Some("W1"), &[CheckRow::blank()]),
            Err(WorkflowError::NoItems)
        );

        let payload = build_payload(Some("W1"), &[CheckRow::blank(), counted("P1", 3, 2)]).unwrap();
        assert_eq!(payload.items.len(), 1);
        assert_eq!(payload.items[0].product_id, "P1");
    }

    #[tokio::test]
    async fn validation_failure_sends_nothing() {
        let ledger = RecordingLedger::default();
        assert_matches!(
            submit(&ledger, None, &[counted("P1", 1, 1)]).await,
            Err(WorkflowError::MissingWarehouse)
        );
        assert!(ledger.received.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn rejection_message_is_extracted() {
        let ledger = RecordingLedger {
            reject_with: Some(r#"{"message":["items.0.actualQuantity must not be less than 0","warehouse closed"]}"#.into()),
            ..Default::default()
        };

        let err = submit(&ledger, Some("W1"), &[counted("P1", 1, -1)])
            .await
            .unwrap_err();
        assert_eq!(
            err,
            WorkflowError::SubmissionFailure(
                "items.0.actualQuantity must not be less than 0, warehouse closed".into()
            )
        );
        assert_eq!(ledger.received.lock().unwrap().len(), 1);
    }
}
