mod common;

use common::TestBackend;
use inventory_check::{
    errors::WorkflowError,
    events::{Event, EventSender},
    models::Product,
    workflow::{submit_stock_in, StockInReceipt},
};
use rust_decimal_macros::dec;
use serde_json::json;
use wiremock::{
    matchers::{body_json, method, path},
    Mock, ResponseTemplate,
};

fn receipt() -> StockInReceipt {
    let mut receipt = StockInReceipt::new();
    receipt.set_warehouse("W1");
    receipt.set_note("Supplier delivery #88");
    receipt.add_line(&Product::new("P1", "Rice"), 4, dec!(2.50));
    receipt.add_line(&Product::new("P2", "Oil"), 1, dec!(12));
    receipt
}

#[tokio::test]
async fn receipt_is_posted_with_decimal_costs() {
    let backend = TestBackend::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/stock-ins"))
        .and(body_json(json!({
            "warehouseId": "W1",
            "note": "Supplier delivery #88",
            "items": [
                { "productId": "P1", "quantity": 4, "unitCost": "2.50" },
                { "productId": "P2", "quantity": 1, "unitCost": "12" }
            ]
        })))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&backend.server)
        .await;

    let client = backend.client();
    let (events, mut rx) = EventSender::channel(4);
    let receipt = receipt();
    assert_eq!(receipt.totals().total_cost, dec!(22.00));

    let payload = submit_stock_in(&client, &receipt, Some(&events))
        .await
        .expect("stock-in accepted");
    assert_eq!(payload.items.len(), 2);

    let notice = rx.recv().await.expect("notification");
    assert_eq!(
        notice.event,
        Event::StockInSubmitted {
            warehouse_id: "W1".into(),
            item_count: 2
        }
    );
}

#[tokio::test]
async fn non_positive_quantity_is_never_sent() {
    let backend = TestBackend::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/stock-ins"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&backend.server)
        .await;

    let mut receipt = receipt();
    let key = receipt.lines()[1].key;
    receipt.update_quantity(key, 0);

    let err = submit_stock_in(&backend.client(), &receipt, None)
        .await
        .unwrap_err();
    assert_eq!(
        err,
        WorkflowError::InvalidQuantity {
            product_id: "P2".into()
        }
    );
}

#[tokio::test]
async fn backend_error_message_is_extracted() {
    let backend = TestBackend::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/stock-ins"))
        .respond_with(ResponseTemplate::new(422).set_body_json(json!({
            "error": { "message": "Warehouse W1 is archived" }
        })))
        .mount(&backend.server)
        .await;

    let err = submit_stock_in(&backend.client(), &receipt(), None)
        .await
        .unwrap_err();
    assert_eq!(
        err,
        WorkflowError::SubmissionFailure("Warehouse W1 is archived".into())
    );
}
