//! End-to-end tests for order creation and the status state machine:
//! pricing snapshots, stock reservation/restoration, transition guards and
//! terminal states.

mod common;

use assert_matches::assert_matches;
use common::{item, order_request, TestApp};
use rust_decimal_macros::dec;
use sea_orm::EntityTrait;

use bloomshop_api::{
    entities::{order, order_item},
    errors::ServiceError,
    models::{OrderStatus, PaymentMethod, PaymentStatus},
};

#[tokio::test]
async fn on_delivery_order_snapshots_prices_and_computes_totals() {
    let app = TestApp::new().await;
    let rose = app.seed_product("Red Rose Bouquet", dec!(35.00), 10).await;
    let lily = app.seed_product("White Lily", dec!(15.50), 5).await;

    let request = order_request(vec![
        item(rose.id, 2, dec!(30.00)),
        item(lily.id, 1, dec!(15.50)),
    ]);
    let detail = app.orders.create_order(None, request).await.unwrap();

    assert_eq!(detail.order.total_amount, dec!(75.50));
    assert_eq!(detail.order.delivery_fee, dec!(0.00));
    assert_eq!(detail.order.final_amount, dec!(75.50));
    assert_eq!(detail.order.status, OrderStatus::Preparing);
    assert_eq!(detail.order.payment_status, PaymentStatus::Pending);
    assert_eq!(detail.order.user_id, None);
    assert!(detail.order.order_no.starts_with("FH"));

    // Line snapshots: catalog name, caller-supplied price, computed subtotal.
    assert_eq!(detail.items.len(), 2);
    assert_eq!(detail.items[0].product_snapshot_name, "Red Rose Bouquet");
    assert_eq!(detail.items[0].unit_price, dec!(30.00));
    assert_eq!(detail.items[0].subtotal, dec!(60.00));
    assert_eq!(detail.items[1].subtotal, dec!(15.50));

    // Stock was reserved at placement.
    assert_eq!(app.product_stock(rose.id).await, 8);
    assert_eq!(app.product_stock(lily.id).await, 4);
}

#[tokio::test]
async fn online_payment_order_starts_pending() {
    let app = TestApp::new().await;
    let rose = app.seed_product("Rose", dec!(30.00), 10).await;

    let mut request = order_request(vec![item(rose.id, 1, dec!(30.00))]);
    request.payment_method = PaymentMethod::Alipay;
    let detail = app.orders.create_order(Some(42), request).await.unwrap();

    assert_eq!(detail.order.status, OrderStatus::Pending);
    assert_eq!(detail.order.payment_status, PaymentStatus::Pending);
    assert_eq!(detail.order.user_id, Some(42));
}

#[tokio::test]
async fn unknown_product_fails_creation_without_partial_state() {
    let app = TestApp::new().await;
    let rose = app.seed_product("Rose", dec!(30.00), 10).await;

    let request = order_request(vec![
        item(rose.id, 1, dec!(30.00)),
        item(9999, 1, dec!(10.00)),
    ]);
    let err = app.orders.create_order(None, request).await.unwrap_err();
    assert_matches!(err, ServiceError::NotFound(_));

    // Nothing persisted: no orders, no items, stock untouched.
    assert_eq!(order::Entity::find().all(&*app.db).await.unwrap().len(), 0);
    assert_eq!(
        order_item::Entity::find().all(&*app.db).await.unwrap().len(),
        0
    );
    assert_eq!(app.product_stock(rose.id).await, 10);
}

#[tokio::test]
async fn insufficient_stock_fails_creation_and_rolls_back_earlier_lines() {
    let app = TestApp::new().await;
    let rose = app.seed_product("Rose", dec!(30.00), 10).await;
    let lily = app.seed_product("Lily", dec!(15.50), 2).await;

    let request = order_request(vec![
        item(rose.id, 3, dec!(30.00)),
        item(lily.id, 5, dec!(15.50)),
    ]);
    let err = app.orders.create_order(None, request).await.unwrap_err();
    assert_matches!(err, ServiceError::InsufficientStock(_));

    // The first line's decrement rolled back with the transaction.
    assert_eq!(app.product_stock(rose.id).await, 10);
    assert_eq!(app.product_stock(lily.id).await, 2);
}

#[tokio::test]
async fn creation_rejects_malformed_requests() {
    let app = TestApp::new().await;
    let rose = app.seed_product("Rose", dec!(30.00), 10).await;

    // Empty line list.
    let err = app
        .orders
        .create_order(None, order_request(vec![]))
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::ValidationError(_));

    // Bad phone pattern.
    let mut request = order_request(vec![item(rose.id, 1, dec!(30.00))]);
    request.recipient_phone = "12345".to_string();
    let err = app.orders.create_order(None, request).await.unwrap_err();
    assert_matches!(err, ServiceError::ValidationError(_));

    // Zero price line.
    let request = order_request(vec![item(rose.id, 1, dec!(0.00))]);
    let err = app.orders.create_order(None, request).await.unwrap_err();
    assert_matches!(err, ServiceError::ValidationError(_));

    // Non-positive quantity.
    let request = order_request(vec![item(rose.id, 0, dec!(30.00))]);
    let err = app.orders.create_order(None, request).await.unwrap_err();
    assert_matches!(err, ServiceError::ValidationError(_));
}

#[tokio::test]
async fn confirm_moves_pending_to_preparing_exactly_once() {
    let app = TestApp::new().await;
    let rose = app.seed_product("Rose", dec!(30.00), 10).await;

    let mut request = order_request(vec![item(rose.id, 1, dec!(30.00))]);
    request.payment_method = PaymentMethod::Wechat;
    let detail = app.orders.create_order(None, request).await.unwrap();
    assert_eq!(detail.order.status, OrderStatus::Pending);

    let confirmed = app.orders.confirm_order(detail.order.id).await.unwrap();
    assert_eq!(confirmed.status, OrderStatus::Preparing);

    // Second confirm fails the guard and leaves the order unchanged.
    let err = app.orders.confirm_order(detail.order.id).await.unwrap_err();
    assert_matches!(
        err,
        ServiceError::InvalidStateTransition {
            current: OrderStatus::Preparing,
            ..
        }
    );
    let reloaded = app.queries.detail(detail.order.id).await.unwrap();
    assert_eq!(reloaded.order.status, OrderStatus::Preparing);
}

#[tokio::test]
async fn full_flow_reaches_completed_and_marks_paid() {
    let app = TestApp::new().await;
    let rose = app.seed_product("Rose", dec!(30.00), 10).await;

    let detail = app
        .orders
        .create_order(None, order_request(vec![item(rose.id, 2, dec!(30.00))]))
        .await
        .unwrap();
    let id = detail.order.id;

    // On-delivery orders start in Preparing; drive them to the end.
    let delivering = app.orders.start_delivery(id).await.unwrap();
    assert_eq!(delivering.status, OrderStatus::Delivering);

    let completed = app.orders.complete_order(id).await.unwrap();
    assert_eq!(completed.status, OrderStatus::Completed);
    assert_eq!(completed.payment_status, PaymentStatus::Paid);

    // Completion does not touch stock.
    assert_eq!(app.product_stock(rose.id).await, 8);
}

#[tokio::test]
async fn cancel_restores_stock_and_appends_reason() {
    let app = TestApp::new().await;
    let rose = app.seed_product("Rose", dec!(30.00), 10).await;
    let lily = app.seed_product("Lily", dec!(15.50), 5).await;

    let detail = app
        .orders
        .create_order(
            None,
            order_request(vec![item(rose.id, 2, dec!(30.00)), item(lily.id, 1, dec!(15.50))]),
        )
        .await
        .unwrap();
    assert_eq!(app.product_stock(rose.id).await, 8);
    assert_eq!(app.product_stock(lily.id).await, 4);

    let cancelled = app
        .orders
        .cancel_order(detail.order.id, Some("customer changed mind".to_string()))
        .await
        .unwrap();
    assert_eq!(cancelled.status, OrderStatus::Cancelled);
    assert!(cancelled
        .notes
        .as_deref()
        .unwrap()
        .contains("customer changed mind"));

    // Stock conservation: back to exactly the pre-creation level.
    assert_eq!(app.product_stock(rose.id).await, 10);
    assert_eq!(app.product_stock(lily.id).await, 5);
}

#[tokio::test]
async fn cancel_is_rejected_once_dispatched_or_terminal() {
    let app = TestApp::new().await;
    let rose = app.seed_product("Rose", dec!(30.00), 10).await;

    let detail = app
        .orders
        .create_order(None, order_request(vec![item(rose.id, 1, dec!(30.00))]))
        .await
        .unwrap();
    let id = detail.order.id;
    app.orders.start_delivery(id).await.unwrap();

    // Physically committed once dispatched.
    let err = app.orders.cancel_order(id, None).await.unwrap_err();
    assert_matches!(
        err,
        ServiceError::InvalidStateTransition {
            current: OrderStatus::Delivering,
            ..
        }
    );

    app.orders.complete_order(id).await.unwrap();
    let err = app.orders.cancel_order(id, None).await.unwrap_err();
    assert_matches!(
        err,
        ServiceError::InvalidStateTransition {
            current: OrderStatus::Completed,
            ..
        }
    );

    // Stock stays reserved on the non-cancelled path.
    assert_eq!(app.product_stock(rose.id).await, 9);
}

#[tokio::test]
async fn terminal_orders_reject_every_transition() {
    let app = TestApp::new().await;
    let rose = app.seed_product("Rose", dec!(30.00), 10).await;

    let detail = app
        .orders
        .create_order(None, order_request(vec![item(rose.id, 1, dec!(30.00))]))
        .await
        .unwrap();
    let id = detail.order.id;
    app.orders.cancel_order(id, None).await.unwrap();

    assert_matches!(
        app.orders.confirm_order(id).await.unwrap_err(),
        ServiceError::InvalidStateTransition { .. }
    );
    assert_matches!(
        app.orders.start_delivery(id).await.unwrap_err(),
        ServiceError::InvalidStateTransition { .. }
    );
    assert_matches!(
        app.orders.complete_order(id).await.unwrap_err(),
        ServiceError::InvalidStateTransition { .. }
    );
    assert_matches!(
        app.orders.cancel_order(id, None).await.unwrap_err(),
        ServiceError::InvalidStateTransition { .. }
    );
}

#[tokio::test]
async fn line_items_link_back_to_their_catalog_product() {
    use sea_orm::ModelTrait;

    let app = TestApp::new().await;
    let rose = app.seed_product("Rose", dec!(30.00), 10).await;

    let detail = app
        .orders
        .create_order(None, order_request(vec![item(rose.id, 1, dec!(30.00))]))
        .await
        .unwrap();

    let linked = detail.items[0]
        .find_related(bloomshop_api::entities::product::Entity)
        .one(&*app.db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(linked.id, rose.id);
    assert_eq!(linked.name, "Rose");
}

#[tokio::test]
async fn transitions_against_missing_orders_are_not_found() {
    let app = TestApp::new().await;
    assert_matches!(
        app.orders.confirm_order(404).await.unwrap_err(),
        ServiceError::NotFound(_)
    );
    assert_matches!(
        app.orders.cancel_order(404, None).await.unwrap_err(),
        ServiceError::NotFound(_)
    );
}

#[tokio::test]
async fn detail_read_is_idempotent_and_invariants_hold() {
    let app = TestApp::new().await;
    let rose = app.seed_product("Rose", dec!(30.00), 10).await;
    let lily = app.seed_product("Lily", dec!(15.50), 5).await;

    let created = app
        .orders
        .create_order(
            Some(7),
            order_request(vec![item(rose.id, 2, dec!(30.00)), item(lily.id, 3, dec!(15.50))]),
        )
        .await
        .unwrap();

    let first = app.queries.detail(created.order.id).await.unwrap();
    let second = app.queries.detail(created.order.id).await.unwrap();
    assert_eq!(first.order, second.order);
    assert_eq!(first.items, second.items);

    // Money invariants on the persisted rows.
    let items_total: rust_decimal::Decimal = first.items.iter().map(|i| i.subtotal).sum();
    assert_eq!(first.order.total_amount, items_total);
    assert_eq!(
        first.order.final_amount,
        first.order.total_amount + first.order.delivery_fee
    );
    for line in &first.items {
        assert_eq!(
            line.subtotal,
            line.unit_price * rust_decimal::Decimal::from(line.quantity)
        );
        assert!(line.quantity >= 1);
    }
}
