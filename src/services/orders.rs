//! Order Lifecycle Engine: creation with price/name snapshotting, the
//! status state machine, and the stock effects tied to both.
//!
//! Every read-then-write path runs inside a single database transaction
//! with an exclusive lock on the order row, so two racing transitions on
//! the same order linearize and the loser observes the guard failure.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::{
    ActiveModelTrait, DatabaseConnection, DatabaseTransaction, EntityTrait, ModelTrait,
    QuerySelect, Set, SqlErr, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    entities::order::{self, Entity as OrderEntity, Model as OrderModel},
    entities::order_item::{self, Entity as OrderItemEntity, Model as OrderItemModel},
    errors::ServiceError,
    events::{Event, EventSender},
    models::{OrderStatus, PaymentMethod, PaymentStatus},
    order_number,
    services::catalog::CatalogService,
};

/// Bounded retries for order-number collisions before surfacing `Conflict`.
const ORDER_NO_MAX_ATTEMPTS: u32 = 3;

const MIN_LINE_PRICE: Decimal = dec!(0.01);

lazy_static::lazy_static! {
    static ref PHONE_RE: regex::Regex = regex::Regex::new(r"^1[3-9]\d{9}$").unwrap();
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateOrderRequest {
    #[validate(length(min = 1, message = "recipient name is required"))]
    pub recipient_name: String,

    #[validate(regex(path = "PHONE_RE", message = "invalid mobile number"))]
    pub recipient_phone: String,

    #[validate(length(min = 1, message = "recipient address is required"))]
    pub recipient_address: String,

    pub delivery_date: Option<NaiveDate>,
    pub delivery_time: Option<NaiveTime>,

    pub card_content: Option<String>,
    pub card_sender: Option<String>,

    pub payment_method: PaymentMethod,

    #[validate(length(min = 1, message = "order must contain at least one item"))]
    pub items: Vec<CreateOrderItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreateOrderItem {
    pub product_id: i64,
    pub quantity: i32,
    /// Caller-supplied unit price, snapshotted as-is (documented trust
    /// boundary: no server-side re-pricing).
    pub price: Decimal,
}

/// An order with its line items eagerly attached.
#[derive(Debug, Clone, Serialize)]
pub struct OrderDetail {
    pub order: OrderModel,
    pub items: Vec<OrderItemModel>,
}

/// Service driving order creation and the status state machine.
#[derive(Clone)]
pub struct OrderService {
    db: Arc<DatabaseConnection>,
    catalog: CatalogService,
    event_sender: Option<Arc<EventSender>>,
}

impl OrderService {
    pub fn new(
        db: Arc<DatabaseConnection>,
        catalog: CatalogService,
        event_sender: Option<Arc<EventSender>>,
    ) -> Self {
        Self {
            db,
            catalog,
            event_sender,
        }
    }

    /// Creates an order and its line items in one unit of work.
    ///
    /// The caller's identity arrives as an explicit parameter (`None` for
    /// guest orders) rather than being read from ambient state. Stock is
    /// reserved at placement: each line decrements its product's stock
    /// inside the creation transaction, symmetric with restoration on
    /// cancel.
    #[instrument(skip(self, request), fields(user_id = ?user_id, phone = %request.recipient_phone))]
    pub async fn create_order(
        &self,
        user_id: Option<i64>,
        request: CreateOrderRequest,
    ) -> Result<OrderDetail, ServiceError> {
        request.validate()?;
        validate_items(&request.items)?;

        let delivery_time = combine_delivery_time(request.delivery_date, request.delivery_time);
        let total_amount: Decimal = request
            .items
            .iter()
            .map(|item| item.price * Decimal::from(item.quantity))
            .sum();
        let delivery_fee = Decimal::ZERO;

        // Collect-on-delivery orders skip the payment wait.
        let initial_status = match request.payment_method {
            PaymentMethod::OnDelivery => OrderStatus::Preparing,
            _ => OrderStatus::Pending,
        };

        let mut attempt = 0;
        loop {
            attempt += 1;
            let order_no = order_number::generate();

            let txn = self.db.begin().await?;
            let result = self
                .insert_order_graph(
                    &txn,
                    user_id,
                    &request,
                    &order_no,
                    initial_status,
                    total_amount,
                    delivery_fee,
                    delivery_time,
                )
                .await;

            match result {
                Ok(detail) => {
                    txn.commit().await?;
                    info!(
                        order_id = detail.order.id,
                        order_no = %detail.order.order_no,
                        total = %detail.order.total_amount,
                        "order created"
                    );
                    self.emit(Event::OrderCreated {
                        order_id: detail.order.id,
                        order_no: detail.order.order_no.clone(),
                    })
                    .await;
                    return Ok(detail);
                }
                Err(e) if is_unique_violation(&e) => {
                    txn.rollback().await?;
                    if attempt >= ORDER_NO_MAX_ATTEMPTS {
                        return Err(ServiceError::Conflict(format!(
                            "order number collision persisted after {attempt} attempts"
                        )));
                    }
                    warn!(%order_no, attempt, "order number collision, regenerating");
                }
                Err(e) => {
                    txn.rollback().await?;
                    return Err(e);
                }
            }
        }
    }

    /// Confirm: `Pending → Preparing`.
    #[instrument(skip(self))]
    pub async fn confirm_order(&self, order_id: i64) -> Result<OrderModel, ServiceError> {
        self.apply_transition(order_id, "confirm", OrderStatus::Preparing, false)
            .await
    }

    /// Start delivery: `Preparing → Delivering`.
    #[instrument(skip(self))]
    pub async fn start_delivery(&self, order_id: i64) -> Result<OrderModel, ServiceError> {
        self.apply_transition(order_id, "start delivery of", OrderStatus::Delivering, false)
            .await
    }

    /// Complete: `Delivering → Completed`; payment status flips to `Paid`.
    #[instrument(skip(self))]
    pub async fn complete_order(&self, order_id: i64) -> Result<OrderModel, ServiceError> {
        let updated = self
            .apply_transition(order_id, "complete", OrderStatus::Completed, true)
            .await?;
        self.emit(Event::OrderCompleted { order_id }).await;
        Ok(updated)
    }

    /// Cancel: allowed from `Pending` and `Preparing` only. Restores stock
    /// for every line item and appends the reason to the order notes, all
    /// inside one transaction; a failure on any line rolls everything back.
    #[instrument(skip(self, reason))]
    pub async fn cancel_order(
        &self,
        order_id: i64,
        reason: Option<String>,
    ) -> Result<OrderModel, ServiceError> {
        let txn = self.db.begin().await?;
        let order = self.load_locked(&txn, order_id).await?;
        let current = order.status;

        if !current.can_transition_to(OrderStatus::Cancelled) {
            return Err(ServiceError::InvalidStateTransition {
                operation: "cancel",
                current,
            });
        }

        let items = order.find_related(OrderItemEntity).all(&txn).await?;
        for item in &items {
            self.catalog
                .increase_stock(&txn, item.product_id, item.quantity)
                .await?;
        }

        let notes = append_cancel_reason(order.notes.clone(), reason.as_deref());
        let mut active: order::ActiveModel = order.into();
        active.status = Set(OrderStatus::Cancelled);
        active.notes = Set(notes);
        let updated = active.update(&txn).await?;
        txn.commit().await?;

        info!(order_id, from = %current, lines = items.len(), "order cancelled, stock restored");
        self.emit(Event::OrderStatusChanged {
            order_id,
            old_status: current,
            new_status: OrderStatus::Cancelled,
        })
        .await;
        self.emit(Event::OrderCancelled { order_id }).await;

        Ok(updated)
    }

    /// Shared guard-check-then-update for the side-effect-free transitions.
    async fn apply_transition(
        &self,
        order_id: i64,
        operation: &'static str,
        target: OrderStatus,
        mark_paid: bool,
    ) -> Result<OrderModel, ServiceError> {
        let txn = self.db.begin().await?;
        let order = self.load_locked(&txn, order_id).await?;
        let current = order.status;

        // Re-read under the lock: a racing transition that committed first
        // is visible here, so the loser fails the guard instead of double
        // applying.
        if !current.can_transition_to(target) {
            return Err(ServiceError::InvalidStateTransition { operation, current });
        }

        let mut active: order::ActiveModel = order.into();
        active.status = Set(target);
        if mark_paid {
            active.payment_status = Set(PaymentStatus::Paid);
        }
        let updated = active.update(&txn).await?;
        txn.commit().await?;

        info!(order_id, from = %current, to = %target, "order status updated");
        self.emit(Event::OrderStatusChanged {
            order_id,
            old_status: current,
            new_status: target,
        })
        .await;

        Ok(updated)
    }

    async fn load_locked(
        &self,
        txn: &DatabaseTransaction,
        order_id: i64,
    ) -> Result<OrderModel, ServiceError> {
        OrderEntity::find_by_id(order_id)
            .lock_exclusive()
            .one(txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("order {order_id} not found")))
    }

    #[allow(clippy::too_many_arguments)]
    async fn insert_order_graph(
        &self,
        txn: &DatabaseTransaction,
        user_id: Option<i64>,
        request: &CreateOrderRequest,
        order_no: &str,
        initial_status: OrderStatus,
        total_amount: Decimal,
        delivery_fee: Decimal,
        delivery_time: Option<DateTime<Utc>>,
    ) -> Result<OrderDetail, ServiceError> {
        let order_active = order::ActiveModel {
            order_no: Set(order_no.to_string()),
            user_id: Set(user_id),
            customer_name: Set(request.recipient_name.clone()),
            customer_phone: Set(request.recipient_phone.clone()),
            total_amount: Set(total_amount),
            delivery_fee: Set(delivery_fee),
            final_amount: Set(total_amount + delivery_fee),
            status: Set(initial_status),
            payment_method: Set(request.payment_method),
            payment_status: Set(PaymentStatus::Pending),
            notes: Set(Some(request.recipient_address.clone())),
            card_content: Set(request.card_content.clone()),
            card_sender: Set(request.card_sender.clone()),
            delivery_time: Set(delivery_time),
            ..Default::default()
        };
        let order_model = order_active.insert(txn).await?;

        let mut items = Vec::with_capacity(request.items.len());
        for line in &request.items {
            // Missing product fails the whole creation; nothing persists.
            let product = self.catalog.get_product(txn, line.product_id).await?;
            self.catalog
                .decrease_stock(txn, line.product_id, line.quantity)
                .await?;

            let item_active = order_item::ActiveModel {
                order_id: Set(order_model.id),
                product_id: Set(product.id),
                product_snapshot_name: Set(product.name.clone()),
                unit_price: Set(line.price),
                quantity: Set(line.quantity),
                subtotal: Set(line.price * Decimal::from(line.quantity)),
                ..Default::default()
            };
            items.push(item_active.insert(txn).await?);
        }

        Ok(OrderDetail {
            order: order_model,
            items,
        })
    }

    /// Best-effort event emission after commit; never fails the request.
    async fn emit(&self, event: Event) {
        if let Some(sender) = &self.event_sender {
            if let Err(e) = sender.send(event).await {
                warn!(error = %e, "failed to send order event");
            }
        }
    }
}

fn validate_items(items: &[CreateOrderItem]) -> Result<(), ServiceError> {
    for (index, item) in items.iter().enumerate() {
        if item.quantity < 1 {
            return Err(ServiceError::ValidationError(format!(
                "items[{index}].quantity must be at least 1"
            )));
        }
        if item.price < MIN_LINE_PRICE {
            return Err(ServiceError::ValidationError(format!(
                "items[{index}].price must be at least 0.01"
            )));
        }
    }
    Ok(())
}

fn combine_delivery_time(
    date: Option<NaiveDate>,
    time: Option<NaiveTime>,
) -> Option<DateTime<Utc>> {
    match (date, time) {
        (Some(d), Some(t)) => Some(Utc.from_utc_datetime(&d.and_time(t))),
        _ => None,
    }
}

fn append_cancel_reason(notes: Option<String>, reason: Option<&str>) -> Option<String> {
    match reason {
        None => notes,
        Some(r) => match notes {
            Some(existing) => Some(format!("{existing} | cancelled: {r}")),
            None => Some(format!("cancelled: {r}")),
        },
    }
}

fn is_unique_violation(err: &ServiceError) -> bool {
    matches!(
        err,
        ServiceError::DatabaseError(db_err)
            if matches!(db_err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
    )
}
