use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::{
    entities::{order, order_item},
    errors::ServiceError,
    models::{OrderStatus, PaymentMethod, PaymentStatus},
    services::order_queries::{OrderPage, OrderSearchFilter},
    services::orders::{CreateOrderRequest, OrderDetail},
    ApiResponse, AppState, PaginatedResponse,
};

fn default_page() -> u64 {
    1
}
fn default_size() -> u64 {
    10
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct StatusPageQuery {
    pub status: Option<String>,
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_size")]
    pub size: u64,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct PhoneQuery {
    pub phone: String,
    pub status: Option<String>,
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_size")]
    pub size: u64,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct SearchQuery {
    pub keyword: Option<String>,
    pub status: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_size")]
    pub size: u64,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
}

/// Creation payload. Caller identity travels in the body because auth is an
/// external collaborator; `user_id: null` is a guest order.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateOrderBody {
    pub user_id: Option<i64>,
    #[serde(flatten)]
    pub order: CreateOrderRequest,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct CancelOrderBody {
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct OrderResponse {
    pub id: i64,
    pub order_no: String,
    pub user_id: Option<i64>,
    pub customer_name: String,
    pub customer_phone: String,
    pub total_amount: Decimal,
    pub delivery_fee: Decimal,
    pub final_amount: Decimal,
    pub status: OrderStatus,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    pub notes: Option<String>,
    pub card_content: Option<String>,
    pub card_sender: Option<String>,
    pub delivery_time: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct OrderItemResponse {
    pub id: i64,
    pub product_id: i64,
    pub product_name: String,
    pub unit_price: Decimal,
    pub quantity: i32,
    pub subtotal: Decimal,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct OrderDetailResponse {
    #[serde(flatten)]
    pub order: OrderResponse,
    pub items: Vec<OrderItemResponse>,
}

fn map_order(model: order::Model) -> OrderResponse {
    OrderResponse {
        id: model.id,
        order_no: model.order_no,
        user_id: model.user_id,
        customer_name: model.customer_name,
        customer_phone: model.customer_phone,
        total_amount: model.total_amount,
        delivery_fee: model.delivery_fee,
        final_amount: model.final_amount,
        status: model.status,
        payment_method: model.payment_method,
        payment_status: model.payment_status,
        notes: model.notes,
        card_content: model.card_content,
        card_sender: model.card_sender,
        delivery_time: model.delivery_time,
        created_at: model.created_at,
        updated_at: model.updated_at,
    }
}

fn map_item(model: order_item::Model) -> OrderItemResponse {
    OrderItemResponse {
        id: model.id,
        product_id: model.product_id,
        product_name: model.product_snapshot_name,
        unit_price: model.unit_price,
        quantity: model.quantity,
        subtotal: model.subtotal,
    }
}

fn map_detail(detail: OrderDetail) -> OrderDetailResponse {
    OrderDetailResponse {
        order: map_order(detail.order),
        items: detail.items.into_iter().map(map_item).collect(),
    }
}

fn map_page(page: OrderPage) -> PaginatedResponse<OrderResponse> {
    let total_pages = page.total.div_ceil(page.size);
    PaginatedResponse {
        items: page.records.into_iter().map(map_order).collect(),
        total: page.total,
        page: page.page,
        size: page.size,
        total_pages,
    }
}

fn parse_status(status: Option<&str>) -> Result<Option<OrderStatus>, ServiceError> {
    status
        .filter(|s| !s.trim().is_empty())
        .map(OrderStatus::parse)
        .transpose()
}

/// Create a new order
#[utoipa::path(
    post,
    path = "/api/v1/orders",
    request_body = CreateOrderBody,
    responses(
        (status = 201, description = "Order created", body = ApiResponse<OrderDetailResponse>),
        (status = 400, description = "Validation error", body = crate::errors::ErrorResponse),
        (status = 404, description = "Unknown product", body = crate::errors::ErrorResponse),
        (status = 409, description = "Order number collision", body = crate::errors::ErrorResponse),
        (status = 422, description = "Insufficient stock", body = crate::errors::ErrorResponse),
    )
)]
pub async fn create_order(
    State(state): State<AppState>,
    Json(body): Json<CreateOrderBody>,
) -> Result<(StatusCode, Json<ApiResponse<OrderDetailResponse>>), ServiceError> {
    body.order.validate()?;
    let detail = state
        .services
        .orders
        .create_order(body.user_id, body.order)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(map_detail(detail))),
    ))
}

/// List a user's orders, newest first
#[utoipa::path(
    get,
    path = "/api/v1/orders/by-user/{user_id}",
    params(("user_id" = i64, Path, description = "Owning user id"), StatusPageQuery),
    responses(
        (status = 200, description = "Orders page", body = ApiResponse<PaginatedResponse<OrderResponse>>),
        (status = 400, description = "Unknown status filter", body = crate::errors::ErrorResponse),
    )
)]
pub async fn get_orders_by_user(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
    Query(query): Query<StatusPageQuery>,
) -> Result<Json<ApiResponse<PaginatedResponse<OrderResponse>>>, ServiceError> {
    let status = parse_status(query.status.as_deref())?;
    let page = state
        .services
        .order_queries
        .by_user(user_id, status, query.page, query.size)
        .await?;
    Ok(Json(ApiResponse::success(map_page(page))))
}

/// List orders by customer phone, newest first
#[utoipa::path(
    get,
    path = "/api/v1/orders/by-phone",
    params(PhoneQuery),
    responses(
        (status = 200, description = "Orders page", body = ApiResponse<PaginatedResponse<OrderResponse>>),
        (status = 400, description = "Unknown status filter", body = crate::errors::ErrorResponse),
    )
)]
pub async fn get_orders_by_phone(
    State(state): State<AppState>,
    Query(query): Query<PhoneQuery>,
) -> Result<Json<ApiResponse<PaginatedResponse<OrderResponse>>>, ServiceError> {
    let status = parse_status(query.status.as_deref())?;
    let page = state
        .services
        .order_queries
        .by_phone(&query.phone, status, query.page, query.size)
        .await?;
    Ok(Json(ApiResponse::success(map_page(page))))
}

/// Staff search across order number, customer name and phone
#[utoipa::path(
    get,
    path = "/api/v1/orders/search",
    params(SearchQuery),
    responses(
        (status = 200, description = "Orders page", body = ApiResponse<PaginatedResponse<OrderResponse>>),
        (status = 400, description = "Invalid filter", body = crate::errors::ErrorResponse),
    )
)]
pub async fn search_orders(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<ApiResponse<PaginatedResponse<OrderResponse>>>, ServiceError> {
    let filter = OrderSearchFilter {
        keyword: query.keyword,
        status: parse_status(query.status.as_deref())?,
        start_date: query.start_date,
        end_date: query.end_date,
        sort_by: query.sort_by,
        sort_order: query.sort_order,
    };
    let page = state
        .services
        .order_queries
        .search(filter, query.page, query.size)
        .await?;
    Ok(Json(ApiResponse::success(map_page(page))))
}

/// Fetch one order with its line items
#[utoipa::path(
    get,
    path = "/api/v1/orders/{id}",
    params(("id" = i64, Path, description = "Order id")),
    responses(
        (status = 200, description = "Order detail", body = ApiResponse<OrderDetailResponse>),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse),
    )
)]
pub async fn get_order_detail(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<OrderDetailResponse>>, ServiceError> {
    let detail = state.services.order_queries.detail(id).await?;
    Ok(Json(ApiResponse::success(map_detail(detail))))
}

/// Confirm a pending order
#[utoipa::path(
    post,
    path = "/api/v1/orders/{id}/confirm",
    params(("id" = i64, Path, description = "Order id")),
    responses(
        (status = 200, description = "Order confirmed", body = ApiResponse<OrderResponse>),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Invalid state transition", body = crate::errors::ErrorResponse),
    )
)]
pub async fn confirm_order(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<OrderResponse>>, ServiceError> {
    let updated = state.services.orders.confirm_order(id).await?;
    Ok(Json(ApiResponse::success(map_order(updated))))
}

/// Dispatch an order for delivery
#[utoipa::path(
    post,
    path = "/api/v1/orders/{id}/deliver",
    params(("id" = i64, Path, description = "Order id")),
    responses(
        (status = 200, description = "Delivery started", body = ApiResponse<OrderResponse>),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Invalid state transition", body = crate::errors::ErrorResponse),
    )
)]
pub async fn start_delivery(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<OrderResponse>>, ServiceError> {
    let updated = state.services.orders.start_delivery(id).await?;
    Ok(Json(ApiResponse::success(map_order(updated))))
}

/// Complete delivery and collect payment
#[utoipa::path(
    post,
    path = "/api/v1/orders/{id}/complete",
    params(("id" = i64, Path, description = "Order id")),
    responses(
        (status = 200, description = "Order completed", body = ApiResponse<OrderResponse>),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Invalid state transition", body = crate::errors::ErrorResponse),
    )
)]
pub async fn complete_order(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<OrderResponse>>, ServiceError> {
    let updated = state.services.orders.complete_order(id).await?;
    Ok(Json(ApiResponse::success(map_order(updated))))
}

/// Cancel an order and restore its stock
#[utoipa::path(
    post,
    path = "/api/v1/orders/{id}/cancel",
    params(("id" = i64, Path, description = "Order id")),
    request_body(content = CancelOrderBody, description = "Optional cancellation reason"),
    responses(
        (status = 200, description = "Order cancelled", body = ApiResponse<OrderResponse>),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Invalid state transition", body = crate::errors::ErrorResponse),
    )
)]
pub async fn cancel_order(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    body: Option<Json<CancelOrderBody>>,
) -> Result<Json<ApiResponse<OrderResponse>>, ServiceError> {
    let reason = body.and_then(|Json(b)| b.reason);
    let updated = state.services.orders.cancel_order(id, reason).await?;
    Ok(Json(ApiResponse::success(map_order(updated))))
}
