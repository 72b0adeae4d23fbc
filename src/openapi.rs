use utoipa::OpenApi;

use crate::handlers;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Bloomshop API",
        description = "Order lifecycle and inventory backend for a retail flower storefront"
    ),
    paths(
        handlers::orders::create_order,
        handlers::orders::get_orders_by_user,
        handlers::orders::get_orders_by_phone,
        handlers::orders::search_orders,
        handlers::orders::get_order_detail,
        handlers::orders::confirm_order,
        handlers::orders::start_delivery,
        handlers::orders::complete_order,
        handlers::orders::cancel_order,
        handlers::health::health_check,
    ),
    components(schemas(
        handlers::orders::CreateOrderBody,
        handlers::orders::CancelOrderBody,
        handlers::orders::OrderResponse,
        handlers::orders::OrderItemResponse,
        handlers::orders::OrderDetailResponse,
        crate::services::orders::CreateOrderRequest,
        crate::services::orders::CreateOrderItem,
        crate::models::OrderStatus,
        crate::models::PaymentMethod,
        crate::models::PaymentStatus,
        crate::errors::ErrorResponse,
    ))
)]
pub struct ApiDoc;
