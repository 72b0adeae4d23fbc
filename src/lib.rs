//! Bloomshop API
//!
//! Order lifecycle and inventory-consistency engine for a retail flower
//! storefront: order creation with price snapshotting, the status state
//! machine, stock reservation/restoration, and the paginated order views.
#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod migrator;
pub mod models;
pub mod openapi;
pub mod order_number;
pub mod services;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Json, Router,
};
use sea_orm::DatabaseConnection;
use serde::Serialize;
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};
use utoipa::{OpenApi, ToSchema};

/// Shared application state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: config::AppConfig,
    pub services: handlers::AppServices,
}

/// Envelope for every successful JSON response.
#[derive(Debug, Serialize, ToSchema)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            message: Some(message),
        }
    }
}

/// One page of records plus enough bookkeeping for callers to compute page
/// counts.
#[derive(Debug, Serialize, ToSchema)]
pub struct PaginatedResponse<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u64,
    pub size: u64,
    pub total_pages: u64,
}

pub fn api_v1_routes() -> Router<AppState> {
    Router::new()
        .route("/orders", post(handlers::orders::create_order))
        .route("/orders/search", get(handlers::orders::search_orders))
        .route("/orders/by-phone", get(handlers::orders::get_orders_by_phone))
        .route(
            "/orders/by-user/{user_id}",
            get(handlers::orders::get_orders_by_user),
        )
        .route("/orders/{id}", get(handlers::orders::get_order_detail))
        .route("/orders/{id}/confirm", post(handlers::orders::confirm_order))
        .route("/orders/{id}/deliver", post(handlers::orders::start_delivery))
        .route(
            "/orders/{id}/complete",
            post(handlers::orders::complete_order),
        )
        .route("/orders/{id}/cancel", post(handlers::orders::cancel_order))
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(openapi::ApiDoc::openapi())
}

/// Assembles the full application router with middleware layers.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/openapi.json", get(openapi_json))
        .nest("/api/v1", api_v1_routes())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .layer(CompressionLayer::new())
        .with_state(state)
}
