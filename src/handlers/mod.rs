pub mod health;
pub mod orders;

use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::events::EventSender;
use crate::services::{
    catalog::CatalogService, order_queries::OrderQueryService, orders::OrderService,
};

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Business services used by the HTTP handlers.
#[derive(Clone)]
pub struct AppServices {
    pub orders: Arc<OrderService>,
    pub order_queries: Arc<OrderQueryService>,
}

impl AppServices {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Option<Arc<EventSender>>) -> Self {
        let catalog = CatalogService::new();
        Self {
            orders: Arc::new(OrderService::new(db.clone(), catalog, event_sender)),
            order_queries: Arc::new(OrderQueryService::new(db)),
        }
    }
}
