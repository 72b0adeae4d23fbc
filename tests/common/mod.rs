//! Shared harness: an in-memory SQLite database with the real migrations
//! applied, plus the wired service layer.

#![allow(dead_code)]

use std::sync::Arc;

use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, ConnectOptions, Database, DatabaseConnection, EntityTrait, Set};
use sea_orm_migration::MigratorTrait;

use bloomshop_api::{
    entities::product,
    migrator::Migrator,
    models::PaymentMethod,
    services::{
        catalog::CatalogService,
        order_queries::OrderQueryService,
        orders::{CreateOrderItem, CreateOrderRequest, OrderService},
    },
};

pub struct TestApp {
    pub db: Arc<DatabaseConnection>,
    pub orders: OrderService,
    pub queries: OrderQueryService,
    pub catalog: CatalogService,
}

impl TestApp {
    pub async fn new() -> Self {
        // A single connection keeps every handle on the same in-memory DB.
        let mut options = ConnectOptions::new("sqlite::memory:".to_owned());
        options.max_connections(1).sqlx_logging(false);
        let db = Database::connect(options).await.expect("sqlite connect");
        Migrator::up(&db, None).await.expect("migrations");

        let db = Arc::new(db);
        let catalog = CatalogService::new();
        Self {
            orders: OrderService::new(db.clone(), catalog.clone(), None),
            queries: OrderQueryService::new(db.clone()),
            catalog,
            db,
        }
    }

    pub async fn seed_product(&self, name: &str, price: Decimal, stock: i32) -> product::Model {
        product::ActiveModel {
            name: Set(name.to_string()),
            price: Set(price),
            stock_quantity: Set(stock),
            ..Default::default()
        }
        .insert(&*self.db)
        .await
        .expect("seed product")
    }

    pub async fn product_stock(&self, product_id: i64) -> i32 {
        product::Entity::find_by_id(product_id)
            .one(&*self.db)
            .await
            .expect("query product")
            .expect("product exists")
            .stock_quantity
    }
}

/// A valid on-delivery creation request for the given lines; tests tweak
/// fields from here.
pub fn order_request(items: Vec<CreateOrderItem>) -> CreateOrderRequest {
    CreateOrderRequest {
        recipient_name: "Li Hua".to_string(),
        recipient_phone: "13800000000".to_string(),
        recipient_address: "12 Rose Street".to_string(),
        delivery_date: None,
        delivery_time: None,
        card_content: None,
        card_sender: None,
        payment_method: PaymentMethod::OnDelivery,
        items,
    }
}

pub fn item(product_id: i64, quantity: i32, price: Decimal) -> CreateOrderItem {
    CreateOrderItem {
        product_id,
        quantity,
        price,
    }
}
