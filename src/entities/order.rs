use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveValue, Set};
use serde::{Deserialize, Serialize};

use crate::models::{OrderStatus, PaymentMethod, PaymentStatus};

/// One purchase transaction. Mutated only by status/payment transitions and
/// note appends; never physically removed.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "orders")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    /// Externally visible, time-derived identifier (e.g. `FH20250612143015321`).
    #[sea_orm(unique)]
    pub order_no: String,

    /// Owning user; `None` for guest orders.
    pub user_id: Option<i64>,

    pub customer_name: String,

    /// Always recorded, even for registered users, to serve phone lookups.
    pub customer_phone: String,

    /// Sum of line-item subtotals, computed at creation.
    pub total_amount: Decimal,
    pub delivery_fee: Decimal,
    /// `total_amount + delivery_fee`.
    pub final_amount: Decimal,

    pub status: OrderStatus,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,

    /// Delivery address and any appended cancellation reason.
    pub notes: Option<String>,
    pub card_content: Option<String>,
    pub card_sender: Option<String>,
    pub delivery_time: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::order_item::Entity")]
    OrderItem,
}

impl Related<super::order_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::OrderItem.def()
    }
}

#[async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C>(self, _db: &C, insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        let mut active_model = self;
        let now = Utc::now();

        if insert {
            if let ActiveValue::NotSet = active_model.created_at {
                active_model.created_at = Set(now);
            }
        }
        active_model.updated_at = Set(now);

        Ok(active_model)
    }
}
