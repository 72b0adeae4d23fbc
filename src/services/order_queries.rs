//! Order Query Service: the paginated/filterable read paths behind both the
//! customer-facing and staff-facing order views.

use std::sync::Arc;

use chrono::NaiveDate;
use sea_orm::{
    ColumnTrait, Condition, DatabaseConnection, EntityTrait, ModelTrait, Order as SortOrder,
    PaginatorTrait, QueryFilter, QueryOrder,
};
use tracing::instrument;

use crate::{
    entities::order::{self, Entity as OrderEntity, Model as OrderModel},
    entities::order_item::Entity as OrderItemEntity,
    errors::ServiceError,
    models::OrderStatus,
    services::orders::OrderDetail,
};

/// One page of orders plus the total match count, so callers can compute
/// page counts. An out-of-range page yields an empty record list with the
/// same total.
#[derive(Debug, Clone)]
pub struct OrderPage {
    pub records: Vec<OrderModel>,
    pub total: u64,
    pub page: u64,
    pub size: u64,
}

/// Staff-side search filters. All fields optional; dates are inclusive and
/// apply to `created_at`.
#[derive(Debug, Clone, Default)]
pub struct OrderSearchFilter {
    pub keyword: Option<String>,
    pub status: Option<OrderStatus>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
}

#[derive(Clone)]
pub struct OrderQueryService {
    db: Arc<DatabaseConnection>,
}

impl OrderQueryService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Orders owned by a registered user, newest first.
    #[instrument(skip(self))]
    pub async fn by_user(
        &self,
        user_id: i64,
        status: Option<OrderStatus>,
        page: u64,
        size: u64,
    ) -> Result<OrderPage, ServiceError> {
        let mut query = OrderEntity::find().filter(order::Column::UserId.eq(user_id));
        if let Some(status) = status {
            query = query.filter(order::Column::Status.eq(status));
        }
        self.paginate(
            query
                .order_by_desc(order::Column::CreatedAt)
                .order_by_desc(order::Column::Id),
            page,
            size,
        )
        .await
    }

    /// Orders by exact customer phone, newest first. Serves guest and
    /// registered lookups alike since phone is always recorded.
    #[instrument(skip(self))]
    pub async fn by_phone(
        &self,
        phone: &str,
        status: Option<OrderStatus>,
        page: u64,
        size: u64,
    ) -> Result<OrderPage, ServiceError> {
        let mut query = OrderEntity::find().filter(order::Column::CustomerPhone.eq(phone));
        if let Some(status) = status {
            query = query.filter(order::Column::Status.eq(status));
        }
        self.paginate(
            query
                .order_by_desc(order::Column::CreatedAt)
                .order_by_desc(order::Column::Id),
            page,
            size,
        )
        .await
    }

    /// Staff search: keyword over order number / customer name / phone,
    /// optional status and inclusive date range, caller-selectable sort
    /// restricted to an allow-list.
    #[instrument(skip(self, filter))]
    pub async fn search(
        &self,
        filter: OrderSearchFilter,
        page: u64,
        size: u64,
    ) -> Result<OrderPage, ServiceError> {
        let mut query = OrderEntity::find();

        if let Some(keyword) = filter.keyword.as_deref().filter(|k| !k.trim().is_empty()) {
            let keyword = keyword.trim();
            query = query.filter(
                Condition::any()
                    .add(order::Column::OrderNo.contains(keyword))
                    .add(order::Column::CustomerName.contains(keyword))
                    .add(order::Column::CustomerPhone.contains(keyword)),
            );
        }
        if let Some(status) = filter.status {
            query = query.filter(order::Column::Status.eq(status));
        }
        if let Some(start) = filter.start_date {
            let from = start.and_hms_opt(0, 0, 0).ok_or_else(|| {
                ServiceError::InternalError("invalid start of day".to_string())
            })?;
            query = query.filter(order::Column::CreatedAt.gte(from.and_utc()));
        }
        if let Some(end) = filter.end_date {
            // Inclusive end: everything strictly before the next midnight.
            let next_day = end.succ_opt().ok_or_else(|| {
                ServiceError::ValidationError("end date out of range".to_string())
            })?;
            let until = next_day.and_hms_opt(0, 0, 0).ok_or_else(|| {
                ServiceError::InternalError("invalid start of day".to_string())
            })?;
            query = query.filter(order::Column::CreatedAt.lt(until.and_utc()));
        }

        let sort_column = sort_column(filter.sort_by.as_deref());
        let direction = match filter.sort_order.as_deref() {
            Some(order) if order.eq_ignore_ascii_case("asc") => SortOrder::Asc,
            _ => SortOrder::Desc,
        };
        // Id as a secondary key keeps same-instant rows in a stable order.
        self.paginate(
            query
                .order_by(sort_column, direction)
                .order_by_desc(order::Column::Id),
            page,
            size,
        )
        .await
    }

    /// Single-order detail with line items eagerly attached. Read-only and
    /// idempotent.
    #[instrument(skip(self))]
    pub async fn detail(&self, order_id: i64) -> Result<OrderDetail, ServiceError> {
        let order = OrderEntity::find_by_id(order_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("order {order_id} not found")))?;
        let items = order.find_related(OrderItemEntity).all(&*self.db).await?;
        Ok(OrderDetail { order, items })
    }

    async fn paginate(
        &self,
        query: sea_orm::Select<OrderEntity>,
        page: u64,
        size: u64,
    ) -> Result<OrderPage, ServiceError> {
        let page = page.max(1);
        let size = size.max(1);
        let paginator = query.paginate(&*self.db, size);
        let total = paginator.num_items().await?;
        let records = paginator.fetch_page(page - 1).await?;
        Ok(OrderPage {
            records,
            total,
            page,
            size,
        })
    }
}

/// Sort fields are an allow-list; anything else falls back to creation time.
fn sort_column(sort_by: Option<&str>) -> order::Column {
    match sort_by {
        Some("total_amount") => order::Column::TotalAmount,
        Some("final_amount") => order::Column::FinalAmount,
        Some("order_no") => order::Column::OrderNo,
        _ => order::Column::CreatedAt,
    }
}
