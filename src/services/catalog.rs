//! Catalog Accessor: keyed access to product name, price and stock.
//!
//! Every method is generic over [`ConnectionTrait`] so stock effects join
//! the caller's transaction. The product row is the single shared mutable
//! resource this core touches; concurrent moves on the same product are
//! linearized by the row lock taken here.

use sea_orm::{ActiveModelTrait, ConnectionTrait, EntityTrait, QuerySelect, Set};
use tracing::{info, instrument};

use crate::{
    entities::product::{self, Entity as ProductEntity, Model as ProductModel},
    errors::ServiceError,
};

#[derive(Clone, Default)]
pub struct CatalogService;

impl CatalogService {
    pub fn new() -> Self {
        Self
    }

    /// Resolves an active product by id.
    pub async fn get_product<C: ConnectionTrait>(
        &self,
        conn: &C,
        product_id: i64,
    ) -> Result<ProductModel, ServiceError> {
        let product = ProductEntity::find_by_id(product_id)
            .one(conn)
            .await?
            .filter(|p| p.is_active)
            .ok_or_else(|| ServiceError::NotFound(format!("product {product_id} not found")))?;
        Ok(product)
    }

    /// Adds `quantity` back to the product's stock (order cancellation).
    #[instrument(skip(self, conn))]
    pub async fn increase_stock<C: ConnectionTrait>(
        &self,
        conn: &C,
        product_id: i64,
        quantity: i32,
    ) -> Result<ProductModel, ServiceError> {
        let product = self.locked_product(conn, product_id).await?;
        let new_quantity = product.stock_quantity + quantity;
        let updated = self.set_stock(conn, product, new_quantity).await?;
        info!(product_id, quantity, new_quantity, "stock restored");
        Ok(updated)
    }

    /// Removes `quantity` from the product's stock (order placement).
    /// Fails with `InsufficientStock` rather than letting stock go negative.
    #[instrument(skip(self, conn))]
    pub async fn decrease_stock<C: ConnectionTrait>(
        &self,
        conn: &C,
        product_id: i64,
        quantity: i32,
    ) -> Result<ProductModel, ServiceError> {
        let product = self.locked_product(conn, product_id).await?;
        if product.stock_quantity < quantity {
            return Err(ServiceError::InsufficientStock(format!(
                "product {} has {} in stock, {} requested",
                product_id, product.stock_quantity, quantity
            )));
        }
        let new_quantity = product.stock_quantity - quantity;
        let updated = self.set_stock(conn, product, new_quantity).await?;
        info!(product_id, quantity, new_quantity, "stock reserved");
        Ok(updated)
    }

    /// Re-reads the product under an exclusive row lock so concurrent stock
    /// moves on the same product linearize. The SQLite test backend ignores
    /// the lock clause; its single-writer model covers the same ground.
    async fn locked_product<C: ConnectionTrait>(
        &self,
        conn: &C,
        product_id: i64,
    ) -> Result<ProductModel, ServiceError> {
        ProductEntity::find_by_id(product_id)
            .lock_exclusive()
            .one(conn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("product {product_id} not found")))
    }

    async fn set_stock<C: ConnectionTrait>(
        &self,
        conn: &C,
        product: ProductModel,
        new_quantity: i32,
    ) -> Result<ProductModel, ServiceError> {
        let mut active: product::ActiveModel = product.into();
        active.stock_quantity = Set(new_quantity);
        Ok(active.update(conn).await?)
    }
}
