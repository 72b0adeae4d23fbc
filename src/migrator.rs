use sea_orm::Schema;
use sea_orm_migration::prelude::*;

use crate::entities;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![Box::new(m20250101_000001_create_core_tables::Migration)]
    }
}

mod m20250101_000001_create_core_tables {
    use super::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250101_000001_create_core_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        // Tables are derived straight from the entity definitions so the
        // schema cannot drift from the models.
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            let schema = Schema::new(manager.get_database_backend());

            let mut products = schema.create_table_from_entity(entities::product::Entity);
            manager.create_table(products.if_not_exists().to_owned()).await?;

            let mut orders = schema.create_table_from_entity(entities::order::Entity);
            manager.create_table(orders.if_not_exists().to_owned()).await?;

            let mut order_items = schema.create_table_from_entity(entities::order_item::Entity);
            manager
                .create_table(order_items.if_not_exists().to_owned())
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_orders_customer_phone")
                        .table(entities::order::Entity)
                        .col(entities::order::Column::CustomerPhone)
                        .to_owned(),
                )
                .await?;
            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_order_items_order_id")
                        .table(entities::order_item::Entity)
                        .col(entities::order_item::Column::OrderId)
                        .to_owned(),
                )
                .await?;

            Ok(())
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(
                    Table::drop()
                        .table(entities::order_item::Entity)
                        .to_owned(),
                )
                .await?;
            manager
                .drop_table(Table::drop().table(entities::order::Entity).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(entities::product::Entity).to_owned())
                .await?;
            Ok(())
        }
    }
}
