pub mod catalog;
pub mod order_queries;
pub mod orders;
