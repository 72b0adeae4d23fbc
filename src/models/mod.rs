//! Closed enum types shared by the entities, services and HTTP layer.
//!
//! Status, payment method and payment status are each a single tagged enum;
//! the string representation exists only at the database and API boundary.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::errors::ServiceError;

/// Lifecycle state of an order.
///
/// `Pending → Preparing → Delivering → Completed`, with `Cancelled`
/// reachable from `Pending` and `Preparing` only. `Completed` and
/// `Cancelled` are terminal.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    strum::Display,
    utoipa::ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    #[sea_orm(string_value = "PENDING")]
    Pending,
    #[sea_orm(string_value = "PREPARING")]
    Preparing,
    #[sea_orm(string_value = "DELIVERING")]
    Delivering,
    #[sea_orm(string_value = "COMPLETED")]
    Completed,
    #[sea_orm(string_value = "CANCELLED")]
    Cancelled,
}

impl OrderStatus {
    /// Terminal states admit no further transition.
    pub fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Completed | OrderStatus::Cancelled)
    }

    /// The allowed-source table of the state machine. A transition is legal
    /// iff the current status appears in the target's source set.
    pub fn can_transition_to(self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        matches!(
            (self, next),
            (Pending, Preparing)
                | (Preparing, Delivering)
                | (Delivering, Completed)
                | (Pending, Cancelled)
                | (Preparing, Cancelled)
        )
    }

    /// Parses the external string form, rejecting unknown values.
    pub fn parse(value: &str) -> Result<Self, ServiceError> {
        match value.to_ascii_uppercase().as_str() {
            "PENDING" => Ok(OrderStatus::Pending),
            "PREPARING" => Ok(OrderStatus::Preparing),
            "DELIVERING" => Ok(OrderStatus::Delivering),
            "COMPLETED" => Ok(OrderStatus::Completed),
            "CANCELLED" | "CANCELED" => Ok(OrderStatus::Cancelled),
            other => Err(ServiceError::ValidationError(format!(
                "unknown order status: {other}"
            ))),
        }
    }
}

/// How the customer pays. `OnDelivery` orders skip the payment wait and
/// start out in `Preparing`.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    strum::Display,
    utoipa::ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    #[sea_orm(string_value = "ALIPAY")]
    Alipay,
    #[sea_orm(string_value = "WECHAT")]
    Wechat,
    #[sea_orm(string_value = "ON_DELIVERY")]
    OnDelivery,
}

/// Settlement label set by staff action, not a real payment protocol.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    strum::Display,
    utoipa::ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    #[sea_orm(string_value = "PENDING")]
    Pending,
    #[sea_orm(string_value = "PAID")]
    Paid,
    #[sea_orm(string_value = "REFUNDED")]
    Refunded,
}

#[cfg(test)]
mod tests {
    use super::OrderStatus::{self, *};
    use test_case::test_case;

    #[test_case(Pending, Preparing => true)]
    #[test_case(Preparing, Delivering => true)]
    #[test_case(Delivering, Completed => true)]
    #[test_case(Pending, Cancelled => true)]
    #[test_case(Preparing, Cancelled => true)]
    #[test_case(Pending, Delivering => false)]
    #[test_case(Pending, Completed => false)]
    #[test_case(Preparing, Completed => false)]
    #[test_case(Delivering, Cancelled => false; "no cancel once dispatched")]
    #[test_case(Completed, Cancelled => false)]
    #[test_case(Completed, Preparing => false)]
    #[test_case(Cancelled, Pending => false)]
    #[test_case(Cancelled, Preparing => false)]
    fn transition_table(from: OrderStatus, to: OrderStatus) -> bool {
        from.can_transition_to(to)
    }

    #[test]
    fn terminal_states() {
        assert!(Completed.is_terminal());
        assert!(Cancelled.is_terminal());
        assert!(!Pending.is_terminal());
        assert!(!Preparing.is_terminal());
        assert!(!Delivering.is_terminal());
    }

    #[test]
    fn parse_accepts_both_cancelled_spellings() {
        assert_eq!(OrderStatus::parse("cancelled").unwrap(), Cancelled);
        assert_eq!(OrderStatus::parse("CANCELED").unwrap(), Cancelled);
        assert!(OrderStatus::parse("SHIPPED").is_err());
    }

    #[test]
    fn display_matches_wire_form() {
        assert_eq!(Pending.to_string(), "PENDING");
        assert_eq!(Delivering.to_string(), "DELIVERING");
    }
}
