use super::money::Money;
use super::{CustomerId, OrderId, StoreId};
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// State code of an order that has been fulfilled and paid.
pub const COMPLETED_STATE: u32 = 5000;
/// Payment method code for cash; cash orders are settled at the counter.
pub const CASH_PAYMENT_METHOD: u32 = 1;

/// A customer order as stored. Read-only to the settlement pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub store_id: StoreId,
    pub user_id: CustomerId,
    pub created_at: NaiveDateTime,
    #[serde(default)]
    pub pickup_code: String,
    /// Gross amount charged to the customer on behalf of the store.
    pub store_total_fee: Money,
    #[serde(default)]
    pub tip_fee: Money,
    #[serde(default)]
    pub refund_amount: Money,
    pub payment_method: u32,
    pub channel: u32,
    pub state: u32,
}

impl Order {
    pub fn created_on(&self) -> NaiveDate {
        self.created_at.date()
    }
}

/// Which orders count towards a store's settlement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderFilter {
    pub completed_state: u32,
    pub cash_payment_method: u32,
}

impl Default for OrderFilter {
    fn default() -> Self {
        Self {
            completed_state: COMPLETED_STATE,
            cash_payment_method: CASH_PAYMENT_METHOD,
        }
    }
}

impl OrderFilter {
    /// Completed, non-cash, belonging to `store_id`, created within `[start, end]`
    /// (whole days, both ends inclusive).
    pub fn matches(&self, order: &Order, store_id: StoreId, start: NaiveDate, end: NaiveDate) -> bool {
        order.store_id == store_id
            && order.state == self.completed_state
            && order.payment_method != self.cash_payment_method
            && (start..=end).contains(&order.created_on())
    }
}

/// An order enriched with the customer's display name for rendering.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderLine {
    #[serde(flatten)]
    pub order: Order,
    pub customer_name: String,
}

/// Number of distinct customers across `orders`.
pub fn unique_customers(orders: &[Order]) -> usize {
    orders
        .iter()
        .map(|order| order.user_id)
        .collect::<HashSet<_>>()
        .len()
}
