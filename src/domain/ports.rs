use super::bill::PeriodBill;
use super::order::Order;
use super::tax::TaxLineItem;
use super::{CustomerId, OrderId, StoreId};
use crate::error::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Store metadata shown on a statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreInfo {
    pub id: StoreId,
    pub name: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub contact_email: Option<String>,
}

#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Completed, non-cash orders of `store_id` created within `[start, end]`,
    /// oldest first.
    async fn fetch_orders(&self, store_id: StoreId, start: NaiveDate, end: NaiveDate) -> Result<Vec<Order>>;
}

#[async_trait]
pub trait PeriodBillStore: Send + Sync {
    /// The bill whose period contains `date`, if any.
    async fn fetch_period_bill(&self, store_id: StoreId, date: NaiveDate) -> Result<Option<PeriodBill>>;
    /// Every bill with a non-zero settlement amount.
    async fn fetch_pending_bills(&self) -> Result<Vec<PeriodBill>>;
}

#[async_trait]
pub trait TaxLineStore: Send + Sync {
    async fn fetch_tax_lines(&self, order_ids: &HashSet<OrderId>) -> Result<Vec<TaxLineItem>>;
}

#[async_trait]
pub trait DirectoryStore: Send + Sync {
    async fn store_info(&self, store_id: StoreId) -> Result<Option<StoreInfo>>;
    /// Display name of a customer; `None` when the profile is missing.
    async fn customer_name(&self, user_id: CustomerId) -> Result<Option<String>>;
}

pub type OrderStoreBox = Box<dyn OrderStore>;
pub type PeriodBillStoreBox = Box<dyn PeriodBillStore>;
pub type TaxLineStoreBox = Box<dyn TaxLineStore>;
pub type DirectoryStoreBox = Box<dyn DirectoryStore>;
