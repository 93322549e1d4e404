use crate::domain::bill::{PeriodBill, resolve_period};
use crate::domain::money::Money;
use crate::domain::order::{Order, OrderFilter};
use crate::domain::ports::{DirectoryStore, OrderStore, PeriodBillStore, StoreInfo, TaxLineStore};
use crate::domain::tax::{OrderDish, OrderDishTax, TaxLineItem};
use crate::domain::{CustomerId, DishId, OrderId, StoreId};
use crate::error::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Default)]
struct LedgerTables {
    stores: HashMap<StoreId, StoreInfo>,
    customers: HashMap<CustomerId, String>,
    orders: Vec<Order>,
    dishes: HashMap<(OrderId, DishId), Money>,
    dish_taxes: Vec<OrderDishTax>,
    bills: Vec<PeriodBill>,
}

/// A thread-safe in-memory ledger backing every storage port.
///
/// Uses `Arc<RwLock<..>>` so clones share the same tables; hand one clone to
/// each port of the engine. Suited to tests and to datasets loaded from files.
#[derive(Default, Clone)]
pub struct InMemoryLedger {
    tables: Arc<RwLock<LedgerTables>>,
    order_filter: OrderFilter,
}

impl InMemoryLedger {
    /// Creates a new, empty ledger using the default order filter.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_order_filter(order_filter: OrderFilter) -> Self {
        Self {
            tables: Arc::default(),
            order_filter,
        }
    }

    pub async fn insert_store(&self, store: StoreInfo) {
        self.tables.write().await.stores.insert(store.id, store);
    }

    pub async fn insert_customer(&self, user_id: CustomerId, name: String) {
        self.tables.write().await.customers.insert(user_id, name);
    }

    pub async fn insert_order(&self, order: Order) {
        self.tables.write().await.orders.push(order);
    }

    pub async fn insert_dish(&self, dish: OrderDish) {
        self.tables
            .write()
            .await
            .dishes
            .insert((dish.order_id, dish.dish_id), dish.amount);
    }

    pub async fn insert_dish_tax(&self, tax: OrderDishTax) {
        self.tables.write().await.dish_taxes.push(tax);
    }

    pub async fn insert_bill(&self, bill: PeriodBill) {
        self.tables.write().await.bills.push(bill);
    }
}

#[async_trait]
impl OrderStore for InMemoryLedger {
    async fn fetch_orders(&self, store_id: StoreId, start: NaiveDate, end: NaiveDate) -> Result<Vec<Order>> {
        let tables = self.tables.read().await;
        let mut orders: Vec<Order> = tables
            .orders
            .iter()
            .filter(|order| self.order_filter.matches(order, store_id, start, end))
            .cloned()
            .collect();
        orders.sort_by_key(|order| order.created_at);
        Ok(orders)
    }
}

#[async_trait]
impl PeriodBillStore for InMemoryLedger {
    async fn fetch_period_bill(&self, store_id: StoreId, date: NaiveDate) -> Result<Option<PeriodBill>> {
        let tables = self.tables.read().await;
        Ok(resolve_period(&tables.bills, store_id, date).cloned())
    }

    async fn fetch_pending_bills(&self) -> Result<Vec<PeriodBill>> {
        let tables = self.tables.read().await;
        Ok(tables
            .bills
            .iter()
            .filter(|bill| bill.is_pending())
            .cloned()
            .collect())
    }
}

#[async_trait]
impl TaxLineStore for InMemoryLedger {
    async fn fetch_tax_lines(&self, order_ids: &HashSet<OrderId>) -> Result<Vec<TaxLineItem>> {
        let tables = self.tables.read().await;
        // Inner join: a tax row without its dish carries no amount and is dropped.
        Ok(tables
            .dish_taxes
            .iter()
            .filter(|tax| order_ids.contains(&tax.order_id))
            .filter_map(|tax| {
                tables
                    .dishes
                    .get(&(tax.order_id, tax.dish_id))
                    .map(|amount| TaxLineItem {
                        order_id: tax.order_id,
                        dish_id: tax.dish_id,
                        system_tax_id: tax.system_tax_id,
                        amount: *amount,
                    })
            })
            .collect())
    }
}

#[async_trait]
impl DirectoryStore for InMemoryLedger {
    async fn store_info(&self, store_id: StoreId) -> Result<Option<StoreInfo>> {
        let tables = self.tables.read().await;
        Ok(tables.stores.get(&store_id).cloned())
    }

    async fn customer_name(&self, user_id: CustomerId) -> Result<Option<String>> {
        let tables = self.tables.read().await;
        Ok(tables.customers.get(&user_id).cloned())
    }
}
