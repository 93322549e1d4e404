use super::in_memory::InMemoryLedger;
use crate::domain::order::{Order, OrderFilter};
use crate::domain::ports::StoreInfo;
use crate::domain::tax::{OrderDish, OrderDishTax};
use crate::error::Result;
use crate::interfaces::csv::CustomerProfile;
use crate::interfaces::csv::record_reader::RecordReader;
use crate::interfaces::json::bill_reader::BillReader;
use serde::de::DeserializeOwned;
use std::fs::File;
use std::path::Path;

pub const STORES_FILE: &str = "stores.csv";
pub const CUSTOMERS_FILE: &str = "customers.csv";
pub const ORDERS_FILE: &str = "orders.csv";
pub const DISHES_FILE: &str = "order_dishes.csv";
pub const DISH_TAXES_FILE: &str = "order_dish_taxes.csv";
pub const BILLS_FILE: &str = "bills.json";

/// Loads a dataset directory into an [`InMemoryLedger`].
///
/// Stores, orders and bills are required; customers, dishes and dish taxes
/// are optional. Rows that fail to parse are logged and skipped.
pub async fn load_dataset(dir: &Path, order_filter: OrderFilter) -> Result<InMemoryLedger> {
    let ledger = InMemoryLedger::with_order_filter(order_filter);

    for store in read_rows::<StoreInfo>(&dir.join(STORES_FILE), true)? {
        ledger.insert_store(store).await;
    }
    for profile in read_rows::<CustomerProfile>(&dir.join(CUSTOMERS_FILE), false)? {
        ledger.insert_customer(profile.user_id, profile.name).await;
    }
    for order in read_rows::<Order>(&dir.join(ORDERS_FILE), true)? {
        ledger.insert_order(order).await;
    }
    for dish in read_rows::<OrderDish>(&dir.join(DISHES_FILE), false)? {
        ledger.insert_dish(dish).await;
    }
    for tax in read_rows::<OrderDishTax>(&dir.join(DISH_TAXES_FILE), false)? {
        ledger.insert_dish_tax(tax).await;
    }

    let bills_path = dir.join(BILLS_FILE);
    let reader = BillReader::from_reader(File::open(&bills_path)?)?;
    for (index, bill) in reader.bills().enumerate() {
        match bill {
            Ok(bill) => ledger.insert_bill(bill).await,
            Err(e) => tracing::warn!(file = %bills_path.display(), row = index, error = %e, "Error reading bill"),
        }
    }

    Ok(ledger)
}

fn read_rows<T: DeserializeOwned>(path: &Path, required: bool) -> Result<Vec<T>> {
    if !required && !path.exists() {
        tracing::debug!(file = %path.display(), "optional dataset file missing");
        return Ok(Vec::new());
    }

    let reader = RecordReader::new(File::open(path)?);
    let mut rows = Vec::new();
    for row in reader.records::<T>() {
        match row {
            Ok(row) => rows.push(row),
            Err(e) => tracing::warn!(file = %path.display(), error = %e, "Error reading row"),
        }
    }
    tracing::debug!(file = %path.display(), rows = rows.len(), "loaded dataset file");
    Ok(rows)
}
