use super::tax_aggregator::TaxAggregator;
use crate::domain::bill::PeriodBill;
use crate::domain::order::OrderLine;
use crate::domain::ports::{
    DirectoryStoreBox, OrderStoreBox, PeriodBillStoreBox, StoreInfo, TaxLineStoreBox,
};
use crate::domain::settlement::{SettlementRecord, compute_settlement};
use crate::domain::{OrderId, StoreId};
use crate::error::{Result, SettlementError};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;

/// A computed settlement together with what a renderer needs to lay it out.
#[derive(Debug, Clone, Serialize)]
pub struct SettlementReport {
    pub store: StoreInfo,
    pub record: SettlementRecord,
    pub orders: Vec<OrderLine>,
}

/// One bill of a batch run that could not be settled.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchFailure {
    pub store_id: StoreId,
    pub bill_id: Option<u64>,
    pub message: String,
}

/// Outcome of settling every pending bill.
#[derive(Debug, Default)]
pub struct BatchSummary {
    pub settled: Vec<SettlementReport>,
    /// Stores with a pending bill but no store record.
    pub skipped: Vec<StoreId>,
    pub failures: Vec<BatchFailure>,
}

/// The entry point for settlement runs.
///
/// `SettlementEngine` owns the storage ports. Each computation fetches fresh
/// records, runs strictly in order (orders, taxes, settlement) and shares no
/// mutable state with other computations, so one engine can serve concurrent
/// calls.
pub struct SettlementEngine {
    orders: OrderStoreBox,
    bills: PeriodBillStoreBox,
    directory: DirectoryStoreBox,
    tax_aggregator: TaxAggregator,
}

impl SettlementEngine {
    /// Creates a new `SettlementEngine`.
    ///
    /// # Arguments
    ///
    /// * `orders` - Source of completed orders.
    /// * `bills` - Source of period bills.
    /// * `tax_lines` - Source of per-dish tax line items.
    /// * `directory` - Store and customer metadata.
    pub fn new(
        orders: OrderStoreBox,
        bills: PeriodBillStoreBox,
        tax_lines: TaxLineStoreBox,
        directory: DirectoryStoreBox,
    ) -> Self {
        Self {
            orders,
            bills,
            directory,
            tax_aggregator: TaxAggregator::new(tax_lines),
        }
    }

    /// The bill of `store_id` covering `date`. `Ok(None)` when no period covers it.
    pub async fn find_period_bill(&self, store_id: StoreId, date: NaiveDate) -> Result<Option<PeriodBill>> {
        self.bills.fetch_period_bill(store_id, date).await
    }

    /// Settles the period of `store_id` that contains `date`.
    pub async fn settle_for_date(&self, store_id: StoreId, date: NaiveDate) -> Result<SettlementReport> {
        let store = self.store(store_id).await?;

        let bill = self.find_period_bill(store_id, date).await?.ok_or_else(|| {
            SettlementError::NotFound(format!(
                "No weekly bill found for store {store_id} including date {date}"
            ))
        })?;
        tracing::info!(
            store_id,
            start = %bill.period.start_date,
            end = %bill.period.end_date,
            "found weekly bill"
        );

        self.settle_bill(store, &bill).await
    }

    /// Settles one bill: fetches its orders, names their customers, aggregates
    /// their taxes and computes the settlement record.
    pub async fn settle_bill(&self, store: StoreInfo, bill: &PeriodBill) -> Result<SettlementReport> {
        let orders = self
            .orders
            .fetch_orders(bill.store_id, bill.period.start_date, bill.period.end_date)
            .await?;
        tracing::info!(store_id = bill.store_id, orders = orders.len(), "fetched orders");

        let order_ids: HashSet<OrderId> = orders.iter().map(|order| order.id).collect();
        let tax_totals = self.tax_aggregator.calculate_taxes(&order_ids).await?;

        let record = compute_settlement(bill, &orders, tax_totals)?;
        if record.has_negative_gst_split() {
            tracing::warn!(
                store_id = record.store_id,
                declared_tax = %record.declared_tax.value(),
                pst_total = %record.pst_total.value(),
                gst_total = %record.gst_total.value(),
                "declared product tax is smaller than the PST component"
            );
        }

        let mut lines = Vec::with_capacity(orders.len());
        for order in orders {
            let customer_name = self
                .directory
                .customer_name(order.user_id)
                .await?
                .unwrap_or_default();
            lines.push(OrderLine {
                order,
                customer_name,
            });
        }

        Ok(SettlementReport {
            store,
            record,
            orders: lines,
        })
    }

    /// Contact address statements for `store_id` are sent to.
    pub async fn contact_email(&self, store_id: StoreId) -> Result<String> {
        self.store(store_id)
            .await?
            .contact_email
            .filter(|email| !email.trim().is_empty())
            .ok_or_else(|| {
                SettlementError::NotFound(format!("No contact email found for store {store_id}"))
            })
    }

    /// Settles every pending bill, one task per bill.
    ///
    /// A bill that fails is logged and recorded in the summary; the rest of
    /// the run continues. Only failing to list the pending bills aborts it.
    pub async fn settle_pending(self: Arc<Self>) -> Result<BatchSummary> {
        let bills = self.bills.fetch_pending_bills().await?;
        tracing::info!(count = bills.len(), "found bills to process");

        let mut handles = Vec::with_capacity(bills.len());
        for bill in bills {
            let engine = Arc::clone(&self);
            let (store_id, bill_id) = (bill.store_id, bill.id);
            let handle = tokio::spawn(async move { engine.settle_pending_bill(bill).await });
            handles.push((store_id, bill_id, handle));
        }

        let mut summary = BatchSummary::default();
        for (store_id, bill_id, handle) in handles {
            let outcome = match handle.await {
                Ok(outcome) => outcome,
                Err(e) => {
                    tracing::error!(store_id, ?bill_id, error = %e, "settlement task aborted");
                    summary.failures.push(BatchFailure {
                        store_id,
                        bill_id,
                        message: format!("settlement task aborted: {e}"),
                    });
                    continue;
                }
            };
            match outcome {
                Ok(Some(report)) => summary.settled.push(report),
                Ok(None) => summary.skipped.push(store_id),
                Err(e) => {
                    tracing::error!(store_id, ?bill_id, error = %e, "failed to settle bill");
                    summary.failures.push(BatchFailure {
                        store_id,
                        bill_id,
                        message: e.to_string(),
                    });
                }
            }
        }

        summary.settled.sort_by_key(|report| report.record.store_id);
        summary.skipped.sort_unstable();
        tracing::info!(
            settled = summary.settled.len(),
            skipped = summary.skipped.len(),
            failed = summary.failures.len(),
            "batch finished"
        );
        Ok(summary)
    }

    async fn settle_pending_bill(&self, bill: PeriodBill) -> Result<Option<SettlementReport>> {
        let Some(store) = self.directory.store_info(bill.store_id).await? else {
            tracing::warn!(store_id = bill.store_id, "store info not found, skipping bill");
            return Ok(None);
        };
        self.settle_bill(store, &bill).await.map(Some)
    }

    async fn store(&self, store_id: StoreId) -> Result<StoreInfo> {
        self.directory
            .store_info(store_id)
            .await?
            .ok_or_else(|| SettlementError::NotFound(format!("Store with id {store_id} not found")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::money::Money;
    use crate::domain::order::{COMPLETED_STATE, Order};
    use crate::domain::ports::OrderStore;
    use crate::domain::tax::{OrderDish, OrderDishTax};
    use crate::infrastructure::in_memory::InMemoryLedger;
    use async_trait::async_trait;
    use rust_decimal_macros::dec;
    use serde_json::{Value, json};

    fn engine(ledger: &InMemoryLedger) -> SettlementEngine {
        SettlementEngine::new(
            Box::new(ledger.clone()),
            Box::new(ledger.clone()),
            Box::new(ledger.clone()),
            Box::new(ledger.clone()),
        )
    }

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2023, 1, day).unwrap()
    }

    fn bill(value: Value) -> PeriodBill {
        let Value::Object(row) = value else {
            panic!("bill row must be an object");
        };
        PeriodBill::from_row(&row).unwrap()
    }

    fn order(id: OrderId, store_id: StoreId, user_id: u64, day: u32) -> Order {
        Order {
            id,
            store_id,
            user_id,
            created_at: date(day).and_hms_opt(12, 0, 0).unwrap(),
            pickup_code: format!("P{id}"),
            store_total_fee: Money::new(dec!(25.00)),
            tip_fee: Money::ZERO,
            refund_amount: Money::ZERO,
            payment_method: 7,
            channel: 2,
            state: COMPLETED_STATE,
        }
    }

    fn store(id: StoreId) -> StoreInfo {
        StoreInfo {
            id,
            name: format!("Store {id}"),
            address: "1 Harbour Rd".into(),
            contact_email: Some(format!("owner{id}@example.com")),
        }
    }

    async fn seeded_ledger() -> InMemoryLedger {
        let ledger = InMemoryLedger::new();
        ledger.insert_store(store(1)).await;
        ledger.insert_customer(10, "Ada".into()).await;
        ledger
            .insert_bill(bill(json!({
                "id": 1,
                "store_id": 1,
                "start_date": "2023-01-01",
                "end_date": "2023-01-07",
                "original_price": 1200.00,
                "discount_fee": 50.00,
                "refund_amount": 150.00,
                "product_tax_fee": 80.00,
                "commission_fee": 60.00,
                "refund_commission_fee": 10.00,
                "asset_balance_repayment": 20.00,
                "extra_fee": 5.00,
                "settlement_amount": 1000.00,
            })))
            .await;
        ledger.insert_order(order(1, 1, 10, 2)).await;
        ledger.insert_order(order(2, 1, 11, 3)).await;
        ledger.insert_order(order(3, 1, 10, 8)).await; // next period
        ledger
            .insert_dish(OrderDish {
                order_id: 1,
                dish_id: 1,
                amount: Money::new(dec!(100)),
            })
            .await;
        ledger
            .insert_dish_tax(OrderDishTax {
                order_id: 1,
                dish_id: 1,
                system_tax_id: 2,
            })
            .await;
        ledger
    }

    #[tokio::test]
    async fn test_settle_for_date() {
        let ledger = seeded_ledger().await;
        let engine = engine(&ledger);

        let report = engine.settle_for_date(1, date(4)).await.unwrap();
        let record = &report.record;

        assert_eq!(record.total_orders, 2);
        assert_eq!(record.unique_users, 2);
        assert_eq!(record.total_revenue, Money::new(dec!(1000.00)));
        assert_eq!(record.pst_total, Money::new(dec!(10.00)));
        assert_eq!(record.gst_total, Money::new(dec!(70.00)));
        assert_eq!(record.additional_charge, Money::new(dec!(-65.00)));
        assert_eq!(report.orders[0].customer_name, "Ada");
        assert_eq!(report.orders[1].customer_name, "");
    }

    #[tokio::test]
    async fn test_no_period_for_date() {
        let ledger = seeded_ledger().await;
        let engine = engine(&ledger);

        assert!(engine.find_period_bill(1, date(4)).await.unwrap().is_some());
        assert!(engine.find_period_bill(1, date(8)).await.unwrap().is_none());

        let result = engine.settle_for_date(1, date(8)).await;
        assert!(matches!(result, Err(SettlementError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_unknown_store() {
        let ledger = seeded_ledger().await;
        let engine = engine(&ledger);

        let result = engine.settle_for_date(42, date(4)).await;
        assert!(matches!(result, Err(SettlementError::NotFound(_))));
        assert!(matches!(
            engine.contact_email(42).await,
            Err(SettlementError::NotFound(_))
        ));
        assert_eq!(engine.contact_email(1).await.unwrap(), "owner1@example.com");
    }

    struct FlakyOrders {
        inner: InMemoryLedger,
        broken_store: StoreId,
    }

    #[async_trait]
    impl OrderStore for FlakyOrders {
        async fn fetch_orders(&self, store_id: StoreId, start: NaiveDate, end: NaiveDate) -> Result<Vec<Order>> {
            if store_id == self.broken_store {
                return Err(SettlementError::DataFetch("lost connection".into()));
            }
            self.inner.fetch_orders(store_id, start, end).await
        }
    }

    #[tokio::test]
    async fn test_batch_isolates_failures() {
        let ledger = seeded_ledger().await;
        ledger.insert_store(store(2)).await;
        for store_id in [2, 3] {
            ledger
                .insert_bill(bill(json!({
                    "store_id": store_id,
                    "start_date": "2023-01-01",
                    "end_date": "2023-01-07",
                    "settlement_amount": "12.00",
                })))
                .await;
        }
        // Settled already; not pending.
        ledger
            .insert_bill(bill(json!({
                "store_id": 1,
                "start_date": "2023-01-08",
                "end_date": "2023-01-14",
                "settlement_amount": 0,
            })))
            .await;

        let engine = Arc::new(SettlementEngine::new(
            Box::new(FlakyOrders {
                inner: ledger.clone(),
                broken_store: 2,
            }),
            Box::new(ledger.clone()),
            Box::new(ledger.clone()),
            Box::new(ledger.clone()),
        ));

        let summary = engine.settle_pending().await.unwrap();

        assert_eq!(summary.settled.len(), 1);
        assert_eq!(summary.settled[0].record.store_id, 1);
        assert_eq!(summary.skipped, vec![3]);
        assert_eq!(summary.failures.len(), 1);
        assert_eq!(summary.failures[0].store_id, 2);
        assert!(summary.failures[0].message.contains("lost connection"));
    }

    struct PanickingOrders {
        inner: InMemoryLedger,
        broken_store: StoreId,
    }

    #[async_trait]
    impl OrderStore for PanickingOrders {
        async fn fetch_orders(&self, store_id: StoreId, start: NaiveDate, end: NaiveDate) -> Result<Vec<Order>> {
            if store_id == self.broken_store {
                panic!("order store invariant violated");
            }
            self.inner.fetch_orders(store_id, start, end).await
        }
    }

    #[tokio::test]
    async fn test_batch_reports_aborted_task() {
        let ledger = seeded_ledger().await;
        ledger.insert_store(store(2)).await;
        ledger
            .insert_bill(bill(json!({
                "store_id": 2,
                "start_date": "2023-01-01",
                "end_date": "2023-01-07",
                "settlement_amount": "12.00",
            })))
            .await;

        let engine = Arc::new(SettlementEngine::new(
            Box::new(PanickingOrders {
                inner: ledger.clone(),
                broken_store: 2,
            }),
            Box::new(ledger.clone()),
            Box::new(ledger.clone()),
            Box::new(ledger.clone()),
        ));

        let summary = engine.settle_pending().await.unwrap();

        assert_eq!(summary.settled.len(), 1);
        assert_eq!(summary.failures.len(), 1);
        assert_eq!(summary.failures[0].store_id, 2);
        assert!(summary.failures[0].message.starts_with("settlement task aborted"));
        assert!(!summary.failures[0].message.contains("Data fetch"));
    }
}
