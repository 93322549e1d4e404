use crate::domain::OrderId;
use crate::domain::ports::TaxLineStoreBox;
use crate::domain::tax::TaxTotals;
use crate::error::Result;
use std::collections::HashSet;

/// Sums per-dish tax line items of a set of orders into GST and PST totals.
pub struct TaxAggregator {
    tax_lines: TaxLineStoreBox,
}

impl TaxAggregator {
    pub fn new(tax_lines: TaxLineStoreBox) -> Self {
        Self { tax_lines }
    }

    /// Calculates the tax totals of `order_ids`.
    ///
    /// An empty set returns zero totals without touching the store. Fetch
    /// failures are returned unchanged; nothing is zeroed on error.
    pub async fn calculate_taxes(&self, order_ids: &HashSet<OrderId>) -> Result<TaxTotals> {
        if order_ids.is_empty() {
            return Ok(TaxTotals::ZERO);
        }

        let items = self.tax_lines.fetch_tax_lines(order_ids).await?;

        let mut totals = TaxTotals::ZERO;
        let mut ignored = 0usize;
        for item in &items {
            if !totals.accumulate(item)? {
                ignored += 1;
            }
        }
        if ignored > 0 {
            tracing::debug!(ignored, "skipped tax lines with unknown category");
        }

        Ok(totals)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::money::Money;
    use crate::domain::ports::TaxLineStore;
    use crate::domain::tax::TaxLineItem;
    use crate::error::SettlementError;
    use async_trait::async_trait;
    use rust_decimal_macros::dec;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FixedTaxLines {
        items: Vec<TaxLineItem>,
        fetches: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl TaxLineStore for FixedTaxLines {
        async fn fetch_tax_lines(&self, order_ids: &HashSet<OrderId>) -> Result<Vec<TaxLineItem>> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            Ok(self
                .items
                .iter()
                .filter(|item| order_ids.contains(&item.order_id))
                .cloned()
                .collect())
        }
    }

    struct UnreachableTaxLines;

    #[async_trait]
    impl TaxLineStore for UnreachableTaxLines {
        async fn fetch_tax_lines(&self, _order_ids: &HashSet<OrderId>) -> Result<Vec<TaxLineItem>> {
            Err(SettlementError::DataFetch("connection refused".to_string()))
        }
    }

    fn line(order_id: OrderId, system_tax_id: u32, amount: Money) -> TaxLineItem {
        TaxLineItem {
            order_id,
            dish_id: order_id * 10,
            system_tax_id,
            amount,
        }
    }

    fn aggregator(items: Vec<TaxLineItem>) -> (TaxAggregator, Arc<AtomicUsize>) {
        let fetches = Arc::new(AtomicUsize::new(0));
        let store = FixedTaxLines {
            items,
            fetches: fetches.clone(),
        };
        (TaxAggregator::new(Box::new(store)), fetches)
    }

    #[tokio::test]
    async fn test_empty_order_set_skips_fetch() {
        let (aggregator, fetches) = aggregator(vec![line(1, 1, Money::new(dec!(100)))]);

        let totals = aggregator.calculate_taxes(&HashSet::new()).await.unwrap();

        assert_eq!(totals, TaxTotals::ZERO);
        assert_eq!(fetches.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_category_classification() {
        let (aggregator, fetches) = aggregator(vec![
            line(1, 1, Money::new(dec!(100))),
            line(2, 2, Money::new(dec!(50))),
            line(3, 3, Money::new(dec!(20))),
            line(4, 99, Money::new(dec!(10))),
        ]);

        let ids: HashSet<OrderId> = [1, 2, 3, 4].into_iter().collect();
        let totals = aggregator.calculate_taxes(&ids).await.unwrap();

        assert_eq!(totals.gst_total, Money::new(dec!(5.00)));
        assert_eq!(totals.pst_total, Money::new(dec!(6.40)));
        assert_eq!(fetches.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_decimal_exactness() {
        let (aggregator, _) = aggregator(vec![
            line(1, 1, Money::new(dec!(0.01))),
            line(2, 1, Money::new(dec!(0.01))),
            line(3, 1, Money::new(dec!(0.01))),
        ]);

        let ids: HashSet<OrderId> = [1, 2, 3].into_iter().collect();
        let totals = aggregator.calculate_taxes(&ids).await.unwrap();

        assert_eq!(totals.gst_total.value().to_string(), "0.0015");
        assert_eq!(totals.pst_total, Money::ZERO);
    }

    #[tokio::test]
    async fn test_multiple_categories_on_one_dish() {
        let (aggregator, _) = aggregator(vec![
            line(1, 1, Money::new(dec!(12.00))),
            line(1, 2, Money::new(dec!(12.00))),
        ]);

        let ids: HashSet<OrderId> = [1].into_iter().collect();
        let totals = aggregator.calculate_taxes(&ids).await.unwrap();

        assert_eq!(totals.gst_total, Money::new(dec!(0.60)));
        assert_eq!(totals.pst_total, Money::new(dec!(1.20)));
    }

    #[tokio::test]
    async fn test_fetch_failure_propagates() {
        let aggregator = TaxAggregator::new(Box::new(UnreachableTaxLines));

        let ids: HashSet<OrderId> = [1].into_iter().collect();
        let result = aggregator.calculate_taxes(&ids).await;

        assert!(matches!(result, Err(SettlementError::DataFetch(_))));
    }
}
