use crate::domain::order::OrderFilter;

/// Orders listed per detail page of a statement.
pub const DEFAULT_ORDERS_PER_PAGE: usize = 40;

/// Runtime knobs of a settlement run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SettlementConfig {
    pub order_filter: OrderFilter,
    pub orders_per_page: usize,
}

impl Default for SettlementConfig {
    fn default() -> Self {
        Self {
            order_filter: OrderFilter::default(),
            orders_per_page: DEFAULT_ORDERS_PER_PAGE,
        }
    }
}
