//! Application layer orchestrating a settlement run.
//!
//! [`engine::SettlementEngine`] resolves the period, fetches orders, delegates
//! tax aggregation to [`tax_aggregator::TaxAggregator`] and computes the
//! settlement record. Batch runs settle every pending bill on its own task.

pub mod engine;
pub mod tax_aggregator;
