//! Settlement domain: money, orders, bills, taxes and the pure settlement computation.
//!
//! Nothing in here performs I/O. Storage is reached through the traits in [`ports`].

pub mod bill;
pub mod money;
pub mod order;
pub mod ports;
pub mod settlement;
pub mod tax;

pub type StoreId = u64;
pub type OrderId = u64;
pub type CustomerId = u64;
pub type DishId = u64;
