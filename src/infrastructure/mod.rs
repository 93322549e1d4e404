//! Storage adapters implementing the domain ports.

pub mod dataset;
pub mod in_memory;
