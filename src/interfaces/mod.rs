//! Adapters between the settlement core and the outside world: file readers
//! for the dataset and the statement renderer.

pub mod csv;
pub mod json;
pub mod statement;
