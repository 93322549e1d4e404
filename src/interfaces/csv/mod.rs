pub mod record_reader;

use crate::domain::CustomerId;
use serde::Deserialize;

/// A row of `customers.csv`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CustomerProfile {
    pub user_id: CustomerId,
    pub name: String,
}
