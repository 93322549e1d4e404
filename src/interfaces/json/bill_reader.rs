use crate::domain::bill::PeriodBill;
use crate::error::{Result, SettlementError};
use serde_json::Value;
use std::io::Read;

/// Reads period bills from a JSON array of loosely typed objects.
///
/// Bills are kept as JSON rather than CSV because their columns arrive with
/// mixed types (integers, floats, decimal strings, free text) and the
/// distinction matters when normalizing them.
pub struct BillReader {
    rows: Vec<Value>,
}

impl BillReader {
    /// Parses the whole document. Fails only when it is not a JSON array.
    pub fn from_reader<R: Read>(source: R) -> Result<Self> {
        match serde_json::from_reader::<_, Value>(source)? {
            Value::Array(rows) => Ok(Self { rows }),
            other => Err(SettlementError::Validation(format!(
                "bills document must be an array, got {}",
                type_name(&other)
            ))),
        }
    }

    /// Normalizes each row; a bad row yields an error without stopping the rest.
    pub fn bills(self) -> impl Iterator<Item = Result<PeriodBill>> {
        self.rows.into_iter().map(|row| match row {
            Value::Object(map) => PeriodBill::from_row(&map),
            other => Err(SettlementError::Validation(format!(
                "bill row must be an object, got {}",
                type_name(&other)
            ))),
        })
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
