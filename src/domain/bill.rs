use super::StoreId;
use super::money::{Money, coerce_decimal};
use crate::error::{Result, SettlementError};
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// A bill row exactly as it comes out of storage: column name to loosely typed value.
pub type BillRow = Map<String, Value>;

/// Canonical key of the service package (asset balance repayment) slot.
pub const SERVICE_PACKAGE_FEE: &str = "service_package_fee";
/// Alternate key some callers use for the same slot.
pub const ASSET_BALANCE_REPAYMENT: &str = "asset_balance_repayment";

const ID: &str = "id";
const STORE_ID: &str = "store_id";
const START_DATE: &str = "start_date";
const END_DATE: &str = "end_date";

/// Monetary columns read into dedicated fields. Everything else becomes pass-through.
const MONETARY_FIELDS: [&str; 10] = [
    "original_price",
    "discount_fee",
    "refund_amount",
    "product_tax_fee",
    "commission_fee",
    "refund_commission_fee",
    "extra_fee",
    "pickup_tip_fee",
    "store_amount",
    "settlement_amount",
];

/// Pass-through columns that are always free text, even when they look numeric.
const TEXT_FIELDS: [&str; 1] = ["remark"];

/// Inclusive range of calendar days a bill covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Period {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl Period {
    pub fn new(start_date: NaiveDate, end_date: NaiveDate) -> Result<Self> {
        if start_date > end_date {
            return Err(SettlementError::Validation(format!(
                "period starts after it ends ({start_date} > {end_date})"
            )));
        }
        Ok(Self {
            start_date,
            end_date,
        })
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start_date <= date && date <= self.end_date
    }
}

/// A bill column that is not part of the settlement formulas.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum BillValue {
    /// Numeric column, normalized to exact decimal.
    Amount(Money),
    /// Text, boolean or null column, carried unchanged.
    Raw(Value),
}

impl BillValue {
    pub fn as_amount(&self) -> Option<Money> {
        match self {
            Self::Amount(money) => Some(*money),
            Self::Raw(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Raw(Value::String(text)) => Some(text),
            _ => None,
        }
    }
}

/// A store's bill for one period, with every monetary column as exact decimal.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodBill {
    pub id: Option<u64>,
    pub store_id: StoreId,
    #[serde(flatten)]
    pub period: Period,
    pub original_price: Money,
    pub discount_fee: Money,
    pub refund_amount: Money,
    /// Declared product tax. A blend of GST and PST as recorded by the ledger.
    pub product_tax_fee: Money,
    pub commission_fee: Money,
    pub refund_commission_fee: Money,
    pub service_package_fee: Money,
    pub extra_fee: Money,
    pub pickup_tip_fee: Money,
    pub store_amount: Money,
    /// Amount payable to the merchant. Non-zero marks the bill as pending.
    pub settlement_amount: Money,
    /// Remaining scalar columns (`stripe_fee`, `remark`, ...).
    pub passthrough: BTreeMap<String, BillValue>,
}

impl PeriodBill {
    /// Normalizes a raw storage row.
    ///
    /// Required structural fields are checked before anything else; missing
    /// monetary fields default to zero.
    pub fn from_row(row: &BillRow) -> Result<Self> {
        let store_id = required_id(row, STORE_ID)?;
        let period = Period::new(required_date(row, START_DATE)?, required_date(row, END_DATE)?)?;
        let id = match row.get(ID) {
            None | Some(Value::Null) => None,
            Some(_) => Some(required_id(row, ID)?),
        };

        let money = |key: &str| coerce_decimal(key, row.get(key).unwrap_or(&Value::Null));

        let mut passthrough = BTreeMap::new();
        for (key, value) in row {
            if is_known_key(key) {
                continue;
            }
            match value {
                Value::Number(_) => {
                    passthrough.insert(key.clone(), BillValue::Amount(coerce_decimal(key, value)?));
                }
                Value::String(text) => {
                    passthrough.insert(key.clone(), text_column(key, text, value));
                }
                Value::Bool(_) | Value::Null => {
                    passthrough.insert(key.clone(), BillValue::Raw(value.clone()));
                }
                Value::Array(_) | Value::Object(_) => {
                    tracing::debug!(store_id, key = %key, "dropping non-scalar bill column");
                }
            }
        }

        Ok(Self {
            id,
            store_id,
            period,
            original_price: money("original_price")?,
            discount_fee: money("discount_fee")?,
            refund_amount: money("refund_amount")?,
            product_tax_fee: money("product_tax_fee")?,
            commission_fee: money("commission_fee")?,
            refund_commission_fee: money("refund_commission_fee")?,
            service_package_fee: service_package_fee(row)?,
            extra_fee: money("extra_fee")?,
            pickup_tip_fee: money("pickup_tip_fee")?,
            store_amount: money("store_amount")?,
            settlement_amount: money("settlement_amount")?,
            passthrough,
        })
    }

    pub fn is_pending(&self) -> bool {
        !self.settlement_amount.is_zero()
    }

    /// Processing (payment gateway) fee, when the ledger recorded one.
    pub fn processing_fee(&self) -> Option<Money> {
        self.passthrough.get("stripe_fee").and_then(BillValue::as_amount)
    }

    pub fn remark(&self) -> Option<&str> {
        self.passthrough.get("remark").and_then(BillValue::as_text)
    }
}

/// Finds the bill of `store_id` whose period contains `date`.
///
/// `None` means the date is outside every billed period. Overlapping periods
/// should not exist; if they do, the earliest-starting one wins.
pub fn resolve_period<'a, I>(bills: I, store_id: StoreId, date: NaiveDate) -> Option<&'a PeriodBill>
where
    I: IntoIterator<Item = &'a PeriodBill>,
{
    let mut matches: Vec<&PeriodBill> = bills
        .into_iter()
        .filter(|bill| bill.store_id == store_id && bill.period.contains(date))
        .collect();
    if matches.len() > 1 {
        tracing::warn!(store_id, %date, count = matches.len(), "overlapping bill periods");
    }
    matches.sort_by_key(|bill| bill.period.start_date);
    matches.into_iter().next()
}

/// Parses a `YYYY-MM-DD` date, also accepting a full timestamp on that day.
pub fn parse_date(field: &str, raw: &str) -> Result<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").map(|dt| dt.date()))
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S").map(|dt| dt.date()))
        .map_err(|_| {
            SettlementError::Validation(format!(
                "{field}: invalid date {raw:?}. Use YYYY-MM-DD"
            ))
        })
}

fn is_known_key(key: &str) -> bool {
    matches!(
        key,
        ID | STORE_ID | START_DATE | END_DATE | SERVICE_PACKAGE_FEE | ASSET_BALANCE_REPAYMENT
    ) || MONETARY_FIELDS.contains(&key)
}

/// A column counts as present unless it is null or a blank string.
fn present<'a>(row: &'a BillRow, key: &str) -> Option<&'a Value> {
    row.get(key).filter(|value| match value {
        Value::Null => false,
        Value::String(text) => !text.trim().is_empty(),
        _ => true,
    })
}

/// Decimal strings in unnamed columns are amounts; free-text columns stay text.
fn text_column(key: &str, text: &str, value: &Value) -> BillValue {
    if TEXT_FIELDS.contains(&key) || text.trim().is_empty() {
        return BillValue::Raw(value.clone());
    }
    coerce_decimal(key, value)
        .map(BillValue::Amount)
        .unwrap_or_else(|_| BillValue::Raw(value.clone()))
}

fn required_id(row: &BillRow, key: &str) -> Result<u64> {
    let value = present(row, key)
        .ok_or_else(|| SettlementError::Validation(format!("missing required field {key}")))?;
    let id = match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    };
    id.ok_or_else(|| SettlementError::Validation(format!("{key} must be an identifier, got {value}")))
}

fn required_date(row: &BillRow, key: &str) -> Result<NaiveDate> {
    match present(row, key) {
        Some(Value::String(raw)) => parse_date(key, raw),
        Some(other) => Err(SettlementError::Validation(format!(
            "{key} must be a date string, got {other}"
        ))),
        None => Err(SettlementError::Validation(format!(
            "missing required field {key}"
        ))),
    }
}

/// Reads the service package slot under either of its names.
fn service_package_fee(row: &BillRow) -> Result<Money> {
    let canonical = present(row, SERVICE_PACKAGE_FEE)
        .map(|value| coerce_decimal(SERVICE_PACKAGE_FEE, value))
        .transpose()?;
    let alias = present(row, ASSET_BALANCE_REPAYMENT)
        .map(|value| coerce_decimal(ASSET_BALANCE_REPAYMENT, value))
        .transpose()?;

    match (canonical, alias) {
        (Some(a), Some(b)) if a != b => Err(SettlementError::Validation(format!(
            "{SERVICE_PACKAGE_FEE} ({}) and {ASSET_BALANCE_REPAYMENT} ({}) disagree",
            a.value(),
            b.value()
        ))),
        (Some(fee), _) | (None, Some(fee)) => Ok(fee),
        (None, None) => Ok(Money::ZERO),
    }
}
