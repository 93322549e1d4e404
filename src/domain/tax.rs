use super::money::Money;
use super::{DishId, OrderId};
use crate::error::Result;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Which net tax bucket a category contributes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaxBucket {
    Gst,
    Pst,
}

/// Tax categories a dish can be charged under.
///
/// Discriminants index into [`TAX_TABLE`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaxCategory {
    Gst = 0,
    Liquor = 1,
    Soda = 2,
}

struct TaxRule {
    code: u32,
    category: TaxCategory,
    rate: Decimal,
    bucket: TaxBucket,
}

/// Stored category code, rate and bucket per category. Rate changes are edits here.
static TAX_TABLE: [TaxRule; 3] = [
    TaxRule {
        code: 1,
        category: TaxCategory::Gst,
        rate: dec!(0.05),
        bucket: TaxBucket::Gst,
    },
    TaxRule {
        code: 2,
        category: TaxCategory::Liquor,
        rate: dec!(0.10),
        bucket: TaxBucket::Pst,
    },
    TaxRule {
        code: 3,
        category: TaxCategory::Soda,
        rate: dec!(0.07),
        bucket: TaxBucket::Pst,
    },
];

impl TaxCategory {
    /// Unknown codes map to `None` and are excluded from aggregation.
    pub fn from_code(code: u32) -> Option<Self> {
        TAX_TABLE
            .iter()
            .find(|rule| rule.code == code)
            .map(|rule| rule.category)
    }

    pub fn code(self) -> u32 {
        self.rule().code
    }

    pub fn rate(self) -> Decimal {
        self.rule().rate
    }

    pub fn bucket(self) -> TaxBucket {
        self.rule().bucket
    }

    fn rule(self) -> &'static TaxRule {
        &TAX_TABLE[self as usize]
    }
}

/// One tax charged on one dish of an order, joined with the dish's pre-tax amount.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxLineItem {
    pub order_id: OrderId,
    pub dish_id: DishId,
    /// Raw category code as stored; see [`TaxCategory::from_code`].
    pub system_tax_id: u32,
    pub amount: Money,
}

impl TaxLineItem {
    pub fn category(&self) -> Option<TaxCategory> {
        TaxCategory::from_code(self.system_tax_id)
    }
}

/// A dish on an order with its pre-tax amount, as stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderDish {
    pub order_id: OrderId,
    pub dish_id: DishId,
    pub amount: Money,
}

/// A tax category applied to a dish, as stored. Joined with [`OrderDish`]
/// to produce a [`TaxLineItem`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderDishTax {
    pub order_id: OrderId,
    pub dish_id: DishId,
    pub system_tax_id: u32,
}

/// Period-level tax sums, unrounded.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TaxTotals {
    pub gst_total: Money,
    pub pst_total: Money,
}

impl TaxTotals {
    pub const ZERO: Self = Self {
        gst_total: Money::ZERO,
        pst_total: Money::ZERO,
    };

    /// Adds one line item's contribution. Items with unknown codes return
    /// `Ok(false)` and leave the totals untouched.
    pub fn accumulate(&mut self, item: &TaxLineItem) -> Result<bool> {
        let Some(category) = item.category() else {
            return Ok(false);
        };
        let contribution = item.amount.checked_mul(category.rate())?;
        let bucket = match category.bucket() {
            TaxBucket::Gst => &mut self.gst_total,
            TaxBucket::Pst => &mut self.pst_total,
        };
        *bucket = bucket.checked_add(contribution)?;
        Ok(true)
    }
}
