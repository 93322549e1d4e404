use super::bill::{BillValue, Period, PeriodBill};
use super::money::Money;
use super::order::{Order, unique_customers};
use super::tax::TaxTotals;
use super::StoreId;
use crate::error::{Result, SettlementError};
use serde::Serialize;
use std::collections::BTreeMap;

/// Everything a renderer needs about one store's period, fully computed.
///
/// Built fresh on every computation and never written back to storage.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SettlementRecord {
    pub store_id: StoreId,
    pub bill_id: Option<u64>,
    #[serde(flatten)]
    pub period: Period,
    pub total_orders: usize,
    pub unique_users: usize,
    /// `original_price - discount_fee - refund_amount`.
    pub total_revenue: Money,
    /// Product tax as declared on the bill (GST and PST blended).
    pub declared_tax: Money,
    /// Declared tax with the PST component backed out. May be negative.
    pub gst_total: Money,
    pub pst_total: Money,
    /// Net deduction from the payout; negative when deductions exceed additions.
    pub additional_charge: Money,
    pub original_price: Money,
    pub discount_fee: Money,
    pub refund_amount: Money,
    pub product_tax_fee: Money,
    pub commission_fee: Money,
    pub refund_commission_fee: Money,
    pub service_package_fee: Money,
    pub extra_fee: Money,
    pub pickup_tip_fee: Money,
    pub store_amount: Money,
    pub settlement_amount: Money,
    pub passthrough: BTreeMap<String, BillValue>,
}

impl SettlementRecord {
    /// True when the blended declared tax is smaller than its PST component.
    pub fn has_negative_gst_split(&self) -> bool {
        self.gst_total.is_negative()
    }

    /// Whether any of the fees behind `additional_charge` is non-zero.
    pub fn has_additional_charges(&self) -> bool {
        [
            self.commission_fee,
            self.refund_commission_fee,
            self.service_package_fee,
            self.extra_fee,
        ]
        .iter()
        .any(|fee| !fee.is_zero())
    }

    pub fn processing_fee(&self) -> Option<Money> {
        self.passthrough.get("stripe_fee").and_then(BillValue::as_amount)
    }

    pub fn remark(&self) -> Option<&str> {
        self.passthrough.get("remark").and_then(BillValue::as_text)
    }
}

/// Combines a period bill, its orders and the aggregated taxes into a settlement.
///
/// Pure: no I/O and no rounding. Every order must belong to the bill's store.
pub fn compute_settlement(
    bill: &PeriodBill,
    orders: &[Order],
    tax_totals: TaxTotals,
) -> Result<SettlementRecord> {
    if let Some(foreign) = orders.iter().find(|order| order.store_id != bill.store_id) {
        return Err(SettlementError::Validation(format!(
            "order {} belongs to store {}, not {}",
            foreign.id, foreign.store_id, bill.store_id
        )));
    }

    let declared_tax = bill.product_tax_fee;
    let pst_total = tax_totals.pst_total;
    let gst_total = declared_tax.checked_sub(pst_total)?;

    let additional_charge = -bill
        .commission_fee
        .checked_sub(bill.refund_commission_fee)?
        .checked_add(bill.service_package_fee)?
        .checked_sub(bill.extra_fee)?;

    let total_revenue = bill
        .original_price
        .checked_sub(bill.discount_fee)?
        .checked_sub(bill.refund_amount)?;

    Ok(SettlementRecord {
        store_id: bill.store_id,
        bill_id: bill.id,
        period: bill.period,
        total_orders: orders.len(),
        unique_users: unique_customers(orders),
        total_revenue,
        declared_tax,
        gst_total,
        pst_total,
        additional_charge,
        original_price: bill.original_price,
        discount_fee: bill.discount_fee,
        refund_amount: bill.refund_amount,
        product_tax_fee: bill.product_tax_fee,
        commission_fee: bill.commission_fee,
        refund_commission_fee: bill.refund_commission_fee,
        service_package_fee: bill.service_package_fee,
        extra_fee: bill.extra_fee,
        pickup_tip_fee: bill.pickup_tip_fee,
        store_amount: bill.store_amount,
        settlement_amount: bill.settlement_amount,
        passthrough: bill.passthrough.clone(),
    })
}
