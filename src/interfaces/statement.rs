use crate::application::engine::SettlementReport;
use crate::config::DEFAULT_ORDERS_PER_PAGE;
use crate::domain::bill::Period;
use crate::domain::money::Money;
use crate::error::Result;
use std::fmt::{self, Write};

const PAGE_BREAK: &str = "\u{c}\n";
const LABEL_WIDTH: usize = 28;
const VALUE_WIDTH: usize = 16;

/// A rendered statement, one string per page.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub pages: Vec<String>,
}

impl Statement {
    /// The document as bytes, pages separated by form feeds.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.pages.join(PAGE_BREAK).into_bytes()
    }
}

/// Lays a settlement report out as a plain-text, paginated statement.
///
/// Figures are printed exactly as computed (rounded to cents for display);
/// nothing is re-aggregated here.
pub struct StatementRenderer {
    orders_per_page: usize,
}

impl Default for StatementRenderer {
    fn default() -> Self {
        Self::new(DEFAULT_ORDERS_PER_PAGE)
    }
}

impl StatementRenderer {
    pub fn new(orders_per_page: usize) -> Self {
        Self {
            orders_per_page: orders_per_page.max(1),
        }
    }

    /// Overview page, then order detail pages, then an additional charges
    /// page when any of those fees is non-zero.
    pub fn render(&self, report: &SettlementReport) -> Result<Statement> {
        let mut pages = vec![self.overview_page(report)?];
        pages.extend(self.detail_pages(report)?);
        if report.record.has_additional_charges() {
            pages.push(self.additional_charges_page(report)?);
        }
        Ok(Statement { pages })
    }

    fn overview_page(&self, report: &SettlementReport) -> Result<String> {
        let record = &report.record;
        let mut page = String::new();
        writeln!(page, "WEEKLY PAYOUT REPORT")?;
        writeln!(page, "{}", report.store.name)?;
        if !report.store.address.is_empty() {
            writeln!(page, "{}", report.store.address)?;
        }
        writeln!(page, "{}", period_label(&record.period))?;
        writeln!(page)?;

        money_line(&mut page, "Settlement amount", record.settlement_amount)?;
        line(&mut page, "Total orders", &record.total_orders.to_string())?;
        money_line(&mut page, "Total revenue", record.total_revenue)?;
        line(&mut page, "Unique customers", &record.unique_users.to_string())?;
        writeln!(page)?;

        money_line(&mut page, "Original price", record.original_price)?;
        money_line(&mut page, "Discount", -record.discount_fee)?;
        money_line(&mut page, "Refunds", -record.refund_amount)?;
        money_line(&mut page, "Pickup tips", record.pickup_tip_fee)?;
        money_line(&mut page, "GST", record.gst_total)?;
        money_line(&mut page, "PST", record.pst_total)?;
        if let Some(fee) = record.processing_fee() {
            money_line(&mut page, "Processing fee", -fee)?;
        }
        money_line(&mut page, "Additional charge", record.additional_charge)?;
        if let Some(remark) = record.remark() {
            line(&mut page, "Remark", remark)?;
        }
        Ok(page)
    }

    fn detail_pages(&self, report: &SettlementReport) -> Result<Vec<String>> {
        let total_pages = report.orders.len().div_ceil(self.orders_per_page);
        let period = period_label(&report.record.period);

        report
            .orders
            .chunks(self.orders_per_page)
            .enumerate()
            .map(|(index, chunk)| -> Result<String> {
                let mut page = String::new();
                writeln!(page, "{}", report.store.name)?;
                writeln!(page, "{period}")?;
                writeln!(page, "Page {}/{}", index + 1, total_pages)?;
                writeln!(page)?;
                writeln!(
                    page,
                    "{:<12}{:<12}{:<24}{:>12}",
                    "Date", "Pickup", "Customer", "Amount"
                )?;
                for line in chunk {
                    writeln!(
                        page,
                        "{:<12}{:<12}{:<24}{:>12}",
                        line.order.created_at.format("%Y-%m-%d"),
                        line.order.pickup_code,
                        line.customer_name,
                        line.order.store_total_fee.to_string()
                    )?;
                }
                Ok(page)
            })
            .collect()
    }

    fn additional_charges_page(&self, report: &SettlementReport) -> Result<String> {
        let record = &report.record;
        let mut page = String::new();
        writeln!(page, "ADDITIONAL CHARGES")?;
        writeln!(page, "{}", report.store.name)?;
        writeln!(page, "{}", period_label(&record.period))?;
        writeln!(page)?;
        money_line(&mut page, "Commission fee", -record.commission_fee)?;
        money_line(&mut page, "Commission refund", record.refund_commission_fee)?;
        money_line(&mut page, "Service package", -record.service_package_fee)?;
        money_line(&mut page, "Extra fee", record.extra_fee)?;
        money_line(&mut page, "Total", record.additional_charge)?;
        Ok(page)
    }
}

fn period_label(period: &Period) -> String {
    format!(
        "{} - {}",
        period.start_date.format("%B %d, %Y"),
        period.end_date.format("%B %d, %Y")
    )
}

fn line(page: &mut String, label: &str, value: &str) -> fmt::Result {
    writeln!(page, "{label:<LABEL_WIDTH$}{value:>VALUE_WIDTH$}")
}

fn money_line(page: &mut String, label: &str, amount: Money) -> fmt::Result {
    line(page, label, &amount.to_string())
}
