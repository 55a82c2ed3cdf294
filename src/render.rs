use analytics::{CountEntry, DashboardReport, RevenueEntry, ReviewTimeAxis, ReviewTrend};
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, CellAlignment, ContentArrangement, Table};
use core_types::RfmRecord;
use num_format::{Locale, ToFormattedString};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use std::fmt;

/// Widest text bar drawn next to a count.
const BAR_WIDTH: usize = 30;

const RECOMMENDATIONS: [&str; 4] = [
    "Push the best-selling products harder with promotions and discounts.",
    "Review and follow up on negative reviews to improve service quality.",
    "Support the top sellers with incentives so they keep growing.",
    "Run a loyalty programme for the best RFM customers to improve retention.",
];

/// Renders the whole dashboard as text.
///
/// `banner` is shown first, e.g. when an invalid date range was replaced by the
/// full dataset.
pub fn render_report(
    report: &DashboardReport,
    banner: Option<&str>,
    short_id_len: usize,
) -> String {
    DashboardView {
        report,
        banner,
        short_id_len,
    }
    .to_string()
}

struct DashboardView<'a> {
    report: &'a DashboardReport,
    banner: Option<&'a str>,
    short_id_len: usize,
}

impl fmt::Display for DashboardView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let report = self.report;

        if let Some(message) = self.banner {
            writeln!(f, "!! {message}\n")?;
        }

        writeln!(f, "== Sales overview ==")?;
        match report.range {
            Some(range) => writeln!(f, "Period: {} to {}", range.start, range.end)?,
            None => writeln!(f, "Period: entire dataset")?,
        }
        writeln!(f, "Rows considered: {}", format_count(report.rows_considered))?;
        writeln!(f, "Total orders:    {}", format_count(report.overview.total_orders))?;
        writeln!(f, "Total revenue:   {}", format_money(report.overview.total_revenue))?;

        section(f, "Monthly transactions")?;
        let max = report.monthly_transactions.iter().map(|m| m.count).max().unwrap_or(0);
        let mut table = new_table(&["Month", "Transactions", ""]);
        for m in &report.monthly_transactions {
            table.add_row(vec![
                Cell::new(&m.month),
                Cell::new(format_count(m.count)).set_alignment(CellAlignment::Right),
                Cell::new(bar(m.count, max)),
            ]);
        }
        writeln!(f, "{table}")?;
        insight(f, "Monthly transactions fluctuate; time promotions around these patterns.")?;

        section(f, "Best-selling and least popular products")?;
        writeln!(f, "Top {} products", report.top_n)?;
        writeln!(f, "{}", count_table("Product", &report.products.top))?;
        writeln!(f, "Bottom {} products", report.top_n)?;
        writeln!(f, "{}", count_table("Product", &report.products.bottom))?;
        insight(
            f,
            "High-demand products can be promoted more aggressively; slow movers deserve a review.",
        )?;

        section(f, "RFM analysis (recency, frequency, monetary)")?;
        let ranking = &report.rfm_ranking;
        writeln!(f, "Customers analysed: {}", format_count(report.rfm.len()))?;
        writeln!(f, "By recency (days)")?;
        writeln!(f, "{}", rfm_table(&ranking.by_recency, self.short_id_len))?;
        writeln!(f, "By frequency")?;
        writeln!(f, "{}", rfm_table(&ranking.by_frequency, self.short_id_len))?;
        writeln!(f, "By monetary")?;
        writeln!(f, "{}", rfm_table(&ranking.by_monetary, self.short_id_len))?;
        insight(
            f,
            "These are the best customers by how recently, how often and how much they bought.",
        )?;

        section(f, "Review scores")?;
        let max = report.review_distribution.iter().map(|s| s.count).max().unwrap_or(0);
        let mut table = new_table(&["Score", "Reviews", ""]);
        for s in &report.review_distribution {
            table.add_row(vec![
                Cell::new(s.score),
                Cell::new(format_count(s.count)).set_alignment(CellAlignment::Right),
                Cell::new(bar(s.count, max)),
            ]);
        }
        writeln!(f, "{table}")?;

        let axis = match report.review_trend.time_axis {
            ReviewTimeAxis::ReviewCreationDate => "review creation date",
            ReviewTimeAxis::OrderPurchaseTimestamp => {
                "purchase date; the dataset has no review dates"
            }
        };
        writeln!(f, "Reviews per month (by {axis})")?;
        writeln!(f, "{}", review_trend_table(&report.review_trend))?;
        insight(
            f,
            "Most customers are satisfied, but the trend of negative reviews needs follow-up.",
        )?;

        section(f, "Top sellers")?;
        writeln!(f, "By transactions")?;
        writeln!(f, "{}", count_table("Seller", &report.sellers.by_transaction_count))?;
        writeln!(f, "By revenue")?;
        writeln!(f, "{}", revenue_table(&report.sellers.by_revenue))?;
        insight(
            f,
            "Sellers with high transaction counts and revenue could receive incentives \
             or exclusive features.",
        )?;

        section(f, "Recommendations")?;
        for line in RECOMMENDATIONS {
            writeln!(f, "- {line}")?;
        }
        Ok(())
    }
}

fn section(f: &mut fmt::Formatter<'_>, title: &str) -> fmt::Result {
    writeln!(f, "\n== {title} ==")
}

fn insight(f: &mut fmt::Formatter<'_>, text: &str) -> fmt::Result {
    writeln!(f, "Insight: {text}")
}

fn new_table(header: &[&str]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header.to_vec());
    table
}

fn review_trend_table(trend: &ReviewTrend) -> Table {
    let mut header: Vec<String> = vec!["Month".to_string()];
    header.extend(trend.scores.iter().map(|s| format!("Score {s}")));
    header.push("Total".to_string());

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header);
    for row in &trend.rows {
        let mut cells = vec![Cell::new(&row.month)];
        cells.extend(
            row.counts
                .iter()
                .map(|c| Cell::new(format_count(*c)).set_alignment(CellAlignment::Right)),
        );
        cells.push(Cell::new(format_count(row.total())).set_alignment(CellAlignment::Right));
        table.add_row(cells);
    }
    table
}

fn count_table(label: &str, entries: &[CountEntry]) -> Table {
    let mut table = new_table(&[label, "Rows"]);
    for e in entries {
        table.add_row(vec![
            Cell::new(&e.id),
            Cell::new(format_count(e.count)).set_alignment(CellAlignment::Right),
        ]);
    }
    table
}

fn revenue_table(entries: &[RevenueEntry]) -> Table {
    let mut table = new_table(&["Seller", "Revenue"]);
    for e in entries {
        table.add_row(vec![
            Cell::new(&e.id),
            Cell::new(format_money(e.revenue)).set_alignment(CellAlignment::Right),
        ]);
    }
    table
}

fn rfm_table(records: &[RfmRecord], short_id_len: usize) -> Table {
    let mut table = new_table(&["Customer", "Recency", "Frequency", "Monetary"]);
    for r in records {
        table.add_row(vec![
            Cell::new(short_id(&r.customer_id, short_id_len)),
            Cell::new(r.recency).set_alignment(CellAlignment::Right),
            Cell::new(r.frequency).set_alignment(CellAlignment::Right),
            Cell::new(format_money(r.monetary)).set_alignment(CellAlignment::Right),
        ]);
    }
    table
}

/// The first `len` characters of a customer id.
pub fn short_id(id: &str, len: usize) -> String {
    id.chars().take(len).collect()
}

pub fn format_count(n: usize) -> String {
    n.to_formatted_string(&Locale::en)
}

/// Two decimals with thousands separators, e.g. `1,234,567.89`.
pub fn format_money(value: Decimal) -> String {
    let rounded = value.round_dp(2);
    let sign = if rounded.is_sign_negative() && !rounded.is_zero() { "-" } else { "" };
    let abs = rounded.abs();
    let whole = abs.trunc().to_u128().unwrap_or(0);
    let cents = (abs.fract() * Decimal::ONE_HUNDRED).to_u32().unwrap_or(0);
    format!("{sign}{}.{cents:02}", whole.to_formatted_string(&Locale::en))
}

fn bar(value: usize, max: usize) -> String {
    if max == 0 {
        return String::new();
    }
    let width = (value * BAR_WIDTH).div_ceil(max);
    "#".repeat(width)
}
