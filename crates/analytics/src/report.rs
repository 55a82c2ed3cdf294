use core_types::{DateRange, RfmRecord};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Every table the dashboard renders for one set of filter parameters.
///
/// This struct is the final output of the `AggregationEngine` and is handed to
/// the presentation layer as-is (or exported as JSON).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardReport {
    /// The date filter that was applied, `None` for the whole dataset.
    pub range: Option<DateRange>,
    pub top_n: usize,
    /// Number of rows left after the date filter and row limit.
    pub rows_considered: usize,

    pub overview: Overview,
    pub monthly_transactions: Vec<MonthlyCount>,
    pub products: ProductRanking,
    pub rfm: Vec<RfmRecord>,
    pub rfm_ranking: RfmRanking,
    pub review_distribution: Vec<ScoreCount>,
    pub review_trend: ReviewTrend,
    pub sellers: SellerRanking,
}

/// Headline figures.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Overview {
    /// Distinct order ids.
    pub total_orders: usize,
    /// Sum of every payment row.
    pub total_revenue: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyCount {
    /// Calendar month as `YYYY-MM`.
    pub month: String,
    pub count: usize,
}

/// An identifier with its row count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountEntry {
    pub id: String,
    pub count: usize,
}

/// An identifier with its summed payment value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevenueEntry {
    pub id: String,
    pub revenue: Decimal,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductRanking {
    /// Best sellers, highest count first.
    pub top: Vec<CountEntry>,
    /// Least popular, lowest count first.
    pub bottom: Vec<CountEntry>,
}

/// The best customers by each RFM dimension, ranked independently.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RfmRanking {
    pub by_recency: Vec<RfmRecord>,
    pub by_frequency: Vec<RfmRecord>,
    pub by_monetary: Vec<RfmRecord>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreCount {
    pub score: u8,
    pub count: usize,
}

/// Which timestamp the monthly review trend was bucketed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewTimeAxis {
    #[default]
    ReviewCreationDate,
    /// Used when the dataset has no `review_creation_date` column at all.
    OrderPurchaseTimestamp,
}

/// Review counts pivoted by month (rows) and score (columns).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewTrend {
    pub time_axis: ReviewTimeAxis,
    /// Column headers, ascending.
    pub scores: Vec<u8>,
    pub rows: Vec<ReviewTrendRow>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewTrendRow {
    pub month: String,
    /// One cell per entry of `ReviewTrend::scores`, zero-filled.
    pub counts: Vec<usize>,
}

impl ReviewTrendRow {
    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SellerRanking {
    pub by_transaction_count: Vec<CountEntry>,
    pub by_revenue: Vec<RevenueEntry>,
}
