use crate::error::AnalyticsError;
use crate::report::{
    CountEntry, DashboardReport, MonthlyCount, Overview, ProductRanking, RevenueEntry,
    ReviewTimeAxis, ReviewTrend, ReviewTrendRow, RfmRanking, ScoreCount, SellerRanking,
};
use chrono::{Datelike, NaiveDateTime};
use core_types::{Column, Dataset, DateRange, OrderRecord, RfmRecord, Schema};
use rust_decimal::Decimal;
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

/// Bounds the engine enforces on caller-supplied parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineSettings {
    pub top_n_min: usize,
    pub top_n_max: usize,
    /// Length of each best-customer list in `RfmRanking`.
    pub rfm_display_count: usize,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            top_n_min: 5,
            top_n_max: 10,
            rfm_display_count: 5,
        }
    }
}

/// The user-controlled inputs for one dashboard refresh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregationParams {
    /// `None` means the full span of the dataset.
    pub range: Option<DateRange>,
    pub top_n: usize,
    /// Keep only the first N rows (in dataset order) after the date filter.
    pub row_limit: Option<usize>,
}

impl AggregationParams {
    pub fn new(top_n: usize) -> Self {
        Self {
            range: None,
            top_n,
            row_limit: None,
        }
    }

    pub fn with_range(mut self, range: Option<DateRange>) -> Self {
        self.range = range;
        self
    }

    pub fn with_row_limit(mut self, row_limit: Option<usize>) -> Self {
        self.row_limit = row_limit;
        self
    }
}

/// A stateless calculator for the sales dashboard tables.
#[derive(Debug, Default)]
pub struct AggregationEngine {
    settings: EngineSettings,
}

impl AggregationEngine {
    pub fn new(settings: EngineSettings) -> Self {
        Self { settings }
    }

    /// The main entry point: computes every dashboard table.
    ///
    /// # Arguments
    ///
    /// * `dataset` - The loaded order dataset. It is only borrowed.
    /// * `params` - Date filter, top-N and optional row limit.
    ///
    /// # Returns
    ///
    /// A `Result` containing the complete `DashboardReport` or an `AnalyticsError`.
    /// All validation happens before any table is built.
    pub fn run(
        &self,
        dataset: &Dataset,
        params: &AggregationParams,
    ) -> Result<DashboardReport, AnalyticsError> {
        self.validate_schema(&dataset.schema)?;
        self.validate_top_n(params.top_n)?;

        let mut rows = Self::filter_by_date_range(&dataset.records, params.range.as_ref())?;
        if let Some(limit) = params.row_limit {
            rows.truncate(limit);
        }

        tracing::debug!(
            total_rows = dataset.len(),
            rows = rows.len(),
            top_n = params.top_n,
            range = ?params.range,
            "Computing dashboard report."
        );

        let rfm = Self::compute_rfm(&rows);
        let rfm_ranking = Self::rank_rfm(&rfm, self.settings.rfm_display_count);

        Ok(DashboardReport {
            range: params.range,
            top_n: params.top_n,
            rows_considered: rows.len(),
            overview: Self::compute_overview(&rows),
            monthly_transactions: Self::monthly_transaction_trend(&rows),
            products: Self::top_and_bottom_products(&rows, params.top_n),
            rfm,
            rfm_ranking,
            review_distribution: Self::review_score_distribution(&rows),
            review_trend: Self::monthly_review_trend(&rows, &dataset.schema),
            sellers: Self::top_sellers(&rows, params.top_n),
        })
    }

    fn validate_schema(&self, schema: &Schema) -> Result<(), AnalyticsError> {
        match schema.missing_required().into_iter().next() {
            Some(column) => Err(AnalyticsError::MissingColumn(column)),
            None => Ok(()),
        }
    }

    fn validate_top_n(&self, top_n: usize) -> Result<(), AnalyticsError> {
        let (min, max) = (self.settings.top_n_min, self.settings.top_n_max);
        if !(min..=max).contains(&top_n) {
            return Err(AnalyticsError::TopNOutOfRange {
                value: top_n,
                min,
                max,
            });
        }
        Ok(())
    }

    /// Keeps the rows whose purchase date lies within `range`, inclusive.
    ///
    /// With no range every row is kept, including rows whose timestamp did not
    /// parse. With a range those rows are dropped, since they have no date.
    pub fn filter_by_date_range<'a>(
        records: &'a [OrderRecord],
        range: Option<&DateRange>,
    ) -> Result<Vec<&'a OrderRecord>, AnalyticsError> {
        let Some(range) = range else {
            return Ok(records.iter().collect());
        };
        range.validate()?;

        Ok(records
            .iter()
            .filter(|r| r.purchase_date().is_some_and(|d| range.contains(d)))
            .collect())
    }

    /// Distinct orders and total payment value.
    pub fn compute_overview(records: &[&OrderRecord]) -> Overview {
        let orders: HashSet<&str> = records.iter().map(|r| r.order_id.as_str()).collect();
        let total_revenue: Decimal = records.iter().map(|r| r.payment_value).sum();

        Overview {
            total_orders: orders.len(),
            total_revenue,
        }
    }

    /// Row counts per purchase month, oldest first. Empty months are omitted.
    pub fn monthly_transaction_trend(records: &[&OrderRecord]) -> Vec<MonthlyCount> {
        let mut months: BTreeMap<(i32, u32), usize> = BTreeMap::new();
        for ts in records.iter().filter_map(|r| r.order_purchase_timestamp) {
            *months.entry(month_key(ts)).or_insert(0) += 1;
        }

        months
            .into_iter()
            .map(|(key, count)| MonthlyCount {
                month: format_month(key),
                count,
            })
            .collect()
    }

    /// The `top_n` most and least frequent products by row count.
    ///
    /// Ties are broken by ascending product id in both lists.
    pub fn top_and_bottom_products(records: &[&OrderRecord], top_n: usize) -> ProductRanking {
        let counts = count_by(records, |r| r.product_id.as_str());

        let mut top = counts.clone();
        top.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.id.cmp(&b.id)));
        top.truncate(top_n);

        let mut bottom = counts;
        bottom.sort_by(|a, b| a.count.cmp(&b.count).then_with(|| a.id.cmp(&b.id)));
        bottom.truncate(top_n);

        ProductRanking { top, bottom }
    }

    /// One RFM record per customer, sorted by customer id.
    ///
    /// Recency is measured against the latest purchase in the whole input, not
    /// per customer. Rows without a valid purchase timestamp are ignored.
    pub fn compute_rfm(records: &[&OrderRecord]) -> Vec<RfmRecord> {
        struct Acc<'a> {
            last_purchase: NaiveDateTime,
            orders: HashSet<&'a str>,
            monetary: Decimal,
        }

        let mut customers: HashMap<&str, Acc> = HashMap::new();
        let mut max_date: Option<NaiveDateTime> = None;

        for record in records {
            let Some(ts) = record.order_purchase_timestamp else {
                continue;
            };
            max_date = Some(max_date.map_or(ts, |m| m.max(ts)));

            let acc = customers
                .entry(record.customer_id.as_str())
                .or_insert_with(|| Acc {
                    last_purchase: ts,
                    orders: HashSet::new(),
                    monetary: Decimal::ZERO,
                });
            acc.last_purchase = acc.last_purchase.max(ts);
            acc.orders.insert(record.order_id.as_str());
            acc.monetary += record.payment_value;
        }

        let Some(max_date) = max_date else {
            return Vec::new();
        };

        let mut rfm: Vec<RfmRecord> = customers
            .into_iter()
            .map(|(customer_id, acc)| RfmRecord {
                customer_id: customer_id.to_string(),
                recency: (max_date - acc.last_purchase).num_days(),
                frequency: acc.orders.len(),
                monetary: acc.monetary,
            })
            .collect();
        rfm.sort_by(|a, b| a.customer_id.cmp(&b.customer_id));
        rfm
    }

    /// The best `count` customers by each RFM dimension, ranked independently:
    /// lowest recency, highest frequency, highest monetary. Ties go to the
    /// lower customer id.
    pub fn rank_rfm(rfm: &[RfmRecord], count: usize) -> RfmRanking {
        let ranked = |cmp: fn(&RfmRecord, &RfmRecord) -> Ordering| {
            let mut list = rfm.to_vec();
            list.sort_by(|a, b| cmp(a, b).then_with(|| a.customer_id.cmp(&b.customer_id)));
            list.truncate(count);
            list
        };

        RfmRanking {
            by_recency: ranked(|a, b| a.recency.cmp(&b.recency)),
            by_frequency: ranked(|a, b| b.frequency.cmp(&a.frequency)),
            by_monetary: ranked(|a, b| b.monetary.cmp(&a.monetary)),
        }
    }

    /// Number of reviews per score, ascending by score. Unscored rows are excluded.
    pub fn review_score_distribution(records: &[&OrderRecord]) -> Vec<ScoreCount> {
        let mut scores: BTreeMap<u8, usize> = BTreeMap::new();
        for score in records.iter().filter_map(|r| r.review_score) {
            *scores.entry(score).or_insert(0) += 1;
        }

        scores
            .into_iter()
            .map(|(score, count)| ScoreCount { score, count })
            .collect()
    }

    /// Review counts per month and score.
    ///
    /// Months come from `review_creation_date`. If that column is absent from
    /// the schema altogether, the purchase timestamp is used instead. Rows
    /// without a score or without the chosen timestamp are excluded.
    pub fn monthly_review_trend(records: &[&OrderRecord], schema: &Schema) -> ReviewTrend {
        let time_axis = if schema.has(Column::ReviewCreationDate) {
            ReviewTimeAxis::ReviewCreationDate
        } else {
            ReviewTimeAxis::OrderPurchaseTimestamp
        };

        let mut cells: BTreeMap<(i32, u32), BTreeMap<u8, usize>> = BTreeMap::new();
        let mut seen_scores: BTreeSet<u8> = BTreeSet::new();

        for record in records {
            let ts = match time_axis {
                ReviewTimeAxis::ReviewCreationDate => record.review_creation_date,
                ReviewTimeAxis::OrderPurchaseTimestamp => record.order_purchase_timestamp,
            };
            let (Some(ts), Some(score)) = (ts, record.review_score) else {
                continue;
            };

            seen_scores.insert(score);
            *cells
                .entry(month_key(ts))
                .or_default()
                .entry(score)
                .or_insert(0) += 1;
        }

        let scores: Vec<u8> = seen_scores.into_iter().collect();
        let rows = cells
            .into_iter()
            .map(|(key, by_score)| ReviewTrendRow {
                month: format_month(key),
                counts: scores
                    .iter()
                    .map(|s| by_score.get(s).copied().unwrap_or(0))
                    .collect(),
            })
            .collect();

        ReviewTrend {
            time_axis,
            scores,
            rows,
        }
    }

    /// The `top_n` sellers by row count and, independently, by summed payment value.
    ///
    /// Ties are broken by ascending seller id.
    pub fn top_sellers(records: &[&OrderRecord], top_n: usize) -> SellerRanking {
        let mut by_transaction_count = count_by(records, |r| r.seller_id.as_str());
        by_transaction_count.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.id.cmp(&b.id)));
        by_transaction_count.truncate(top_n);

        let mut revenue: HashMap<&str, Decimal> = HashMap::new();
        for record in records {
            *revenue.entry(record.seller_id.as_str()).or_insert(Decimal::ZERO) +=
                record.payment_value;
        }
        let mut by_revenue: Vec<RevenueEntry> = revenue
            .into_iter()
            .map(|(id, revenue)| RevenueEntry {
                id: id.to_string(),
                revenue,
            })
            .collect();
        by_revenue.sort_by(|a, b| b.revenue.cmp(&a.revenue).then_with(|| a.id.cmp(&b.id)));
        by_revenue.truncate(top_n);

        SellerRanking {
            by_transaction_count,
            by_revenue,
        }
    }
}

/// Row counts grouped by the key `key_of` extracts. Unordered.
fn count_by<'a, F>(records: &[&'a OrderRecord], key_of: F) -> Vec<CountEntry>
where
    F: Fn(&'a OrderRecord) -> &'a str,
{
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for record in records {
        *counts.entry(key_of(*record)).or_insert(0) += 1;
    }

    counts
        .into_iter()
        .map(|(id, count)| CountEntry {
            id: id.to_string(),
            count,
        })
        .collect()
}

fn month_key(ts: NaiveDateTime) -> (i32, u32) {
    (ts.year(), ts.month())
}

fn format_month((year, month): (i32, u32)) -> String {
    format!("{year:04}-{month:02}")
}
