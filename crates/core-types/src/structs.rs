use crate::enums::Column;
use crate::error::CoreError;
use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One row of the cleaned order dataset.
///
/// An order with several line items or several payment rows appears more than
/// once, so `order_id` is not unique per record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRecord {
    pub order_id: String,
    pub customer_id: String,
    pub product_id: String,
    pub seller_id: String,
    pub payment_value: Decimal,
    /// `None` when the source text could not be parsed as a date-time.
    pub order_purchase_timestamp: Option<NaiveDateTime>,
    pub review_score: Option<u8>,
    pub review_creation_date: Option<NaiveDateTime>,
}

impl OrderRecord {
    /// The calendar date of the purchase, if the timestamp is valid.
    pub fn purchase_date(&self) -> Option<NaiveDate> {
        self.order_purchase_timestamp.map(|ts| ts.date())
    }
}

/// Recency / Frequency / Monetary figures for a single customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RfmRecord {
    pub customer_id: String,
    /// Whole days between the dataset's latest purchase and this customer's latest purchase.
    pub recency: i64,
    /// Number of distinct orders.
    pub frequency: usize,
    /// Total payment value across all of the customer's rows.
    pub monetary: Decimal,
}

/// An inclusive range of purchase dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    /// Creates a validated range. `start` may equal `end` (a single day).
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, CoreError> {
        let range = Self { start, end };
        range.validate()?;
        Ok(range)
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        if self.start > self.end {
            return Err(CoreError::InvalidRange {
                start: self.start,
                end: self.end,
            });
        }
        Ok(())
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// The set of known columns that were present in the source header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    columns: Vec<Column>,
}

impl Schema {
    /// A schema with every known column present.
    pub fn full() -> Self {
        Self::with_columns(Column::REQUIRED.iter().chain(Column::OPTIONAL.iter()).copied())
    }

    pub fn with_columns<I: IntoIterator<Item = Column>>(columns: I) -> Self {
        let mut present = Vec::new();
        for column in columns {
            if !present.contains(&column) {
                present.push(column);
            }
        }
        Self { columns: present }
    }

    /// Builds a schema from raw header names. Unknown headers are ignored.
    pub fn from_headers<'a, I: IntoIterator<Item = &'a str>>(headers: I) -> Self {
        let known: Vec<Column> = Column::REQUIRED
            .iter()
            .chain(Column::OPTIONAL.iter())
            .copied()
            .collect();

        let mut present = Vec::new();
        for header in headers {
            let header = header.trim();
            if let Some(column) = known.iter().find(|c| c.as_str() == header) {
                if !present.contains(column) {
                    present.push(*column);
                }
            }
        }
        Self { columns: present }
    }

    pub fn has(&self, column: Column) -> bool {
        self.columns.contains(&column)
    }

    /// Required columns that the source did not provide, in canonical order.
    pub fn missing_required(&self) -> Vec<Column> {
        Column::REQUIRED
            .iter()
            .copied()
            .filter(|c| !self.has(*c))
            .collect()
    }
}

impl Default for Schema {
    fn default() -> Self {
        Self::full()
    }
}

/// A loaded order dataset: the parsed rows plus the columns the source provided.
///
/// Read-only once constructed; the analytics engine only ever borrows it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    pub records: Vec<OrderRecord>,
    pub schema: Schema,
}

impl Dataset {
    pub fn new(records: Vec<OrderRecord>, schema: Schema) -> Self {
        Self { records, schema }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// The first and last purchase dates in the dataset, ignoring rows with
    /// unparseable timestamps. `None` if no row has a valid timestamp.
    pub fn span(&self) -> Option<DateRange> {
        let mut dates = self.records.iter().filter_map(OrderRecord::purchase_date);
        let first = dates.next()?;
        let (start, end) = dates.fold((first, first), |(lo, hi), d| (lo.min(d), hi.max(d)));
        Some(DateRange { start, end })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn date_range_rejects_reversed_bounds() {
        let err = DateRange::new(date(2024, 2, 1), date(2024, 1, 1)).unwrap_err();
        assert_eq!(
            err,
            CoreError::InvalidRange {
                start: date(2024, 2, 1),
                end: date(2024, 1, 1)
            }
        );
    }

    #[test]
    fn single_day_range_contains_only_that_day() {
        let range = DateRange::new(date(2024, 1, 5), date(2024, 1, 5)).unwrap();
        assert!(range.contains(date(2024, 1, 5)));
        assert!(!range.contains(date(2024, 1, 4)));
        assert!(!range.contains(date(2024, 1, 6)));
    }

    #[test]
    fn span_skips_rows_without_timestamp() {
        let record = |ts: Option<NaiveDateTime>| OrderRecord {
            order_id: "o".to_string(),
            customer_id: "c".to_string(),
            product_id: "p".to_string(),
            seller_id: "s".to_string(),
            payment_value: Decimal::ONE,
            order_purchase_timestamp: ts,
            review_score: None,
            review_creation_date: None,
        };
        let at = |d: NaiveDate| d.and_hms_opt(12, 0, 0);

        let dataset = Dataset::new(
            vec![
                record(at(date(2024, 3, 1))),
                record(None),
                record(at(date(2023, 12, 31))),
                record(at(date(2024, 1, 15))),
            ],
            Schema::full(),
        );

        assert_eq!(
            dataset.span(),
            Some(DateRange {
                start: date(2023, 12, 31),
                end: date(2024, 3, 1)
            })
        );
        assert_eq!(Dataset::default().span(), None);
    }

    #[test]
    fn schema_from_headers_ignores_unknown_columns() {
        let schema = Schema::from_headers([
            "order_id",
            "customer_id",
            "product_id",
            "seller_id",
            "payment_value",
            "order_purchase_timestamp",
            "customer_city",
        ]);
        assert!(schema.missing_required().is_empty());
        assert!(!schema.has(Column::ReviewScore));
        assert!(!schema.has(Column::ReviewCreationDate));
    }

    #[test]
    fn schema_reports_missing_required_columns() {
        let schema = Schema::from_headers(["order_id", "customer_id", "review_score"]);
        assert_eq!(
            schema.missing_required(),
            vec![
                Column::ProductId,
                Column::SellerId,
                Column::PaymentValue,
                Column::OrderPurchaseTimestamp
            ]
        );
    }
}
