use crate::error::DatasetError;
use chrono::{NaiveDate, NaiveDateTime};
use core_types::{Column, Dataset, OrderRecord, Schema};
use csv::StringRecord;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;

/// Review scores outside this range are rejected.
const REVIEW_SCORES: std::ops::RangeInclusive<u8> = 1..=5;

/// Date-time layouts accepted for timestamp columns, tried in order.
const DATETIME_FORMATS: [&str; 5] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Loads the order dataset from a CSV file on disk.
pub fn load_from_path(path: &Path) -> Result<Dataset, DatasetError> {
    tracing::info!(path = %path.display(), "Loading order dataset.");
    let file = File::open(path)?;
    load_from_reader(file)
}

/// Parses the order dataset from any CSV source with a header row.
///
/// Unknown columns are ignored. Rows whose purchase timestamp cannot be parsed
/// are kept with `order_purchase_timestamp = None` so that time-based
/// aggregations can skip them.
pub fn load_from_reader<R: Read>(reader: R) -> Result<Dataset, DatasetError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = csv_reader.headers()?.clone();
    let schema = Schema::from_headers(headers.iter());
    if let Some(column) = schema.missing_required().into_iter().next() {
        return Err(DatasetError::MissingColumn(column));
    }

    let index = ColumnIndex::new(&headers);
    let mut records = Vec::new();
    let mut bad_timestamps = 0usize;

    for result in csv_reader.records() {
        let raw = result?;
        let line = raw.position().map_or(0, |p| p.line());
        let record = index.parse_row(&raw, line)?;
        if record.order_purchase_timestamp.is_none() {
            bad_timestamps += 1;
        }
        records.push(record);
    }

    if bad_timestamps > 0 {
        tracing::warn!(
            rows = bad_timestamps,
            "Rows with an unparseable purchase timestamp are left out of time-based tables."
        );
    }
    tracing::info!(
        rows = records.len(),
        has_review_score = schema.has(Column::ReviewScore),
        has_review_creation_date = schema.has(Column::ReviewCreationDate),
        "Order dataset loaded."
    );

    Ok(Dataset::new(records, schema))
}

/// Parses a timestamp cell. A bare date is read as midnight.
pub fn parse_timestamp(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(text, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// Maps known columns to their position in the header row.
struct ColumnIndex {
    positions: HashMap<Column, usize>,
}

impl ColumnIndex {
    fn new(headers: &StringRecord) -> Self {
        let mut positions = HashMap::new();
        for column in Column::REQUIRED.iter().chain(Column::OPTIONAL.iter()) {
            if let Some(pos) = headers.iter().position(|h| h.trim() == column.as_str()) {
                positions.insert(*column, pos);
            }
        }
        Self { positions }
    }

    /// The trimmed cell for `column`, or an empty string if the column is absent.
    fn cell<'r>(&self, raw: &'r StringRecord, column: Column) -> &'r str {
        self.positions
            .get(&column)
            .and_then(|pos| raw.get(*pos))
            .unwrap_or("")
    }

    fn identifier(
        &self,
        raw: &StringRecord,
        column: Column,
        line: u64,
    ) -> Result<String, DatasetError> {
        let value = self.cell(raw, column);
        if value.is_empty() {
            return Err(invalid(column, line, value));
        }
        Ok(value.to_string())
    }

    fn parse_row(&self, raw: &StringRecord, line: u64) -> Result<OrderRecord, DatasetError> {
        let payment_text = self.cell(raw, Column::PaymentValue);
        let payment_value = Decimal::from_str(payment_text)
            .map_err(|_| invalid(Column::PaymentValue, line, payment_text))?;
        if payment_value.is_sign_negative() && !payment_value.is_zero() {
            return Err(invalid(Column::PaymentValue, line, payment_text));
        }

        let score_text = self.cell(raw, Column::ReviewScore);
        let review_score = if score_text.is_empty() {
            None
        } else {
            let score = parse_score(score_text)
                .ok_or_else(|| invalid(Column::ReviewScore, line, score_text))?;
            Some(score)
        };

        Ok(OrderRecord {
            order_id: self.identifier(raw, Column::OrderId, line)?,
            customer_id: self.identifier(raw, Column::CustomerId, line)?,
            product_id: self.identifier(raw, Column::ProductId, line)?,
            seller_id: self.identifier(raw, Column::SellerId, line)?,
            payment_value,
            order_purchase_timestamp: parse_timestamp(
                self.cell(raw, Column::OrderPurchaseTimestamp),
            ),
            review_score,
            review_creation_date: parse_timestamp(self.cell(raw, Column::ReviewCreationDate)),
        })
    }
}

/// Review scores arrive as `4` or, from float-typed exports, `4.0`.
fn parse_score(text: &str) -> Option<u8> {
    let value = Decimal::from_str(text).ok()?;
    if !value.fract().is_zero() {
        return None;
    }
    value.to_u8().filter(|score| REVIEW_SCORES.contains(score))
}

fn invalid(column: Column, line: u64, value: &str) -> DatasetError {
    DatasetError::InvalidValue {
        column,
        line,
        value: value.to_string(),
    }
}
