use chrono::NaiveDate;
use core_types::{Column, CoreError};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AnalyticsError {
    #[error("Invalid date range: start date {start} is after end date {end}")]
    InvalidRange { start: NaiveDate, end: NaiveDate },

    #[error("Required column '{0}' is missing from the dataset")]
    MissingColumn(Column),

    #[error("top-N value {value} is outside the allowed range {min}..={max}")]
    TopNOutOfRange { value: usize, min: usize, max: usize },
}

impl From<CoreError> for AnalyticsError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::InvalidRange { start, end } => AnalyticsError::InvalidRange { start, end },
        }
    }
}
