use core_types::Column;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DatasetError {
    #[error("Failed to open the dataset: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to read CSV data: {0}")]
    Csv(#[from] csv::Error),

    #[error("Required column '{0}' is missing from the dataset header")]
    MissingColumn(Column),

    #[error("Invalid value {value:?} in column '{column}' at line {line}")]
    InvalidValue {
        column: Column,
        line: u64,
        value: String,
    },
}
