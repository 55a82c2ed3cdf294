//! # Order Dataset Loader
//!
//! This crate reads the cleaned order export into a `core_types::Dataset` and
//! keeps it for the lifetime of the process.
//!
//! ## Architectural Principles
//!
//! - **Adapter:** All CSV and text-format concerns live here. The analytics
//!   engine never sees raw strings for money or time.
//! - **Validate at the Edge:** Missing required columns and malformed payment
//!   values are rejected while loading, before any aggregation runs.
//! - **Load Once:** `SharedDataset` reads the source a single time and hands out
//!   shared read-only references afterwards.
//!
//! ## Public API
//!
//! - `load_from_reader` / `load_from_path`: Parse a dataset.
//! - `SharedDataset` and `shared()`: The load-once dataset cell.
//! - `DatasetError`: The specific error types that can be returned from this crate.

// Declare the modules that constitute this crate.
pub mod error;
pub mod loader;
pub mod shared;

// Re-export the key components to create a clean, public-facing API.
pub use error::DatasetError;
pub use loader::{load_from_path, load_from_reader, parse_timestamp};
pub use shared::{SharedDataset, shared};
