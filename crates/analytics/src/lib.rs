//! # Order Analytics Engine
//!
//! This crate turns a loaded order dataset into the tables shown on the sales
//! dashboard: headline totals, monthly transaction counts, product and seller
//! rankings, review-score breakdowns and RFM customer segmentation.
//!
//! ## Architectural Principles
//!
//! - **Pure Logic:** This crate has no knowledge of files, terminals or
//!   configuration sources. It depends only on `core-types`.
//! - **Stateless Calculation:** The `AggregationEngine` holds only its bounds.
//!   Every call recomputes every table from the dataset and the parameters it is
//!   given, which makes it trivial to call again whenever a filter changes.
//! - **All or Nothing:** Inputs are validated before any table is computed, so a
//!   caller either gets a complete `DashboardReport` or an `AnalyticsError`.
//!
//! ## Public API
//!
//! - `AggregationEngine`: The main struct that contains the calculation logic.
//! - `AggregationParams` / `EngineSettings`: Per-call filters and engine bounds.
//! - `DashboardReport` and its table types.
//! - `AnalyticsError`: The specific error types that can be returned from this crate.

// Declare the modules that constitute this crate.
pub mod engine;
pub mod error;
pub mod report;

// Re-export the key components to create a clean, public-facing API.
pub use engine::{AggregationEngine, AggregationParams, EngineSettings};
pub use error::AnalyticsError;
pub use report::{
    CountEntry, DashboardReport, MonthlyCount, Overview, ProductRanking, RevenueEntry,
    ReviewTimeAxis, ReviewTrend, ReviewTrendRow, RfmRanking, ScoreCount, SellerRanking,
};
