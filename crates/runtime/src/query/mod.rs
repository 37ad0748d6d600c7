//! Query-side building blocks:
//!
//! - **Catalog**: the named analysis queries run by the walkthrough.
//! - **Cache**: in-memory retained copies of registered views.
//! - **Timing**: elapsed-time measurement and before/after comparison.
//! - **Report**: rendering results as tables, JSON rows and fingerprints.

pub mod cache;
pub mod catalog;
pub mod report;
pub mod timing;

pub use cache::{CachedViewSummary, ViewCache};
pub use catalog::AnalysisQuery;
pub use timing::{TimedRun, TimingComparison};
