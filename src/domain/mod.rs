//! Domain types used throughout the dashboard.
//!
//! This module defines:
//!
//! - observations and the immutable dataset (`Observation`, `Dataset`, `FilteredView`)
//! - filter and summary settings (`FilterSpec`, `Choice`, `SummaryMode`, `DisplayUnit`)
//! - engine outputs (`SummaryResult`, `ChartSeries`, `MapPoint`, `CountryDetail`)
//! - persisted card layout (`CardStyle`)

pub mod outputs;
pub mod types;

pub use outputs::*;
pub use types::*;
