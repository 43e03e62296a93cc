//! Input/output helpers.
//!
//! - dataset sources: file or URL (`fetch`)
//! - CSV ingest + validation (`ingest`)
//! - layout key-value store (`layout`)
//! - series exports (CSV/JSON) (`export`)

pub mod export;
pub mod fetch;
pub mod ingest;
pub mod layout;

pub use export::*;
pub use ingest::*;
pub use layout::*;
