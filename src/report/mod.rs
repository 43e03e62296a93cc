//! Reporting utilities: number formatting and terminal text blocks.

pub mod format;
pub mod number;

pub use format::*;
pub use number::*;
