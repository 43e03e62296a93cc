//! Canonical period keys and down-sampling.
//!
//! Every "group by date" or "group by month" accumulator in the engine is keyed
//! by a canonical string (`YYYY-MM-DD` or `YYYY-MM`). ISO strings sort
//! chronologically, so a `BTreeMap` keyed by them iterates in date order.

use chrono::{Datelike, NaiveDate};

/// Target number of points for down-sampled timelines.
pub const TIMELINE_TARGET_POINTS: usize = 20;

pub fn day_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

pub fn month_key(date: NaiveDate) -> String {
    format!("{:04}-{:02}", date.year(), date.month())
}

/// `"2021-03"` -> `"Mar 2021"`. Unparseable keys are returned unchanged.
pub fn month_label(key: &str) -> String {
    NaiveDate::parse_from_str(&format!("{key}-01"), "%Y-%m-%d")
        .map(|d| d.format("%b %Y").to_string())
        .unwrap_or_else(|_| key.to_string())
}

/// Stride used to thin a series of `len` points down to roughly `target`.
pub fn stride(len: usize, target: usize) -> usize {
    (len / target.max(1)).max(1)
}

/// Keep the first element of every stride block.
///
/// This is not a uniform resample: with `S = max(1, len / target)` the result
/// has `ceil(len / S)` points and always starts with `items[0]`.
pub fn downsample<T: Clone>(items: &[T], target: usize) -> Vec<T> {
    let step = stride(items.len(), target);
    items.iter().step_by(step).cloned().collect()
}
