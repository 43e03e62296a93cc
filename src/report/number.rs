//! Number formatting shared by the summary card, reports and charts.

/// Round to an integer and group thousands with `,` (en-US style).
///
/// Non-finite input formats as `"N/A"`.
pub fn format_number(value: f64) -> String {
    if !value.is_finite() {
        return "N/A".to_string();
    }
    let rounded = value.round();
    let negative = rounded < 0.0;
    let digits = format!("{:.0}", rounded.abs());

    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    if negative {
        out.insert(0, '-');
    }
    out
}

/// Fixed-decimal percentage, e.g. `format_percent(1.23456, 2) == "1.23%"`.
pub fn format_percent(value: f64, decimals: usize) -> String {
    format!("{value:.decimals$}%")
}

/// Round half away from zero to `decimals` places.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Compact axis label: `1.2M`, `350K`, `12`.
pub fn format_compact(value: f64) -> String {
    let abs = value.abs();
    if abs >= 1e9 {
        format!("{:.1}B", value / 1e9)
    } else if abs >= 1e6 {
        format!("{:.1}M", value / 1e6)
    } else if abs >= 1e3 {
        format!("{:.0}K", value / 1e3)
    } else if abs >= 10.0 || abs == 0.0 {
        format!("{value:.0}")
    } else {
        format!("{value:.2}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thousands_separators() {
        assert_eq!(format_number(0.0), "0");
        assert_eq!(format_number(999.4), "999");
        assert_eq!(format_number(1000.0), "1,000");
        assert_eq!(format_number(1234567.6), "1,234,568");
        assert_eq!(format_number(-45000.0), "-45,000");
        assert_eq!(format_number(f64::NAN), "N/A");
    }

    #[test]
    fn percent_and_rounding() {
        assert_eq!(format_percent(54.545454, 1), "54.5%");
        assert_eq!(format_percent(0.0, 2), "0.00%");
        assert_eq!(round_to(2.345678, 2), 2.35);
    }

    #[test]
    fn compact_labels() {
        assert_eq!(format_compact(1_240_000.0), "1.2M");
        assert_eq!(format_compact(35_000.0), "35K");
        assert_eq!(format_compact(12.0), "12");
        assert_eq!(format_compact(0.5), "0.50");
    }
}
