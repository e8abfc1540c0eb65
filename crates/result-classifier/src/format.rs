use analysis_core::{Metric, PercentileBands};

pub const NOT_AVAILABLE: &str = "N/A";

/// A single percentile band: 4 decimals, or "N/A" when absent
pub fn format_percentile(value: Option<f64>) -> String {
    match value {
        Some(v) if v.is_finite() => format!("{:.4}", v),
        _ => NOT_AVAILABLE.to_string(),
    }
}

/// "p10 | p25 | p50 | p75 | p90". Missing sectors render five "N/A"s so rows
/// for every metric line up.
pub fn benchmark_row(bands: Option<&PercentileBands>) -> String {
    let values = bands.map(|b| b.values()).unwrap_or([None; 5]);
    values
        .iter()
        .map(|v| format_percentile(*v))
        .collect::<Vec<_>>()
        .join(" | ")
}

/// A Frame 1 metric value. EDAMARGIN is a ratio shown as a percentage.
/// Missing values are "N/A", never zero.
pub fn format_metric(metric: Metric, value: Option<f64>) -> String {
    match value {
        Some(v) if v.is_finite() => match metric {
            Metric::EdaMargin => format!("{:.2}%", v * 100.0),
            Metric::Ltde | Metric::Fx => format!("{:.4}", v),
        },
        _ => NOT_AVAILABLE.to_string(),
    }
}

/// Growth ratio as a percentage, e.g. 0.1534 -> "15.34%"
pub fn format_growth(growth: f64) -> String {
    if growth.is_finite() {
        format!("{:.2}%", growth * 100.0)
    } else {
        NOT_AVAILABLE.to_string()
    }
}

/// Abbreviated amount: T/B/M/K at 2 decimals, plain 2 decimals below a thousand.
/// Negative amounts keep their sign.
pub fn format_currency(value: f64) -> String {
    if !value.is_finite() {
        return NOT_AVAILABLE.to_string();
    }

    let sign = if value < 0.0 { "-" } else { "" };
    let magnitude = value.abs();

    if magnitude >= 1e12 {
        format!("{}{:.2}T", sign, magnitude / 1e12)
    } else if magnitude >= 1e9 {
        format!("{}{:.2}B", sign, magnitude / 1e9)
    } else if magnitude >= 1e6 {
        format!("{}{:.2}M", sign, magnitude / 1e6)
    } else if magnitude >= 1e3 {
        format!("{}{:.2}K", sign, magnitude / 1e3)
    } else {
        format!("{}{:.2}", sign, magnitude)
    }
}
