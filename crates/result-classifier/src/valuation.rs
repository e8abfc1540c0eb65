use analysis_core::BatchValuation;
use serde::Serialize;
use std::cmp::Ordering;

/// Frame 2 valuation label
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ValuationClass {
    TopPick,
    GoodDeal,
    BitOvervalued,
    Unclassified(String),
}

impl ValuationClass {
    pub fn from_label(label: &str) -> Self {
        match label.trim() {
            "Top Pick" => ValuationClass::TopPick,
            "Good Deal" => ValuationClass::GoodDeal,
            "Bit Overvalued" => ValuationClass::BitOvervalued,
            other => ValuationClass::Unclassified(other.to_string()),
        }
    }

    /// Higher is more attractive
    pub fn ordinal(&self) -> u8 {
        match self {
            ValuationClass::TopPick => 3,
            ValuationClass::GoodDeal => 2,
            ValuationClass::BitOvervalued => 1,
            ValuationClass::Unclassified(_) => 0,
        }
    }

    pub fn label(&self) -> &str {
        match self {
            ValuationClass::TopPick => "Top Pick",
            ValuationClass::GoodDeal => "Good Deal",
            ValuationClass::BitOvervalued => "Bit Overvalued",
            ValuationClass::Unclassified(label) => label,
        }
    }
}

/// Numeric value of a decision-tree leaf such as "0,65". The service writes
/// leaves with a decimal comma.
pub fn leaf_score(leaf_value: &str) -> Option<f64> {
    leaf_value
        .trim()
        .replace(',', ".")
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
}

/// Batch rows by valuation class, then by expected growth, best first.
/// Rows with non-finite growth sink to the bottom of their class.
pub fn sort_batch(rows: &mut [BatchValuation]) {
    rows.sort_by(|a, b| {
        let class_a = ValuationClass::from_label(&a.classification).ordinal();
        let class_b = ValuationClass::from_label(&b.classification).ordinal();
        class_b.cmp(&class_a).then_with(|| compare_growth(b.growth_expected, a.growth_expected))
    });
}

fn compare_growth(a: f64, b: f64) -> Ordering {
    match (a.is_finite(), b.is_finite()) {
        (true, true) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => Ordering::Equal,
    }
}
