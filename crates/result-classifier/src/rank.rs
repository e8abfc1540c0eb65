use analysis_core::{Frame1Result, Metric};
use serde::Serialize;

const COLOR_EMERALD: &str = "#10b981";
const COLOR_BLUE: &str = "#3b82f6";
const COLOR_AMBER: &str = "#f59e0b";
const COLOR_RED: &str = "#ef4444";
const COLOR_DARK_RED: &str = "#dc2626";
const COLOR_GRAY: &str = "#6b7280";

/// Presentation tier for a sector rank emitted by the service
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum RankTier {
    Neutral,
    Bottom,
    Lower,
    Middle,
    Upper,
    Top,
}

impl RankTier {
    /// Match by substring so decorated labels like "Q4 (High)" still resolve.
    /// Anything unrecognised, including "Exceptional (Bottom)", is `Neutral`.
    pub fn from_rank(rank: &str) -> Self {
        if rank.contains("Exceptional (Top)") {
            RankTier::Top
        } else if rank.contains("Q4") {
            RankTier::Upper
        } else if rank.contains("Q3") {
            RankTier::Middle
        } else if rank.contains("Q2") {
            RankTier::Lower
        } else if rank.contains("Q1") {
            RankTier::Bottom
        } else {
            RankTier::Neutral
        }
    }

    /// 0 for neutral up to 5 for the top tier
    pub fn ordinal(&self) -> u8 {
        match self {
            RankTier::Neutral => 0,
            RankTier::Bottom => 1,
            RankTier::Lower => 2,
            RankTier::Middle => 3,
            RankTier::Upper => 4,
            RankTier::Top => 5,
        }
    }

    pub fn color(&self) -> &'static str {
        match self {
            RankTier::Top => COLOR_EMERALD,
            RankTier::Upper => COLOR_BLUE,
            RankTier::Middle => COLOR_AMBER,
            RankTier::Lower => COLOR_RED,
            RankTier::Bottom => COLOR_DARK_RED,
            RankTier::Neutral => COLOR_GRAY,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RankTier::Top => "Top",
            RankTier::Upper => "Upper quartile",
            RankTier::Middle => "Above median",
            RankTier::Lower => "Below median",
            RankTier::Bottom => "Bottom quartile",
            RankTier::Neutral => "Unranked",
        }
    }
}

/// A Frame 1 metric with its rank annotation resolved to a tier
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedMetric {
    #[serde(skip)]
    pub metric: Metric,
    pub key: &'static str,
    pub value: Option<f64>,
    pub rank: Option<String>,
    pub position: Option<String>,
    pub tier: RankTier,
}

/// All three metrics, best tier first. Ties keep LTDE, EDAMARGIN, FX order.
pub fn ranked_positions(frame1: &Frame1Result) -> Vec<RankedMetric> {
    let mut ranked: Vec<RankedMetric> = Metric::ALL
        .iter()
        .map(|&metric| {
            let position = frame1.position(metric);
            let rank = position.and_then(|p| p.rank.clone());
            let tier = rank.as_deref().map(RankTier::from_rank).unwrap_or(RankTier::Neutral);
            RankedMetric {
                metric,
                key: metric.key(),
                value: frame1.metric(metric),
                rank,
                position: position.and_then(|p| p.position.clone()),
                tier,
            }
        })
        .collect();

    ranked.sort_by(|a, b| b.tier.cmp(&a.tier));
    ranked
}
