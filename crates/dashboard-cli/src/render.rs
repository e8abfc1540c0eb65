use analysis_core::{BatchValuation, Company, Frame1Result, Frame2Result, Frame3Result, HealthStatus, Metric};
use analysis_orchestrator::{AnalysisState, SearchState, Stage, StageState};
use result_classifier::{
    benchmark_row, format_currency, format_growth, format_metric, format_percentile, leaf_score,
    ranked_positions, RankedMetric, ValuationClass, NOT_AVAILABLE,
};
use serde::Serialize;
use std::fmt::Write;

/// Turns orchestrator and search snapshots into printable output
pub trait Renderer {
    fn health(&self, health: &HealthStatus) -> String;
    fn search(&self, state: &SearchState) -> String;
    fn header(&self, company: &Company) -> String;
    fn stage(&self, state: &AnalysisState, stage: Stage) -> String;
    fn batch(&self, rows: &[BatchValuation]) -> String;
}

/// Human-readable terminal output
pub struct TextRenderer;

/// One JSON document per call, suitable for piping
pub struct JsonRenderer;

impl Renderer for TextRenderer {
    fn health(&self, health: &HealthStatus) -> String {
        format!(
            "Service: {} (environment: {}, version: {})",
            health.status,
            health.environment.as_deref().unwrap_or(NOT_AVAILABLE),
            health.version.as_deref().unwrap_or(NOT_AVAILABLE)
        )
    }

    fn search(&self, state: &SearchState) -> String {
        if let Some(error) = &state.error {
            return format!("Search failed: {}", error);
        }
        if state.results.is_empty() {
            return "Enter a company name to search".to_string();
        }

        let mut out = format!("Found {} company(ies)\n", state.results.len());
        for (i, company) in state.results.iter().enumerate() {
            let _ = writeln!(
                out,
                "  [{}] {}  (category {}, revenue {})",
                i,
                company.name,
                company.category_code.as_deref().unwrap_or(NOT_AVAILABLE),
                company.revenue.map(format_currency).unwrap_or_else(|| NOT_AVAILABLE.to_string())
            );
        }
        out.trim_end().to_string()
    }

    fn header(&self, company: &Company) -> String {
        format!("Company Analysis: {}", company.name)
    }

    fn stage(&self, state: &AnalysisState, stage: Stage) -> String {
        let title = format!("Frame {}: {}", stage.number(), stage.title());
        let body = match stage {
            Stage::Frame1 => text_stage(&state.frame1, text_frame1),
            Stage::Frame2 => text_stage(&state.frame2, text_frame2),
            Stage::Frame3 => text_stage(&state.frame3, text_frame3),
        };
        format!("{}\n{}", title, body)
    }

    fn batch(&self, rows: &[BatchValuation]) -> String {
        if rows.is_empty() {
            return "No companies could be valued".to_string();
        }

        let mut out = String::new();
        for row in rows {
            let _ = writeln!(
                out,
                "  {:<32} {:<15} growth {:>9}  EV (DCF) {}",
                row.company,
                ValuationClass::from_label(&row.classification).label(),
                format_growth(row.growth_expected),
                format_currency(row.ev_dcf)
            );
        }
        out.trim_end().to_string()
    }
}

fn text_stage<T>(stage: &StageState<T>, render: fn(&T) -> String) -> String {
    match stage {
        StageState::Idle => "  not started".to_string(),
        StageState::Loading => "  loading...".to_string(),
        StageState::Failed(message) => format!("  error: {}", message),
        StageState::Succeeded(result) => render(result),
    }
}

fn text_frame1(frame1: &Frame1Result) -> String {
    let mut out = String::new();
    for ranked in ranked_positions(frame1) {
        let _ = writeln!(
            out,
            "  {:<28} {:>10}  {}{}",
            ranked.metric.label(),
            format_metric(ranked.metric, ranked.value),
            ranked.rank.as_deref().unwrap_or(NOT_AVAILABLE),
            ranked
                .position
                .as_deref()
                .map(|p| format!(" [{}]", p))
                .unwrap_or_default()
        );
    }

    let _ = writeln!(out, "  Sector benchmarks (P10 | P25 | P50 | P75 | P90)");
    for metric in Metric::ALL {
        let _ = writeln!(
            out,
            "    {:<10} {}",
            format!("{}:", metric.key().to_uppercase()),
            benchmark_row(frame1.percentiles(metric))
        );
    }
    out.trim_end().to_string()
}

fn text_frame2(frame2: &Frame2Result) -> String {
    let params = &frame2.parameters;
    [
        format!("  Current EV      {}", format_currency(frame2.ev_current)),
        format!("  DCF EV          {}", format_currency(frame2.ev_dcf)),
        format!("  EV growth       {}", format_growth(frame2.growth_expected)),
        format!(
            "  Classification  {}",
            ValuationClass::from_label(&frame2.classification).label()
        ),
        format!(
            "  Re {}  Rd {}  WACC {}  g {}",
            format_percentile(params.re),
            format_percentile(params.rd),
            format_percentile(params.wacc),
            format_percentile(params.g)
        ),
    ]
    .join("\n")
}

fn text_frame3(frame3: &Frame3Result) -> String {
    let mut out = format!(
        "  Leaf value  {} ({})\n  Category    {}\n  Decision path:",
        frame3.leaf_value,
        leaf_score(&frame3.leaf_value)
            .map(|s| format!("{:.2}", s))
            .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
        frame3.category
    );
    for (i, step) in frame3.decision_path.iter().enumerate() {
        let _ = write!(out, "\n    {}. {}", i + 1, step);
    }
    out
}

impl Renderer for JsonRenderer {
    fn health(&self, health: &HealthStatus) -> String {
        to_json(health)
    }

    fn search(&self, state: &SearchState) -> String {
        to_json(state)
    }

    fn header(&self, company: &Company) -> String {
        to_json(&CompanyHeader { company })
    }

    fn stage(&self, state: &AnalysisState, stage: Stage) -> String {
        let company = state.company.as_ref().map(|c| c.name.as_str());
        match stage {
            Stage::Frame1 => to_json(&StageDocument {
                stage,
                company,
                outcome: &state.frame1,
                ranked: state.frame1.result().map(ranked_positions),
            }),
            Stage::Frame2 => to_json(&StageDocument {
                stage,
                company,
                outcome: &state.frame2,
                ranked: None,
            }),
            Stage::Frame3 => to_json(&StageDocument {
                stage,
                company,
                outcome: &state.frame3,
                ranked: None,
            }),
        }
    }

    fn batch(&self, rows: &[BatchValuation]) -> String {
        to_json(&rows)
    }
}

#[derive(Serialize)]
struct CompanyHeader<'a> {
    company: &'a Company,
}

#[derive(Serialize)]
struct StageDocument<'a, T: Serialize> {
    stage: Stage,
    company: Option<&'a str>,
    outcome: &'a StageState<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    ranked: Option<Vec<RankedMetric>>,
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string(value)
        .unwrap_or_else(|e| serde_json::json!({ "error": e.to_string() }).to_string())
}
