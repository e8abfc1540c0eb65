use serde::{Deserialize, Deserializer, Serialize};

/// Accepts either a JSON string or a number and keeps it as a string.
/// Identifiers and classification codes come back both ways depending on the table.
fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(serde_json::Value::Null) => None,
        Some(serde_json::Value::String(s)) => Some(s),
        Some(other) => Some(other.to_string()),
    })
}

/// Company record as stored by the analysis service.
///
/// Every financial line item is independently optional. The value is treated as
/// immutable once handed to an analysis run; selecting another company produces
/// a new value.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Company {
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "string_or_number")]
    pub id: Option<String>,
    #[serde(rename = "company")]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "string_or_number")]
    pub nace: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "string_or_number")]
    pub category_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ebit: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub employees: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revenue: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub net_income: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capex: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub d_and_a: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub changes_in_wc: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lt_debt: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub st_debt: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sh_equity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capital_equity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cash: Option<f64>,
}

impl Company {
    /// A company with only its name set
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

/// Envelope status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseStatus {
    Success,
    Error,
    #[serde(other)]
    Unknown,
}

/// Uniform `{status, data?, count?, error?}` wrapper on every service response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub status: ResponseStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            status: ResponseStatus::Success,
            data: Some(data),
            count: None,
            error: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            status: ResponseStatus::Error,
            data: None,
            count: None,
            error: Some(message.into()),
        }
    }

    pub fn with_count(mut self, count: usize) -> Self {
        self.count = Some(count);
        self
    }

    pub fn is_success(&self) -> bool {
        self.status == ResponseStatus::Success
    }

    /// The payload, only when the envelope reports success and actually carries data.
    pub fn into_data(self) -> Option<T> {
        if self.is_success() {
            self.data
        } else {
            None
        }
    }
}

/// The three Frame 1 ratios
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Metric {
    /// Long-term debt to equity (leverage)
    Ltde,
    /// EBITDA margin (profitability)
    EdaMargin,
    /// Labor cost factor
    Fx,
}

impl Metric {
    pub const ALL: [Metric; 3] = [Metric::Ltde, Metric::EdaMargin, Metric::Fx];

    /// Wire key used by the service
    pub fn key(&self) -> &'static str {
        match self {
            Metric::Ltde => "ltde",
            Metric::EdaMargin => "edamargin",
            Metric::Fx => "fx",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Metric::Ltde => "LTDE (Leverage)",
            Metric::EdaMargin => "EDAMARGIN (Profitability)",
            Metric::Fx => "FX (Labor Cost)",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Frame1Metrics {
    #[serde(default)]
    pub ltde: Option<f64>,
    #[serde(default)]
    pub edamargin: Option<f64>,
    #[serde(default)]
    pub fx: Option<f64>,
}

impl Frame1Metrics {
    pub fn get(&self, metric: Metric) -> Option<f64> {
        match metric {
            Metric::Ltde => self.ltde,
            Metric::EdaMargin => self.edamargin,
            Metric::Fx => self.fx,
        }
    }
}

/// Sector distribution for one metric
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PercentileBands {
    #[serde(default)]
    pub p10: Option<f64>,
    #[serde(default)]
    pub p25: Option<f64>,
    #[serde(default)]
    pub p50: Option<f64>,
    #[serde(default)]
    pub p75: Option<f64>,
    #[serde(default)]
    pub p90: Option<f64>,
}

impl PercentileBands {
    /// Bands in ascending order: p10, p25, p50, p75, p90
    pub fn values(&self) -> [Option<f64>; 5] {
        [self.p10, self.p25, self.p50, self.p75, self.p90]
    }
}

/// Sector benchmarks. Empty when the company's category is unknown to the service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SectorPercentiles {
    #[serde(default)]
    pub ltde: Option<PercentileBands>,
    #[serde(default)]
    pub edamargin: Option<PercentileBands>,
    #[serde(default)]
    pub fx: Option<PercentileBands>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nsellside: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nsellside_p50: Option<f64>,
}

impl SectorPercentiles {
    pub fn get(&self, metric: Metric) -> Option<&PercentileBands> {
        match metric {
            Metric::Ltde => self.ltde.as_ref(),
            Metric::EdaMargin => self.edamargin.as_ref(),
            Metric::Fx => self.fx.as_ref(),
        }
    }
}

/// Where a metric falls inside its sector distribution.
/// `position` and `rank` are null when the metric itself is null.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricPosition {
    #[serde(default)]
    pub position: Option<String>,
    #[serde(default)]
    pub rank: Option<String>,
    #[serde(default)]
    pub range: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricPositions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ltde: Option<MetricPosition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edamargin: Option<MetricPosition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fx: Option<MetricPosition>,
}

impl MetricPositions {
    pub fn get(&self, metric: Metric) -> Option<&MetricPosition> {
        match metric {
            Metric::Ltde => self.ltde.as_ref(),
            Metric::EdaMargin => self.edamargin.as_ref(),
            Metric::Fx => self.fx.as_ref(),
        }
    }
}

/// Frame 1: leverage / profitability / labor-cost ratios against sector benchmarks
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Frame1Result {
    #[serde(default)]
    pub company_name: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub category_code: Option<String>,
    #[serde(default)]
    pub metrics: Frame1Metrics,
    #[serde(default)]
    pub sector_percentiles: SectorPercentiles,
    #[serde(default)]
    pub positions: MetricPositions,
}

impl Frame1Result {
    pub fn metric(&self, metric: Metric) -> Option<f64> {
        self.metrics.get(metric)
    }

    pub fn percentiles(&self, metric: Metric) -> Option<&PercentileBands> {
        self.sector_percentiles.get(metric)
    }

    pub fn position(&self, metric: Metric) -> Option<&MetricPosition> {
        self.positions.get(metric)
    }
}

/// Discount-rate parameters the DCF was run with
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValuationParameters {
    #[serde(rename = "Re", default)]
    pub re: Option<f64>,
    #[serde(rename = "Rd", default)]
    pub rd: Option<f64>,
    #[serde(rename = "WACC", default)]
    pub wacc: Option<f64>,
    #[serde(rename = "g", default)]
    pub g: Option<f64>,
}

/// Frame 2: current EV against DCF-derived EV
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Frame2Result {
    #[serde(default)]
    pub company_name: Option<String>,
    #[serde(rename = "EV_current")]
    pub ev_current: f64,
    #[serde(rename = "EV_DCF")]
    pub ev_dcf: f64,
    pub growth_expected: f64,
    pub classification: String,
    #[serde(default)]
    pub parameters: ValuationParameters,
    #[serde(rename = "FCF0", default, skip_serializing_if = "Option::is_none")]
    pub fcf0: Option<f64>,
    #[serde(rename = "Terminal_Value", default, skip_serializing_if = "Option::is_none")]
    pub terminal_value: Option<f64>,
}

/// Frame 3: predictability decision-tree leaf
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Frame3Result {
    #[serde(default)]
    pub company_name: Option<String>,
    pub leaf_value: String,
    pub category: String,
    #[serde(default)]
    pub decision_path: Vec<String>,
}

/// Body of `POST /analysis/frame3`.
///
/// Inputs the company record cannot supply are sent as NaN (serialized as
/// `null`); the service treats them as missing.
#[derive(Debug, Clone, Serialize)]
pub struct Frame3Request {
    pub company_name: String,
    pub ev_growth: f64,
    pub nsellside: f64,
    pub nsellside_p50: f64,
    pub ceo_age: Option<f64>,
    pub revenue: f64,
    pub edamargin: f64,
    pub edamargin_p75: f64,
}

impl Frame3Request {
    /// Build the request from the company and the settled Frame 2 outcome.
    /// `frame2` is `None` when Frame 2 failed, in which case growth is taken as zero.
    pub fn new(company: &Company, frame2: Option<&Frame2Result>) -> Self {
        Self {
            company_name: company.name.clone(),
            ev_growth: frame2.map(|f| f.growth_expected).unwrap_or(0.0),
            nsellside: company.net_income.unwrap_or(f64::NAN),
            nsellside_p50: f64::NAN,
            ceo_age: None,
            revenue: company.revenue.unwrap_or(f64::NAN),
            edamargin: f64::NAN,
            edamargin_p75: f64::NAN,
        }
    }
}

/// One row of `POST /analysis/batch`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchValuation {
    pub company: String,
    #[serde(rename = "EV_DCF")]
    pub ev_dcf: f64,
    pub growth_expected: f64,
    pub classification: String,
}

/// `GET /health`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    #[serde(default)]
    pub environment: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_company_accepts_numeric_codes_and_nulls() {
        let company: Company = serde_json::from_value(json!({
            "id": 42,
            "company": "Acme SpA",
            "nace": "2511",
            "category_code": 25,
            "revenue": 5000000.0,
            "net_income": null,
            "unknown_column": "ignored"
        }))
        .unwrap();

        assert_eq!(company.id.as_deref(), Some("42"));
        assert_eq!(company.name, "Acme SpA");
        assert_eq!(company.category_code.as_deref(), Some("25"));
        assert_eq!(company.revenue, Some(5_000_000.0));
        assert_eq!(company.net_income, None);
        assert_eq!(company.cash, None);
    }

    #[test]
    fn test_company_serializes_only_present_fields() {
        let company = Company {
            revenue: Some(1_000.0),
            ..Company::named("Acme")
        };

        let value = serde_json::to_value(&company).unwrap();
        assert_eq!(value, json!({"company": "Acme", "revenue": 1000.0}));
    }

    #[test]
    fn test_envelope_into_data() {
        let ok: ApiResponse<Vec<Company>> =
            serde_json::from_value(json!({"status": "success", "data": [], "count": 0})).unwrap();
        assert!(ok.is_success());
        assert_eq!(ok.count, Some(0));
        assert_eq!(ok.into_data(), Some(vec![]));

        let missing: ApiResponse<Frame3Result> =
            serde_json::from_value(json!({"status": "success"})).unwrap();
        assert_eq!(missing.into_data(), None);

        let failed: ApiResponse<Frame3Result> = serde_json::from_value(json!({
            "status": "error",
            "error": "bad input",
            "data": {"leaf_value": "0", "category": "low growth", "decision_path": []}
        }))
        .unwrap();
        assert_eq!(failed.error.as_deref(), Some("bad input"));
        assert_eq!(failed.into_data(), None);

        let odd: ApiResponse<Frame3Result> =
            serde_json::from_value(json!({"status": "pending"})).unwrap();
        assert_eq!(odd.status, ResponseStatus::Unknown);
    }

    #[test]
    fn test_frame1_with_missing_metric_and_empty_sector() {
        let frame1: Frame1Result = serde_json::from_value(json!({
            "company_name": "Acme",
            "category_code": "25",
            "metrics": {"ltde": 0.42, "edamargin": null, "fx": 0.31},
            "sector_percentiles": {},
            "positions": {
                "ltde": {"position": "P25-P50", "rank": "Q2 (Below Median)", "range": "0.1 | 0.2 | 0.5 | 0.8 | 1.2"},
                "edamargin": {"position": null, "rank": null, "range": "N/A"}
            }
        }))
        .unwrap();

        assert_eq!(frame1.metric(Metric::Ltde), Some(0.42));
        assert_eq!(frame1.metric(Metric::EdaMargin), None);
        assert!(frame1.percentiles(Metric::Ltde).is_none());
        assert_eq!(
            frame1.position(Metric::Ltde).and_then(|p| p.rank.as_deref()),
            Some("Q2 (Below Median)")
        );
        assert_eq!(frame1.position(Metric::EdaMargin).and_then(|p| p.rank.as_deref()), None);
        assert!(frame1.position(Metric::Fx).is_none());
    }

    #[test]
    fn test_frame2_wire_names() {
        let frame2: Frame2Result = serde_json::from_value(json!({
            "company_name": "Acme",
            "EV_current": 1.0e9,
            "EV_DCF": 1.3e9,
            "growth_expected": 0.3,
            "classification": "Top Pick",
            "parameters": {"Re": 0.09, "Rd": null, "WACC": 0.075, "g": 0.02},
            "FCF0": 5.0e7,
            "Terminal_Value": 9.0e8
        }))
        .unwrap();

        assert_eq!(frame2.ev_dcf, 1.3e9);
        assert_eq!(frame2.parameters.rd, None);
        assert_eq!(frame2.parameters.wacc, Some(0.075));
        assert_eq!(frame2.terminal_value, Some(9.0e8));
    }

    #[test]
    fn test_frame3_request_defaults_to_nan_sentinels() {
        let company = Company {
            revenue: Some(5_000_000.0),
            ..Company::named("Acme")
        };

        let request = Frame3Request::new(&company, None);
        assert_eq!(request.ev_growth, 0.0);
        assert!(request.nsellside.is_nan());
        assert_eq!(request.revenue, 5_000_000.0);

        let body = serde_json::to_value(&request).unwrap();
        assert_eq!(body["company_name"], "Acme");
        assert_eq!(body["nsellside"], serde_json::Value::Null);
        assert_eq!(body["nsellside_p50"], serde_json::Value::Null);
        assert_eq!(body["ceo_age"], serde_json::Value::Null);
        assert_eq!(body["edamargin_p75"], serde_json::Value::Null);
    }

    #[test]
    fn test_frame3_request_uses_frame2_growth() {
        let company = Company {
            net_income: Some(250_000.0),
            ..Company::named("Acme")
        };
        let frame2 = Frame2Result {
            growth_expected: 0.27,
            classification: "Top Pick".to_string(),
            ..Frame2Result::default()
        };

        let request = Frame3Request::new(&company, Some(&frame2));
        assert_eq!(request.ev_growth, 0.27);
        assert_eq!(request.nsellside, 250_000.0);
        assert!(request.revenue.is_nan());
    }
}
