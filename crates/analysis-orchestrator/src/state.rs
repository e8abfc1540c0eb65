use analysis_core::{Company, Frame1Result, Frame2Result, Frame3Result};
use serde::Serialize;

/// One of the three analysis frames
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Stage {
    Frame1,
    Frame2,
    Frame3,
}

impl Stage {
    pub const ALL: [Stage; 3] = [Stage::Frame1, Stage::Frame2, Stage::Frame3];

    pub fn number(&self) -> u8 {
        match self {
            Stage::Frame1 => 1,
            Stage::Frame2 => 2,
            Stage::Frame3 => 3,
        }
    }

    /// Message stored when the service answers but the envelope carries no usable data
    pub fn failure_message(&self) -> String {
        format!("Frame {} analysis failed", self.number())
    }

    pub fn title(&self) -> &'static str {
        match self {
            Stage::Frame1 => "Financial Metrics",
            Stage::Frame2 => "Valuation",
            Stage::Frame3 => "Predictability",
        }
    }
}

/// Lifecycle of a single frame within a run
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", content = "value", rename_all = "snake_case")]
pub enum StageState<T> {
    Idle,
    Loading,
    Succeeded(T),
    Failed(String),
}

impl<T> Default for StageState<T> {
    fn default() -> Self {
        StageState::Idle
    }
}

impl<T> StageState<T> {
    pub fn is_loading(&self) -> bool {
        matches!(self, StageState::Loading)
    }

    /// Succeeded or failed
    pub fn is_settled(&self) -> bool {
        matches!(self, StageState::Succeeded(_) | StageState::Failed(_))
    }

    pub fn result(&self) -> Option<&T> {
        match self {
            StageState::Succeeded(result) => Some(result),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            StageState::Failed(message) => Some(message),
            _ => None,
        }
    }
}

impl<T> From<Result<T, String>> for StageState<T> {
    fn from(outcome: Result<T, String>) -> Self {
        match outcome {
            Ok(result) => StageState::Succeeded(result),
            Err(message) => StageState::Failed(message),
        }
    }
}

/// Everything the rendering layer needs to draw an analysis.
///
/// Owned by [`crate::AnalysisOrchestrator`]; consumers only ever see clones.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AnalysisState {
    pub company: Option<Company>,
    pub frame1: StageState<Frame1Result>,
    pub frame2: StageState<Frame2Result>,
    pub frame3: StageState<Frame3Result>,
}

impl AnalysisState {
    /// Start-of-run state: company selected, every frame loading, no errors
    pub fn started(company: Company) -> Self {
        Self {
            company: Some(company),
            frame1: StageState::Loading,
            frame2: StageState::Loading,
            frame3: StageState::Loading,
        }
    }

    pub fn is_loading(&self, stage: Stage) -> bool {
        match stage {
            Stage::Frame1 => self.frame1.is_loading(),
            Stage::Frame2 => self.frame2.is_loading(),
            Stage::Frame3 => self.frame3.is_loading(),
        }
    }

    pub fn error(&self, stage: Stage) -> Option<&str> {
        match stage {
            Stage::Frame1 => self.frame1.error(),
            Stage::Frame2 => self.frame2.error(),
            Stage::Frame3 => self.frame3.error(),
        }
    }

    pub fn is_settled(&self, stage: Stage) -> bool {
        match stage {
            Stage::Frame1 => self.frame1.is_settled(),
            Stage::Frame2 => self.frame2.is_settled(),
            Stage::Frame3 => self.frame3.is_settled(),
        }
    }

    /// Any frame still waiting on the service
    pub fn is_running(&self) -> bool {
        Stage::ALL.iter().any(|stage| self.is_loading(*stage))
    }

    /// A company was analyzed and every frame has settled
    pub fn is_complete(&self) -> bool {
        self.company.is_some() && Stage::ALL.iter().all(|stage| self.is_settled(*stage))
    }

    pub fn has_results(&self) -> bool {
        self.frame1.result().is_some() || self.frame2.result().is_some() || self.frame3.result().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_started_state() {
        let state = AnalysisState::started(Company::named("Acme"));
        assert!(state.is_running());
        assert!(!state.is_complete());
        for stage in Stage::ALL {
            assert!(state.is_loading(stage));
            assert_eq!(state.error(stage), None);
        }
    }

    #[test]
    fn test_complete_requires_all_frames_settled() {
        let mut state = AnalysisState::started(Company::named("Acme"));
        state.frame1 = StageState::Succeeded(Frame1Result::default());
        state.frame2 = StageState::Failed("Frame 2 analysis failed".to_string());
        assert!(state.is_running());
        assert!(!state.is_complete());

        state.frame3 = Err::<Frame3Result, _>("boom".to_string()).into();
        assert!(!state.is_running());
        assert!(state.is_complete());
        assert!(state.has_results());
        assert_eq!(state.error(Stage::Frame3), Some("boom"));
        assert!(state.frame3.result().is_none());
    }

    #[test]
    fn test_default_is_idle_and_incomplete() {
        let state = AnalysisState::default();
        assert!(!state.is_running());
        assert!(!state.is_complete());
        assert_eq!(state.frame1, StageState::Idle);
    }

    #[test]
    fn test_failure_messages() {
        assert_eq!(Stage::Frame1.failure_message(), "Frame 1 analysis failed");
        assert_eq!(Stage::Frame3.failure_message(), "Frame 3 analysis failed");
    }
}
