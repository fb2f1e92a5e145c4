use crate::{orchestrator::RequestState, prediction::Prediction};
use serde::Serialize;

pub const PROGRESS_MESSAGE: &str = "Analyzing image...";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultRow {
    pub athlete: String,
    pub percentage: String,
    pub bar_width: f64,
}

impl From<&Prediction> for ResultRow {
    fn from(prediction: &Prediction) -> Self {
        let percent = prediction.confidence * 100.0;
        Self {
            athlete: prediction.athlete.clone(),
            percentage: format!("{:.1}%", percent),
            bar_width: if percent.is_nan() {
                0.0
            } else {
                percent.clamp(0.0, 100.0)
            },
        }
    }
}

/// What the results panel shows. Pending replaces both errors and results;
/// an error replaces results.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ResultsPanel {
    Empty,
    Progress { message: &'static str },
    Error { message: String },
    Results { rows: Vec<ResultRow> },
}

impl From<&RequestState> for ResultsPanel {
    fn from(state: &RequestState) -> Self {
        match state {
            RequestState::Idle => ResultsPanel::Empty,
            RequestState::Pending => ResultsPanel::Progress {
                message: PROGRESS_MESSAGE,
            },
            RequestState::Failed(message) => ResultsPanel::Error {
                message: message.clone(),
            },
            RequestState::Succeeded(predictions) if predictions.is_empty() => ResultsPanel::Empty,
            RequestState::Succeeded(predictions) => ResultsPanel::Results {
                rows: predictions.iter().map(ResultRow::from).collect(),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassificationView {
    pub image: Option<String>,
    pub status: &'static str,
    pub drag_active: bool,
    pub panel: ResultsPanel,
}

impl ClassificationView {
    pub fn from_state(image: Option<&str>, drag_active: bool, state: &RequestState) -> Self {
        Self {
            image: image.map(str::to_string),
            status: state.as_str(),
            drag_active,
            panel: ResultsPanel::from(state),
        }
    }

    pub fn top_result(&self) -> Option<&ResultRow> {
        match &self.panel {
            ResultsPanel::Results { rows } => rows.first(),
            _ => None,
        }
    }
}
