//! Result-view navigation: a small state machine selecting which view is
//! rendered and which candidate is selected, holding results in memory so
//! drilling into a candidate and backing out loses nothing.
//!
//! Never touches network state.

use thiserror::Error;
use tracing::debug;

use crate::api::models::{AnalysisResult, BatchResult, CandidateResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Main,
    SingleResults,
    BatchResults,
    CandidateDetail,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum NavError {
    #[error("cannot move from {from:?} to {to:?}")]
    InvalidTransition { from: View, to: View },
    #[error("candidate {index} does not exist (batch has {len})")]
    SelectionOutOfBounds { index: usize, len: usize },
}

#[derive(Debug)]
pub struct NavigationController {
    view: View,
    single: Option<AnalysisResult>,
    batch: Option<BatchResult>,
    selected: Option<usize>,
}

impl Default for NavigationController {
    fn default() -> Self {
        Self::new()
    }
}

impl NavigationController {
    pub fn new() -> Self {
        Self {
            view: View::Main,
            single: None,
            batch: None,
            selected: None,
        }
    }

    pub fn view(&self) -> View {
        self.view
    }

    pub fn single_result(&self) -> Option<&AnalysisResult> {
        self.single.as_ref()
    }

    pub fn batch_result(&self) -> Option<&BatchResult> {
        self.batch.as_ref()
    }

    /// The selected candidate with its positional rank (1-based index in
    /// the server-ordered list, independent of the server `rank` field).
    pub fn selected_candidate(&self) -> Option<(usize, &CandidateResult)> {
        match (self.view(), self.selected, self.batch.as_ref()) {
            (View::CandidateDetail, Some(index), Some(batch)) => {
                batch.candidates.get(index).map(|c| (index + 1, c))
            }
            _ => None,
        }
    }

    /// Single analysis succeeded: `Main → SingleResults`.
    pub fn show_single(&mut self, result: AnalysisResult) -> Result<(), NavError> {
        self.require(View::Main, View::SingleResults)?;
        self.single = Some(result);
        self.view = View::SingleResults;
        debug!("View: main -> single results");
        Ok(())
    }

    /// Batch analysis succeeded: `Main → BatchResults`.
    pub fn show_batch(&mut self, batch: BatchResult) -> Result<(), NavError> {
        self.require(View::Main, View::BatchResults)?;
        self.batch = Some(batch);
        self.view = View::BatchResults;
        debug!("View: main -> batch results");
        Ok(())
    }

    /// Drill into one candidate: `BatchResults → CandidateDetail`.
    pub fn select_candidate(&mut self, index: usize) -> Result<(), NavError> {
        self.require(View::BatchResults, View::CandidateDetail)?;
        let len = self.batch.as_ref().map(|b| b.candidates.len()).unwrap_or(0);
        if index >= len {
            return Err(NavError::SelectionOutOfBounds { index, len });
        }
        self.selected = Some(index);
        self.view = View::CandidateDetail;
        debug!(index, "View: batch results -> candidate detail");
        Ok(())
    }

    /// Back out of the detail view, batch data intact.
    pub fn back(&mut self) -> Result<(), NavError> {
        self.require(View::CandidateDetail, View::BatchResults)?;
        self.selected = None;
        self.view = View::BatchResults;
        debug!("View: candidate detail -> batch results");
        Ok(())
    }

    /// Explicit reset from any view back to `Main`, clearing every piece of
    /// held result state. The caller is responsible for clearing its file
    /// selection and job description alongside.
    pub fn reset(&mut self) {
        self.single = None;
        self.batch = None;
        self.selected = None;
        self.view = View::Main;
        debug!("View: reset to main");
    }

    fn require(&self, expected: View, to: View) -> Result<(), NavError> {
        let from = self.view();
        if from != expected {
            return Err(NavError::InvalidTransition { from, to });
        }
        Ok(())
    }
}
