//! Wire models for the analysis service API.
//!
//! Field names follow the server's JSON exactly; everything the server may
//! omit is `Option` and goes through one documented precedence rule instead
//! of ad hoc fallback chains at call sites.

use serde::{Deserialize, Serialize};

/// Nested model metadata as returned by `/health` and `/quick-check`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelInfo {
    pub name: String,
}

/// `GET /health` response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HealthResponse {
    #[serde(default)]
    pub ai_provider_configured: bool,
    #[serde(default)]
    pub available_keys: Option<u32>,
    #[serde(default)]
    pub ai_warmup_complete: Option<bool>,
    #[serde(default)]
    pub model_info: Option<ModelInfo>,
    #[serde(default)]
    pub model: Option<String>,
}

/// `GET /warmup` response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WarmupResponse {
    #[serde(default)]
    pub warmup_complete: bool,
    #[serde(default)]
    pub model_info: Option<ModelInfo>,
    #[serde(default)]
    pub model: Option<String>,
}

/// `GET /quick-check` response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct QuickCheckResponse {
    #[serde(default)]
    pub available: bool,
    #[serde(default)]
    pub warmup_complete: bool,
    #[serde(default)]
    pub model_info: Option<ModelInfo>,
    #[serde(default)]
    pub model: Option<String>,
}

/// Display-name precedence: the nested `model_info.name` wins over the flat
/// `model` field; both absent means no name is shown.
pub fn display_model_name(model_info: Option<&ModelInfo>, model: Option<&str>) -> Option<String> {
    model_info
        .map(|m| m.name.clone())
        .or_else(|| model.map(|m| m.to_string()))
}

impl HealthResponse {
    pub fn model_name(&self) -> Option<String> {
        display_model_name(self.model_info.as_ref(), self.model.as_deref())
    }
}

impl WarmupResponse {
    pub fn model_name(&self) -> Option<String> {
        display_model_name(self.model_info.as_ref(), self.model.as_deref())
    }
}

impl QuickCheckResponse {
    pub fn model_name(&self) -> Option<String> {
        display_model_name(self.model_info.as_ref(), self.model.as_deref())
    }
}

/// Full single-resume analysis result, including the server-issued handle
/// for downloading the rendered report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub candidate_name: String,
    pub overall_score: u32,
    #[serde(default)]
    pub matched_skills: Vec<String>,
    #[serde(default)]
    pub missing_skills: Vec<String>,
    #[serde(default)]
    pub experience_summary: Option<String>,
    #[serde(default)]
    pub education_summary: Option<String>,
    #[serde(default)]
    pub strengths: Vec<String>,
    #[serde(default, alias = "areas_for_improvement")]
    pub improvements: Vec<String>,
    #[serde(default)]
    pub recommendation: Option<String>,
    #[serde(alias = "report_id")]
    pub report_handle: String,
}

impl AnalysisResult {
    pub fn tier(&self) -> ScoreTier {
        ScoreTier::from_score(self.overall_score)
    }
}

/// One candidate inside a batch result. The server assigns `rank`
/// (ascending by score descending) and an `analysis_id` for individual
/// report retrieval; the array order is trusted and never re-sorted here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateResult {
    pub rank: u32,
    pub analysis_id: String,
    #[serde(flatten)]
    pub result: AnalysisResult,
}

/// `POST /analyze-batch` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchResult {
    #[serde(alias = "total_resumes")]
    pub total: u32,
    pub successful: u32,
    pub failed: u32,
    #[serde(default, alias = "results")]
    pub candidates: Vec<CandidateResult>,
}

/// Error payload shapes the service is known to return.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub detail: Option<String>,
}

impl ErrorBody {
    /// Precedence: `error`, then `message`, then `detail`.
    pub fn into_message(self) -> Option<String> {
        self.error.or(self.message).or(self.detail)
    }
}

/// Client-side display tier for an overall score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreTier {
    GreatMatch,
    GoodMatch,
    FairMatch,
    WeakMatch,
}

impl ScoreTier {
    pub fn from_score(score: u32) -> Self {
        match score {
            80.. => ScoreTier::GreatMatch,
            60..=79 => ScoreTier::GoodMatch,
            40..=59 => ScoreTier::FairMatch,
            _ => ScoreTier::WeakMatch,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ScoreTier::GreatMatch => "Great Match",
            ScoreTier::GoodMatch => "Good Match",
            ScoreTier::FairMatch => "Fair Match",
            ScoreTier::WeakMatch => "Weak Match",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_name_prefers_nested_info() {
        let health = HealthResponse {
            model_info: Some(ModelInfo {
                name: "sonnet".to_string(),
            }),
            model: Some("legacy-field".to_string()),
            ..Default::default()
        };
        assert_eq!(health.model_name().as_deref(), Some("sonnet"));
    }

    #[test]
    fn test_model_name_falls_back_to_flat_field() {
        let health = HealthResponse {
            model: Some("flat".to_string()),
            ..Default::default()
        };
        assert_eq!(health.model_name().as_deref(), Some("flat"));
    }

    #[test]
    fn test_model_name_absent_when_both_missing() {
        assert_eq!(HealthResponse::default().model_name(), None);
    }

    #[test]
    fn test_score_of_85_is_great_match() {
        assert_eq!(ScoreTier::from_score(85), ScoreTier::GreatMatch);
        assert_eq!(ScoreTier::from_score(85).label(), "Great Match");
    }

    #[test]
    fn test_tier_boundaries() {
        assert_eq!(ScoreTier::from_score(80), ScoreTier::GreatMatch);
        assert_eq!(ScoreTier::from_score(79), ScoreTier::GoodMatch);
        assert_eq!(ScoreTier::from_score(60), ScoreTier::GoodMatch);
        assert_eq!(ScoreTier::from_score(59), ScoreTier::FairMatch);
        assert_eq!(ScoreTier::from_score(40), ScoreTier::FairMatch);
        assert_eq!(ScoreTier::from_score(39), ScoreTier::WeakMatch);
        assert_eq!(ScoreTier::from_score(0), ScoreTier::WeakMatch);
    }

    #[test]
    fn test_error_body_precedence() {
        let body = ErrorBody {
            error: Some("primary".to_string()),
            message: Some("secondary".to_string()),
            detail: Some("tertiary".to_string()),
        };
        assert_eq!(body.into_message().as_deref(), Some("primary"));

        let body = ErrorBody {
            error: None,
            message: Some("secondary".to_string()),
            detail: Some("tertiary".to_string()),
        };
        assert_eq!(body.into_message().as_deref(), Some("secondary"));
    }

    #[test]
    fn test_analysis_result_accepts_report_id_alias() {
        let json = serde_json::json!({
            "candidate_name": "Ada Lovelace",
            "overall_score": 91,
            "report_id": "rep-123"
        });
        let result: AnalysisResult = serde_json::from_value(json).unwrap();
        assert_eq!(result.report_handle, "rep-123");
        assert!(result.matched_skills.is_empty());
    }

    #[test]
    fn test_batch_result_flattens_candidate_fields() {
        let json = serde_json::json!({
            "total": 2,
            "successful": 2,
            "failed": 0,
            "candidates": [
                {
                    "rank": 1,
                    "analysis_id": "a-1",
                    "candidate_name": "First",
                    "overall_score": 88,
                    "report_handle": "rep-1"
                },
                {
                    "rank": 2,
                    "analysis_id": "a-2",
                    "candidate_name": "Second",
                    "overall_score": 72,
                    "report_handle": "rep-2"
                }
            ]
        });
        let batch: BatchResult = serde_json::from_value(json).unwrap();
        assert_eq!(batch.candidates.len(), 2);
        assert_eq!(batch.candidates[0].result.candidate_name, "First");
        assert_eq!(batch.candidates[1].rank, 2);
    }
}
