use crate::core::keypoints::{ensure_visible, extract_keypoints};
use crate::core::rules::{RuleEngine, RuleEvaluation};
use crate::core::validator::validate_frame;
use crate::domain::{AnalysisSettings, Detection, Frame, LandmarkSource, OverlayRenderer};
use crate::utils::error::{panic_message, AnalysisError, DetectorError, FailureCategory};
use serde::Serialize;
use std::panic::AssertUnwindSafe;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    Evaluated {
        knee_angle: Option<f32>,
        back_angle: Option<f32>,
        overlay_drawn: bool,
    },
    Rejected { error: AnalysisError },
}

/// Feedback for one frame. An empty `feedback` on an evaluated frame means no
/// form errors were found; a rejected frame always carries one diagnostic.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameAnalysis {
    pub feedback: Vec<String>,
    pub outcome: Outcome,
}

impl FrameAnalysis {
    fn evaluated(evaluation: RuleEvaluation, overlay_drawn: bool) -> Self {
        Self {
            feedback: evaluation.feedback,
            outcome: Outcome::Evaluated {
                knee_angle: evaluation.knee_angle,
                back_angle: evaluation.back_angle,
                overlay_drawn,
            },
        }
    }

    fn rejected(error: AnalysisError) -> Self {
        Self {
            feedback: vec![error.to_string()],
            outcome: Outcome::Rejected { error },
        }
    }

    pub fn is_evaluated(&self) -> bool {
        matches!(self.outcome, Outcome::Evaluated { .. })
    }

    pub fn error(&self) -> Option<&AnalysisError> {
        match &self.outcome {
            Outcome::Rejected { error } => Some(error),
            Outcome::Evaluated { .. } => None,
        }
    }

    pub fn status(&self) -> &'static str {
        match &self.outcome {
            Outcome::Evaluated { .. } if self.feedback.is_empty() => "good_form",
            Outcome::Evaluated { .. } => "form_errors",
            Outcome::Rejected { .. } => "rejected",
        }
    }
}

struct Evaluation {
    rules: RuleEvaluation,
    overlay_drawn: bool,
}

/// Frame-to-feedback pipeline: validation, detection, keypoint gating, angle
/// rules and the overlay, in that order. Every failure ends the frame with a
/// single diagnostic; nothing is retried.
pub struct SquatAnalyzer<S: LandmarkSource> {
    source: S,
    rules: RuleEngine,
    settings: AnalysisSettings,
    overlay: Option<Box<dyn OverlayRenderer>>,
}

impl<S: LandmarkSource> SquatAnalyzer<S> {
    pub fn new(source: S, settings: AnalysisSettings) -> Self {
        Self {
            source,
            rules: RuleEngine::new(settings.angle_threshold_degrees),
            settings,
            overlay: None,
        }
    }

    pub fn with_overlay<R: OverlayRenderer + 'static>(mut self, renderer: R) -> Self {
        self.overlay = Some(Box::new(renderer));
        self
    }

    pub fn settings(&self) -> &AnalysisSettings {
        &self.settings
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// 清除偵測器的追蹤狀態 (例如換了一段影片)
    pub async fn reset(&self) -> Result<(), DetectorError> {
        self.source.reset().await
    }

    pub async fn analyze(&self, frame: Option<&mut Frame>) -> FrameAnalysis {
        match self.evaluate(frame).await {
            Ok(evaluation) => {
                tracing::debug!(
                    "Frame evaluated: knee={:?} back={:?} feedback={:?}",
                    evaluation.rules.knee_angle,
                    evaluation.rules.back_angle,
                    evaluation.rules.feedback
                );
                FrameAnalysis::evaluated(evaluation.rules, evaluation.overlay_drawn)
            }
            Err(error) => {
                match error.category() {
                    FailureCategory::Anticipated => {
                        tracing::info!("Frame rejected: {}", error)
                    }
                    FailureCategory::Unanticipated => {
                        tracing::error!(
                            "❌ Unexpected fault during analysis ({}): {}",
                            self.source.strategy_name(),
                            error
                        )
                    }
                }
                FrameAnalysis::rejected(error)
            }
        }
    }

    /// [`analyze`](Self::analyze) bounded by `limit`. A detection that is
    /// still running when the limit expires keeps going in the background;
    /// the frame is reported as a fault and left without an overlay.
    pub async fn analyze_with_timeout(
        &self,
        frame: Option<&mut Frame>,
        limit: Duration,
    ) -> FrameAnalysis {
        match tokio::time::timeout(limit, self.analyze(frame)).await {
            Ok(analysis) => analysis,
            Err(_) => {
                let error =
                    AnalysisError::DetectorFault(format!("detection timed out after {:?}", limit));
                tracing::error!("❌ {}", error);
                FrameAnalysis::rejected(error)
            }
        }
    }

    async fn evaluate(&self, frame: Option<&mut Frame>) -> Result<Evaluation, AnalysisError> {
        let frame = validate_frame(frame)?;

        let image = frame.to_rgb_image().ok_or(AnalysisError::InvalidFrame)?;
        let landmarks = match self.source.detect(image).await? {
            Detection::NoLandmarks => return Err(AnalysisError::NoLandmarksDetected),
            Detection::Landmarks(landmarks) => landmarks,
        };
        tracing::debug!("Detector returned {} landmarks", landmarks.len());

        let keypoints = extract_keypoints(&landmarks)?;
        ensure_visible(&keypoints, self.settings.visibility_threshold)?;

        let rules = self.rules.evaluate(&keypoints);

        let overlay_drawn = match &self.overlay {
            Some(renderer) => {
                // 繪圖錯誤或 panic 都只讓這一幀失敗
                std::panic::catch_unwind(AssertUnwindSafe(|| renderer.draw(frame, &landmarks)))
                    .map_err(|payload| {
                        AnalysisError::DetectorFault(format!(
                            "overlay renderer panicked: {}",
                            panic_message(payload)
                        ))
                    })??;
                true
            }
            None => false,
        };

        Ok(Evaluation {
            rules,
            overlay_drawn,
        })
    }
}
