use crate::domain::{KeypointSet, Landmark, PoseLandmark};
use crate::utils::error::AnalysisError;

/// Pulls the five left-side points the squat rules need out of a full
/// detector result.
pub fn extract_keypoints(landmarks: &[Landmark]) -> Result<KeypointSet, AnalysisError> {
    let point = |name: PoseLandmark| {
        landmarks
            .get(name.index())
            .copied()
            .ok_or(AnalysisError::IncompleteLandmarks {
                expected: PoseLandmark::COUNT,
                received: landmarks.len(),
            })
    };

    Ok(KeypointSet {
        ankle: point(PoseLandmark::LeftAnkle)?,
        knee: point(PoseLandmark::LeftKnee)?,
        hip: point(PoseLandmark::LeftHip)?,
        shoulder: point(PoseLandmark::LeftShoulder)?,
        foot_index: point(PoseLandmark::LeftFootIndex)?,
    })
}

/// 整組判定：任何一點不可見即整組失敗，不逐點回報
pub fn ensure_visible(keypoints: &KeypointSet, threshold: f32) -> Result<(), AnalysisError> {
    if keypoints.all_visible(threshold) {
        Ok(())
    } else {
        Err(AnalysisError::InsufficientVisibility)
    }
}
