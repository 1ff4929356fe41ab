use crate::adapters::detector::DetectorFactory;
use crate::domain::{Detection, DetectorSettings, Landmark, PoseDetector};
use crate::utils::error::{DetectorError, Result, SquatError};
use image::RgbImage;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// 外部偵測器事先輸出的逐幀關鍵點
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Recording {
    pub frames: Vec<RecordedFrame>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecordedFrame {
    /// Pose presence score reported by the capturing detector, if any.
    #[serde(default)]
    pub score: Option<f32>,
    /// `null` when the detector found no pose in this frame.
    pub landmarks: Option<Vec<Landmark>>,
}

impl Recording {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_json_str(&content)
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        let recording: Recording = serde_json::from_str(content)?;
        if recording.frames.is_empty() {
            return Err(SquatError::RecordingError {
                message: "recording contains no frames".to_string(),
            });
        }
        Ok(recording)
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

/// Replays a [`Recording`] one entry per `detect` call.
///
/// Clones share the playback cursor, so a pool or per-call strategy still
/// walks the recording in call order. `reset` rewinds to the first frame.
#[derive(Debug, Clone)]
pub struct RecordedDetector {
    recording: Arc<Recording>,
    cursor: Arc<AtomicUsize>,
    min_detection_confidence: f32,
}

impl RecordedDetector {
    pub fn new(recording: Arc<Recording>, settings: &DetectorSettings) -> Self {
        Self {
            recording,
            cursor: Arc::new(AtomicUsize::new(0)),
            min_detection_confidence: settings.min_detection_confidence,
        }
    }

    /// Factory whose instances all share one cursor.
    pub fn factory(recording: Arc<Recording>) -> DetectorFactory<Self> {
        let cursor = Arc::new(AtomicUsize::new(0));
        Arc::new(move |settings: &DetectorSettings| {
            Ok(RecordedDetector {
                recording: Arc::clone(&recording),
                cursor: Arc::clone(&cursor),
                min_detection_confidence: settings.min_detection_confidence,
            })
        })
    }

    pub fn position(&self) -> usize {
        self.cursor.load(Ordering::SeqCst)
    }
}

impl PoseDetector for RecordedDetector {
    fn detect(&mut self, _image: &RgbImage) -> std::result::Result<Detection, DetectorError> {
        let index = self.cursor.fetch_add(1, Ordering::SeqCst);
        let entry = self
            .recording
            .frames
            .get(index)
            .ok_or(DetectorError::RecordingExhausted { index })?;

        let detection = match (&entry.landmarks, entry.score) {
            (None, _) => Detection::NoLandmarks,
            (Some(_), Some(score)) if score < self.min_detection_confidence => {
                tracing::debug!(
                    "Recorded frame {} score {:.2} below min_detection_confidence {:.2}",
                    index,
                    score,
                    self.min_detection_confidence
                );
                Detection::NoLandmarks
            }
            (Some(landmarks), _) => Detection::Landmarks(landmarks.clone()),
        };
        Ok(detection)
    }

    fn reset(&mut self) {
        self.cursor.store(0, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RECORDING: &str = r#"{
        "frames": [
            {"score": 0.95, "landmarks": [{"x": 0.1, "y": 0.2, "visibility": 0.9}]},
            {"landmarks": null},
            {"score": 0.3, "landmarks": [{"x": 0.1, "y": 0.2, "z": -0.1, "visibility": 0.9}]}
        ]
    }"#;

    fn image() -> RgbImage {
        RgbImage::new(1, 1)
    }

    #[test]
    fn test_replays_in_order() {
        let recording = Arc::new(Recording::from_json_str(RECORDING).unwrap());
        let mut detector = RecordedDetector::new(recording, &DetectorSettings::default());

        assert!(matches!(
            detector.detect(&image()).unwrap(),
            Detection::Landmarks(ref l) if l.len() == 1
        ));
        assert_eq!(detector.detect(&image()).unwrap(), Detection::NoLandmarks);
        // 分數 0.3 低於預設 0.5
        assert_eq!(detector.detect(&image()).unwrap(), Detection::NoLandmarks);
        assert_eq!(
            detector.detect(&image()).unwrap_err(),
            DetectorError::RecordingExhausted { index: 3 }
        );
    }

    #[test]
    fn test_low_confidence_threshold_accepts_weak_frames() {
        let recording = Arc::new(Recording::from_json_str(RECORDING).unwrap());
        let settings = DetectorSettings {
            min_detection_confidence: 0.2,
            ..DetectorSettings::default()
        };
        let mut detector = RecordedDetector::new(recording, &settings);
        detector.detect(&image()).unwrap();
        detector.detect(&image()).unwrap();

        assert!(matches!(
            detector.detect(&image()).unwrap(),
            Detection::Landmarks(_)
        ));
    }

    #[test]
    fn test_factory_instances_share_cursor() {
        let recording = Arc::new(Recording::from_json_str(RECORDING).unwrap());
        let factory = RecordedDetector::factory(recording);
        let settings = DetectorSettings::default();

        let mut first = factory(&settings).unwrap();
        let mut second = factory(&settings).unwrap();

        assert!(matches!(first.detect(&image()).unwrap(), Detection::Landmarks(_)));
        assert_eq!(second.detect(&image()).unwrap(), Detection::NoLandmarks);
        assert_eq!(first.position(), 2);

        second.reset();
        assert_eq!(first.position(), 0);
    }

    #[test]
    fn test_empty_recording_is_rejected() {
        let err = Recording::from_json_str(r#"{"frames": []}"#).unwrap_err();
        assert!(matches!(err, SquatError::RecordingError { .. }));

        assert!(Recording::from_json_str("not json").is_err());
    }
}
