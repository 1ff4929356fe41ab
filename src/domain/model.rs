use serde::{Deserialize, Serialize};

/// MediaPipe Pose 的 33 個關鍵點索引
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(usize)]
pub enum PoseLandmark {
    Nose = 0,
    LeftEyeInner = 1,
    LeftEye = 2,
    LeftEyeOuter = 3,
    RightEyeInner = 4,
    RightEye = 5,
    RightEyeOuter = 6,
    LeftEar = 7,
    RightEar = 8,
    MouthLeft = 9,
    MouthRight = 10,
    LeftShoulder = 11,
    RightShoulder = 12,
    LeftElbow = 13,
    RightElbow = 14,
    LeftWrist = 15,
    RightWrist = 16,
    LeftPinky = 17,
    RightPinky = 18,
    LeftIndex = 19,
    RightIndex = 20,
    LeftThumb = 21,
    RightThumb = 22,
    LeftHip = 23,
    RightHip = 24,
    LeftKnee = 25,
    RightKnee = 26,
    LeftAnkle = 27,
    RightAnkle = 28,
    LeftHeel = 29,
    RightHeel = 30,
    LeftFootIndex = 31,
    RightFootIndex = 32,
}

impl PoseLandmark {
    pub const COUNT: usize = 33;

    pub fn index(self) -> usize {
        self as usize
    }
}

/// 單一關鍵點，座標為正規化影像座標
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    #[serde(default)]
    pub z: f32,
    /// 可見度信心 (0.0〜1.0)
    #[serde(default)]
    pub visibility: f32,
}

impl Landmark {
    pub fn new(x: f32, y: f32, visibility: f32) -> Self {
        Self {
            x,
            y,
            z: 0.0,
            visibility,
        }
    }

    /// Strictly above the threshold; a landmark sitting exactly on it is not trusted.
    pub fn is_visible(&self, threshold: f32) -> bool {
        self.visibility > threshold
    }

    /// Pixel position, clamped to one frame extent on either side so
    /// off-screen or garbage coordinates stay small enough to offset.
    pub fn to_pixel(&self, width: u32, height: u32) -> (i32, i32) {
        fn scale(v: f32, extent: u32) -> i32 {
            let limit = extent.min(i32::MAX as u32 / 4) as f32;
            // NaN 轉型為 0
            (v * limit).clamp(-limit, 2.0 * limit) as i32
        }
        (scale(self.x, width), scale(self.y, height))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Detection {
    NoLandmarks,
    Landmarks(Vec<Landmark>),
}

/// 左側下肢分析所需的五個關鍵點
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KeypointSet {
    pub shoulder: Landmark,
    pub hip: Landmark,
    pub knee: Landmark,
    pub ankle: Landmark,
    pub foot_index: Landmark,
}

impl KeypointSet {
    pub const REQUIRED: [PoseLandmark; 5] = [
        PoseLandmark::LeftAnkle,
        PoseLandmark::LeftKnee,
        PoseLandmark::LeftHip,
        PoseLandmark::LeftShoulder,
        PoseLandmark::LeftFootIndex,
    ];

    pub fn points(&self) -> [&Landmark; 5] {
        [
            &self.ankle,
            &self.knee,
            &self.hip,
            &self.shoulder,
            &self.foot_index,
        ]
    }

    pub fn all_visible(&self, threshold: f32) -> bool {
        self.points().iter().all(|p| p.is_visible(threshold))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnalysisSettings {
    pub visibility_threshold: f32,
    pub angle_threshold_degrees: f32,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            visibility_threshold: 0.5,
            angle_threshold_degrees: 150.0,
        }
    }
}

/// 偵測器是否跨幀保留追蹤狀態
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "snake_case")]
pub enum DetectorMode {
    #[default]
    Tracking,
    Static,
}

/// Settings handed to a detector factory when an instance is built.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DetectorSettings {
    pub mode: DetectorMode,
    pub model_complexity: u8,
    pub min_detection_confidence: f32,
    pub min_tracking_confidence: f32,
}

impl Default for DetectorSettings {
    fn default() -> Self {
        Self {
            mode: DetectorMode::Tracking,
            model_complexity: 1,
            min_detection_confidence: 0.5,
            min_tracking_confidence: 0.5,
        }
    }
}
