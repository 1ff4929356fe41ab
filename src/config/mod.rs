#[cfg(feature = "cli")]
pub mod cli;

use crate::adapters::overlay::{MAX_LINE_THICKNESS, MAX_POINT_RADIUS};
use crate::adapters::SharingStrategy;
use crate::domain::{AnalysisSettings, DetectorMode, DetectorSettings};
use crate::utils::error::{Result, SquatError};
use crate::utils::validation::{
    validate_exclusive_min, validate_path, validate_positive_number, validate_range, Validate,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub analysis: AnalysisSettings,
    pub detector: DetectorConfig,
    pub overlay: OverlayConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DetectorConfig {
    pub mode: DetectorMode,
    /// 未指定時依 mode 決定
    pub strategy: Option<SharingStrategy>,
    pub pool_size: usize,
    pub model_complexity: u8,
    pub min_detection_confidence: f32,
    pub min_tracking_confidence: f32,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        let settings = DetectorSettings::default();
        Self {
            mode: settings.mode,
            strategy: None,
            pool_size: 2,
            model_complexity: settings.model_complexity,
            min_detection_confidence: settings.min_detection_confidence,
            min_tracking_confidence: settings.min_tracking_confidence,
        }
    }
}

impl DetectorConfig {
    pub fn settings(&self) -> DetectorSettings {
        DetectorSettings {
            mode: self.mode,
            model_complexity: self.model_complexity,
            min_detection_confidence: self.min_detection_confidence,
            min_tracking_confidence: self.min_tracking_confidence,
        }
    }

    pub fn resolved_strategy(&self) -> SharingStrategy {
        self.strategy
            .unwrap_or_else(|| SharingStrategy::default_for(self.mode))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OverlayConfig {
    pub enabled: bool,
    pub line_thickness: u32,
    pub point_radius: u32,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            line_thickness: 2,
            point_radius: 3,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    pub annotated_dir: Option<String>,
    pub report_path: Option<String>,
}

impl AppConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(SquatError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| SquatError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${SQUAT_REPORT_DIR})，未設定的保留原字串
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = regex::Regex::new(r"\$\{([^}]+)\}").map_err(|e| SquatError::ConfigError {
            message: format!("environment substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.into_owned())
    }
}

impl Validate for AppConfig {
    fn validate(&self) -> Result<()> {
        validate_range(
            "analysis.visibility_threshold",
            self.analysis.visibility_threshold,
            0.0,
            1.0,
        )?;
        validate_exclusive_min(
            "analysis.angle_threshold_degrees",
            self.analysis.angle_threshold_degrees,
            0.0,
            180.0,
        )?;

        validate_range("detector.model_complexity", self.detector.model_complexity, 0, 2)?;
        validate_range(
            "detector.min_detection_confidence",
            self.detector.min_detection_confidence,
            0.0,
            1.0,
        )?;
        validate_range(
            "detector.min_tracking_confidence",
            self.detector.min_tracking_confidence,
            0.0,
            1.0,
        )?;
        if self.detector.resolved_strategy() == SharingStrategy::Pool {
            validate_positive_number("detector.pool_size", self.detector.pool_size, 1)?;
        }

        validate_range(
            "overlay.line_thickness",
            self.overlay.line_thickness,
            1,
            MAX_LINE_THICKNESS,
        )?;
        validate_range(
            "overlay.point_radius",
            self.overlay.point_radius,
            0,
            MAX_POINT_RADIUS,
        )?;

        if let Some(dir) = &self.output.annotated_dir {
            validate_path("output.annotated_dir", dir)?;
        }
        if let Some(path) = &self.output.report_path {
            validate_path("output.report_path", path)?;
        }

        Ok(())
    }
}
