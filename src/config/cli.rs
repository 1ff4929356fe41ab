use crate::adapters::SharingStrategy;
use crate::config::AppConfig;
use crate::domain::DetectorMode;
use crate::utils::error::Result;
use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "squat-check")]
#[command(about = "Check squat form in video frames using recorded pose landmarks")]
pub struct CliArgs {
    /// Frame images, analyzed in the given order
    #[arg(long, num_args = 1.., required = true)]
    pub frames: Vec<PathBuf>,

    /// JSON recording of landmarks, one entry per frame
    #[arg(long)]
    pub landmarks: PathBuf,

    /// Path to TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Write annotated frames into this directory
    #[arg(long)]
    pub annotated_dir: Option<String>,

    /// Write a CSV report to this path
    #[arg(long)]
    pub report: Option<String>,

    #[arg(long, value_enum)]
    pub mode: Option<DetectorMode>,

    #[arg(long, value_enum)]
    pub strategy: Option<SharingStrategy>,

    #[arg(long)]
    pub visibility_threshold: Option<f32>,

    #[arg(long)]
    pub angle_threshold: Option<f32>,

    /// Skip drawing the skeleton overlay
    #[arg(long)]
    pub no_overlay: bool,

    /// Print per-frame results as JSON lines
    #[arg(long)]
    pub json: bool,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON")]
    pub log_json: bool,

    #[arg(long, help = "Log CPU and memory usage")]
    pub monitor: bool,
}

impl CliArgs {
    /// 載入 TOML (若有) 後套用命令列覆蓋
    pub fn load_config(&self) -> Result<AppConfig> {
        let mut config = match &self.config {
            Some(path) => AppConfig::from_file(path)?,
            None => AppConfig::default(),
        };
        self.apply_overrides(&mut config);
        Ok(config)
    }

    pub fn apply_overrides(&self, config: &mut AppConfig) {
        if let Some(mode) = self.mode {
            config.detector.mode = mode;
        }
        if let Some(strategy) = self.strategy {
            config.detector.strategy = Some(strategy);
        }
        if let Some(threshold) = self.visibility_threshold {
            config.analysis.visibility_threshold = threshold;
        }
        if let Some(threshold) = self.angle_threshold {
            config.analysis.angle_threshold_degrees = threshold;
        }
        if self.no_overlay {
            config.overlay.enabled = false;
        }
        if let Some(dir) = &self.annotated_dir {
            config.output.annotated_dir = Some(dir.clone());
        }
        if let Some(report) = &self.report {
            config.output.report_path = Some(report.clone());
        }
    }
}
