pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::cli::CliArgs;

pub use adapters::{build_source, RecordedDetector, Recording, SharingStrategy, SkeletonOverlay};
pub use app::{write_csv_report, BatchRunner, BatchSummary, FrameReport};
pub use config::AppConfig;
pub use core::{FrameAnalysis, Outcome, SquatAnalyzer};
pub use domain::{ChannelOrder, Detection, Frame, Landmark, LandmarkSource, PoseDetector};
pub use utils::error::{AnalysisError, DetectorError, Result, SquatError};
