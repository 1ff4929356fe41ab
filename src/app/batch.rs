use crate::adapters::image_io::{load_frame, save_frame};
use crate::core::analyzer::{FrameAnalysis, Outcome, SquatAnalyzer};
use crate::domain::LandmarkSource;
use crate::utils::error::Result;
use crate::utils::monitor::{BatchProgress, SystemMonitor};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize)]
pub struct FrameReport {
    pub frame: String,
    pub analyzed_at: DateTime<Utc>,
    pub analysis: FrameAnalysis,
    pub annotated_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub total: usize,
    pub good_form: usize,
    pub form_errors: usize,
    pub rejected: usize,
}

impl BatchSummary {
    pub fn from_reports(reports: &[FrameReport]) -> Self {
        reports.iter().fold(
            BatchSummary {
                total: reports.len(),
                ..BatchSummary::default()
            },
            |mut summary, report| {
                match report.analysis.status() {
                    "good_form" => summary.good_form += 1,
                    "form_errors" => summary.form_errors += 1,
                    _ => summary.rejected += 1,
                }
                summary
            },
        )
    }
}

const PROGRESS_EVERY: usize = 100;

/// Runs one analyzer over frame files in order.
pub struct BatchRunner<S: LandmarkSource> {
    analyzer: SquatAnalyzer<S>,
    annotated_dir: Option<PathBuf>,
    monitor: SystemMonitor,
}

impl<S: LandmarkSource> BatchRunner<S> {
    pub fn new(analyzer: SquatAnalyzer<S>) -> Self {
        Self {
            analyzer,
            annotated_dir: None,
            monitor: SystemMonitor::default(),
        }
    }

    pub fn with_annotated_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.annotated_dir = Some(dir.into());
        self
    }

    pub fn with_monitoring(mut self, enabled: bool) -> Self {
        self.monitor = SystemMonitor::new(enabled);
        self
    }

    pub fn analyzer(&self) -> &SquatAnalyzer<S> {
        &self.analyzer
    }

    pub fn progress(&self) -> BatchProgress {
        self.monitor.progress()
    }

    pub async fn run(&self, frames: &[PathBuf]) -> Result<Vec<FrameReport>> {
        tracing::info!("🏋️ Analyzing {} frames", frames.len());
        self.monitor.log_progress("Batch start");

        let mut reports = Vec::with_capacity(frames.len());
        for (index, path) in frames.iter().enumerate() {
            reports.push(self.run_frame(path).await?);
            self.monitor.frame_done();
            if (index + 1) % PROGRESS_EVERY == 0 {
                self.monitor.log_progress("Batch progress");
            }
        }

        self.monitor.log_progress("Batch complete");
        Ok(reports)
    }

    async fn run_frame(&self, path: &Path) -> Result<FrameReport> {
        // 讀不到的影像等同於沒有畫面
        let mut frame = match load_frame(path) {
            Ok(frame) => Some(frame),
            Err(e) => {
                tracing::warn!("Could not read frame {}: {}", path.display(), e);
                None
            }
        };

        let analysis = self.analyzer.analyze(frame.as_mut()).await;
        let analyzed_at = Utc::now();

        let overlay_drawn = matches!(
            analysis.outcome,
            Outcome::Evaluated {
                overlay_drawn: true,
                ..
            }
        );
        let annotated_path = match (&self.annotated_dir, &frame) {
            (Some(dir), Some(frame)) if overlay_drawn => {
                let file_name = path
                    .file_name()
                    .map(|name| name.to_os_string())
                    .unwrap_or_else(|| "frame.png".into());
                let target = dir.join(file_name);
                save_frame(frame, &target)?;
                tracing::debug!("Annotated frame saved to {}", target.display());
                Some(target)
            }
            _ => None,
        };

        tracing::info!("{}: {:?}", path.display(), analysis.feedback);

        Ok(FrameReport {
            frame: path.display().to_string(),
            analyzed_at,
            analysis,
            annotated_path,
        })
    }
}
