use crate::app::batch::FrameReport;
use crate::core::analyzer::Outcome;
use crate::utils::error::Result;
use serde::Serialize;
use std::path::Path;

#[derive(Debug, Serialize)]
struct ReportRow<'a> {
    frame: &'a str,
    analyzed_at: String,
    status: &'static str,
    knee_angle: Option<f32>,
    back_angle: Option<f32>,
    feedback: String,
}

impl<'a> From<&'a FrameReport> for ReportRow<'a> {
    fn from(report: &'a FrameReport) -> Self {
        let (knee_angle, back_angle) = match report.analysis.outcome {
            Outcome::Evaluated {
                knee_angle,
                back_angle,
                ..
            } => (knee_angle, back_angle),
            Outcome::Rejected { .. } => (None, None),
        };

        Self {
            frame: &report.frame,
            analyzed_at: report.analyzed_at.to_rfc3339(),
            status: report.analysis.status(),
            knee_angle,
            back_angle,
            feedback: report.analysis.feedback.join(" | "),
        }
    }
}

/// 每幀一列的 CSV 報表
pub fn write_csv_report<P: AsRef<Path>>(path: P, reports: &[FrameReport]) -> Result<()> {
    if let Some(parent) = path.as_ref().parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let mut writer = csv::Writer::from_path(path.as_ref())?;
    for report in reports {
        writer.serialize(ReportRow::from(report))?;
    }
    writer.flush()?;

    tracing::debug!(
        "CSV report with {} rows written to {}",
        reports.len(),
        path.as_ref().display()
    );
    Ok(())
}
