mod common;

use anyhow::Result;
use common::{pose_with_angles, recording_json, upright_pose};
use image::RgbImage;
use squat_form_check::domain::{AnalysisSettings, DetectorSettings};
use squat_form_check::{
    build_source, write_csv_report, BatchRunner, BatchSummary, RecordedDetector, Recording,
    SharingStrategy, SkeletonOverlay, SquatAnalyzer,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

fn write_image(dir: &Path, name: &str) -> Result<PathBuf> {
    let path = dir.join(name);
    RgbImage::from_pixel(32, 32, image::Rgb([40, 40, 40])).save(&path)?;
    Ok(path)
}

/// 四個畫面：良好、膝蓋超前、檔案不存在、未偵測到人
fn batch_fixture(dir: &Path) -> Result<(Arc<Recording>, Vec<PathBuf>)> {
    let json = recording_json(&[
        Some(upright_pose()),
        Some(pose_with_angles(140.5, 170.0)),
        None,
    ]);
    let recording = Arc::new(Recording::from_json_str(&json)?);

    let frames = vec![
        write_image(dir, "rep_01.png")?,
        write_image(dir, "rep_02.png")?,
        dir.join("missing.png"),
        write_image(dir, "rep_04.png")?,
    ];
    Ok((recording, frames))
}

#[tokio::test]
async fn test_batch_with_annotations_and_report() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let (recording, frames) = batch_fixture(temp_dir.path())?;
    let annotated_dir = temp_dir.path().join("annotated");

    let source = build_source(
        SharingStrategy::Shared,
        DetectorSettings::default(),
        1,
        RecordedDetector::factory(recording),
    )?;
    let analyzer = SquatAnalyzer::new(source, AnalysisSettings::default())
        .with_overlay(SkeletonOverlay::default());
    let runner = BatchRunner::new(analyzer).with_annotated_dir(&annotated_dir);

    let reports = runner.run(&frames).await?;
    assert_eq!(reports.len(), 4);
    assert_eq!(runner.progress().frames, 4);

    assert!(reports[0].analysis.feedback.is_empty());
    assert_eq!(
        reports[1].analysis.feedback,
        vec!["Knee goes beyond toe: 140°"]
    );
    // 讀不到的檔案不會消耗錄製的偵測結果
    assert_eq!(
        reports[2].analysis.feedback,
        vec!["Invalid or empty frame received"]
    );
    assert_eq!(
        reports[3].analysis.feedback,
        vec!["Pose landmarks not detected"]
    );

    assert_eq!(
        reports[0].annotated_path.as_deref(),
        Some(annotated_dir.join("rep_01.png").as_path())
    );
    assert!(annotated_dir.join("rep_01.png").exists());
    assert!(annotated_dir.join("rep_02.png").exists());
    assert!(reports[2].annotated_path.is_none());
    assert!(reports[3].annotated_path.is_none());

    let summary = BatchSummary::from_reports(&reports);
    assert_eq!(
        summary,
        BatchSummary {
            total: 4,
            good_form: 1,
            form_errors: 1,
            rejected: 2,
        }
    );

    let report_path = temp_dir.path().join("out").join("report.csv");
    write_csv_report(&report_path, &reports)?;

    let mut reader = csv::Reader::from_path(&report_path)?;
    let headers = reader.headers()?.clone();
    assert_eq!(
        headers.iter().collect::<Vec<_>>(),
        vec![
            "frame",
            "analyzed_at",
            "status",
            "knee_angle",
            "back_angle",
            "feedback"
        ]
    );

    let rows = reader.records().collect::<std::result::Result<Vec<_>, _>>()?;
    assert_eq!(rows.len(), 4);
    assert_eq!(&rows[0][2], "good_form");
    assert_eq!(&rows[1][2], "form_errors");
    assert_eq!(&rows[1][5], "Knee goes beyond toe: 140°");
    assert_eq!(&rows[2][2], "rejected");
    assert_eq!(&rows[2][3], "");
    Ok(())
}

#[test]
fn test_batch_without_overlay_saves_nothing() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let (recording, frames) = batch_fixture(temp_dir.path())?;
    let annotated_dir = temp_dir.path().join("annotated");

    let source = build_source(
        SharingStrategy::PerCall,
        DetectorSettings::default(),
        1,
        RecordedDetector::factory(recording),
    )?;
    let runner = BatchRunner::new(SquatAnalyzer::new(source, AnalysisSettings::default()))
        .with_annotated_dir(&annotated_dir);

    let reports = tokio_test::block_on(runner.run(&frames))?;

    assert_eq!(BatchSummary::from_reports(&reports).total, 4);
    assert!(reports.iter().all(|r| r.annotated_path.is_none()));
    assert!(!annotated_dir.exists());
    Ok(())
}

#[tokio::test]
async fn test_exhausted_recording_is_a_fault() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let recording = Arc::new(Recording::from_json_str(&recording_json(&[Some(
        upright_pose(),
    )]))?);
    let frames = vec![
        write_image(temp_dir.path(), "a.png")?,
        write_image(temp_dir.path(), "b.png")?,
    ];

    let source = build_source(
        SharingStrategy::Worker,
        DetectorSettings::default(),
        1,
        RecordedDetector::factory(recording),
    )?;
    let runner = BatchRunner::new(SquatAnalyzer::new(source, AnalysisSettings::default()));
    let reports = runner.run(&frames).await?;

    assert_eq!(reports[0].analysis.status(), "good_form");
    assert_eq!(
        reports[1].analysis.feedback,
        vec!["Analysis failed: landmark recording exhausted at frame 1"]
    );
    Ok(())
}
