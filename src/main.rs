use clap::Parser;
use squat_form_check::utils::error::ErrorCategory;
use squat_form_check::utils::{logger, validation::Validate};
use squat_form_check::{
    build_source, write_csv_report, AppConfig, BatchRunner, BatchSummary, CliArgs,
    RecordedDetector, Recording, SkeletonOverlay, SquatAnalyzer, SquatError,
};
use std::sync::Arc;

fn exit_code(err: &SquatError) -> i32 {
    match err.category() {
        ErrorCategory::Configuration => 1,
        ErrorCategory::Input => 2,
        ErrorCategory::Detector => 3,
        ErrorCategory::Output => 4,
    }
}

fn fail(err: SquatError) -> ! {
    tracing::error!(
        "❌ squat-check failed: {} (Category: {:?})",
        err,
        err.category()
    );
    eprintln!("❌ {}", err.user_friendly_message());
    eprintln!("💡 Suggestion: {}", err.recovery_suggestion());
    std::process::exit(exit_code(&err));
}

async fn run(args: &CliArgs, config: AppConfig) -> squat_form_check::Result<()> {
    let recording = Arc::new(Recording::from_file(&args.landmarks)?);
    tracing::info!(
        "📁 Loaded {} recorded frames from {}",
        recording.len(),
        args.landmarks.display()
    );
    if recording.len() < args.frames.len() {
        tracing::warn!(
            "Recording has {} entries for {} frames, later frames will fail",
            recording.len(),
            args.frames.len()
        );
    }

    let source = build_source(
        config.detector.resolved_strategy(),
        config.detector.settings(),
        config.detector.pool_size,
        RecordedDetector::factory(recording),
    )?;

    let mut analyzer = SquatAnalyzer::new(source, config.analysis);
    if config.overlay.enabled {
        analyzer = analyzer.with_overlay(SkeletonOverlay::new(
            config.analysis.visibility_threshold,
            config.overlay.line_thickness,
            config.overlay.point_radius,
        ));
    }

    let mut runner = BatchRunner::new(analyzer).with_monitoring(args.monitor);
    if let Some(dir) = &config.output.annotated_dir {
        runner = runner.with_annotated_dir(dir);
    }

    let reports = runner.run(&args.frames).await?;

    for report in &reports {
        if args.json {
            println!("{}", serde_json::to_string(report)?);
        } else if report.analysis.feedback.is_empty() {
            println!("✅ {}: good form", report.frame);
        } else {
            println!("⚠️  {}: {}", report.frame, report.analysis.feedback.join("; "));
        }
    }

    if let Some(path) = &config.output.report_path {
        write_csv_report(path, &reports)?;
        tracing::info!("📁 Report saved to: {}", path);
    }

    let summary = BatchSummary::from_reports(&reports);
    tracing::info!(
        "✅ Done: {} frames, {} good, {} with form errors, {} rejected",
        summary.total,
        summary.good_form,
        summary.form_errors,
        summary.rejected
    );
    Ok(())
}

#[tokio::main]
async fn main() {
    let args = CliArgs::parse();

    if args.log_json {
        logger::init_json_logger(args.verbose);
    } else {
        logger::init_cli_logger(args.verbose);
    }

    tracing::info!("Starting squat-check");

    let config = match args.load_config() {
        Ok(config) => config,
        Err(e) => fail(e),
    };
    if args.verbose {
        tracing::debug!("Effective config: {:?}", config);
    }

    if let Err(e) = config.validate() {
        fail(e);
    }

    if let Err(e) = run(&args, config).await {
        fail(e);
    }
}
