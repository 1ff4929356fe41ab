use crate::domain::Frame;
use crate::utils::error::AnalysisError;

/// Rejects a frame that is absent, empty, or whose buffer does not match its
/// declared dimensions. Runs before anything touches the detector.
pub fn validate_frame(frame: Option<&mut Frame>) -> Result<&mut Frame, AnalysisError> {
    let frame = frame.ok_or(AnalysisError::InvalidFrame)?;

    if frame.byte_size() == 0 || frame.width() == 0 || frame.height() == 0 {
        return Err(AnalysisError::InvalidFrame);
    }

    // 寬高與緩衝區長度不符 → 尺寸無法判定
    if !frame.has_consistent_size() {
        tracing::debug!(
            "Frame buffer of {} bytes does not match {}x{}",
            frame.byte_size(),
            frame.width(),
            frame.height()
        );
        return Err(AnalysisError::InvalidFrame);
    }

    Ok(frame)
}
