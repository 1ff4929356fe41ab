use crate::domain::Frame;
use crate::utils::error::{Result, SquatError};
use std::path::Path;

/// 讀取影像檔為 RGB 畫面
pub fn load_frame<P: AsRef<Path>>(path: P) -> Result<Frame> {
    let image = image::open(path.as_ref())?.to_rgb8();
    Ok(Frame::from_rgb_image(image))
}

pub fn save_frame<P: AsRef<Path>>(frame: &Frame, path: P) -> Result<()> {
    let image = frame.to_rgb_image().ok_or_else(|| SquatError::FrameError {
        message: format!(
            "cannot save a {}x{} frame with a {} byte buffer",
            frame.width(),
            frame.height(),
            frame.byte_size()
        ),
    })?;

    if let Some(parent) = path.as_ref().parent() {
        std::fs::create_dir_all(parent)?;
    }
    image.save(path.as_ref())?;
    Ok(())
}
