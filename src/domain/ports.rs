use crate::domain::frame::Frame;
use crate::domain::model::{Detection, Landmark};
use crate::utils::error::{DetectorError, RenderError};
use async_trait::async_trait;
use image::RgbImage;
use std::sync::Arc;

/// A pose-estimation model instance. May keep tracking state between calls,
/// so it is driven through `&mut self` and never shared without a
/// [`LandmarkSource`] in front of it.
pub trait PoseDetector: Send + 'static {
    fn detect(&mut self, image: &RgbImage) -> Result<Detection, DetectorError>;

    /// 清除追蹤狀態
    fn reset(&mut self) {}
}

/// What the analyzer calls to turn an RGB image into landmarks.
#[async_trait]
pub trait LandmarkSource: Send + Sync {
    async fn detect(&self, image: RgbImage) -> Result<Detection, DetectorError>;

    async fn reset(&self) -> Result<(), DetectorError>;

    fn strategy_name(&self) -> &'static str;
}

#[async_trait]
impl<T: LandmarkSource + ?Sized> LandmarkSource for Arc<T> {
    async fn detect(&self, image: RgbImage) -> Result<Detection, DetectorError> {
        (**self).detect(image).await
    }

    async fn reset(&self) -> Result<(), DetectorError> {
        (**self).reset().await
    }

    fn strategy_name(&self) -> &'static str {
        (**self).strategy_name()
    }
}

pub trait OverlayRenderer: Send + Sync {
    fn draw(&self, frame: &mut Frame, landmarks: &[Landmark]) -> Result<(), RenderError>;
}
