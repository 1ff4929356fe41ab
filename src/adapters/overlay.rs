use crate::domain::{Frame, Landmark, OverlayRenderer, PoseLandmark};
use crate::utils::error::RenderError;
use imageproc::drawing::{draw_filled_circle_mut, draw_line_segment_mut};

use crate::domain::PoseLandmark::*;

/// MediaPipe Pose 骨架連線
pub const POSE_CONNECTIONS: [(PoseLandmark, PoseLandmark); 35] = [
    // 臉
    (Nose, LeftEyeInner),
    (LeftEyeInner, LeftEye),
    (LeftEye, LeftEyeOuter),
    (LeftEyeOuter, LeftEar),
    (Nose, RightEyeInner),
    (RightEyeInner, RightEye),
    (RightEye, RightEyeOuter),
    (RightEyeOuter, RightEar),
    (MouthLeft, MouthRight),
    // 上半身
    (LeftShoulder, RightShoulder),
    (LeftShoulder, LeftElbow),
    (LeftElbow, LeftWrist),
    (LeftWrist, LeftPinky),
    (LeftWrist, LeftIndex),
    (LeftWrist, LeftThumb),
    (LeftPinky, LeftIndex),
    (RightShoulder, RightElbow),
    (RightElbow, RightWrist),
    (RightWrist, RightPinky),
    (RightWrist, RightIndex),
    (RightWrist, RightThumb),
    (RightPinky, RightIndex),
    // 軀幹
    (LeftShoulder, LeftHip),
    (RightShoulder, RightHip),
    (LeftHip, RightHip),
    // 下半身
    (LeftHip, LeftKnee),
    (RightHip, RightKnee),
    (LeftKnee, LeftAnkle),
    (RightKnee, RightAnkle),
    (LeftAnkle, LeftHeel),
    (RightAnkle, RightHeel),
    (LeftHeel, LeftFootIndex),
    (RightHeel, RightFootIndex),
    (LeftAnkle, LeftFootIndex),
    (RightAnkle, RightFootIndex),
];

/// 骨架線顏色 (RGB)
pub const CONNECTION_COLOR: [u8; 3] = [224, 224, 224];

/// 關鍵點顏色 (RGB)
pub const LANDMARK_COLOR: [u8; 3] = [255, 0, 0];

pub const MAX_LINE_THICKNESS: u32 = 32;
pub const MAX_POINT_RADIUS: u32 = 64;

/// Draws the detected skeleton straight into the frame buffer.
#[derive(Debug, Clone)]
pub struct SkeletonOverlay {
    visibility_threshold: f32,
    line_thickness: u32,
    point_radius: u32,
}

impl SkeletonOverlay {
    pub fn new(visibility_threshold: f32, line_thickness: u32, point_radius: u32) -> Self {
        Self {
            visibility_threshold,
            line_thickness: line_thickness.max(1),
            point_radius,
        }
    }

    fn visible<'a>(&self, landmarks: &'a [Landmark], name: PoseLandmark) -> Option<&'a Landmark> {
        landmarks
            .get(name.index())
            .filter(|lm| lm.is_visible(self.visibility_threshold))
    }
}

impl Default for SkeletonOverlay {
    fn default() -> Self {
        Self::new(0.5, 2, 3)
    }
}

impl OverlayRenderer for SkeletonOverlay {
    fn draw(&self, frame: &mut Frame, landmarks: &[Landmark]) -> Result<(), RenderError> {
        let (width, height) = (frame.width(), frame.height());
        let order = frame.order();
        let bytes = frame.byte_size();
        let mut canvas = frame.as_image_mut().ok_or(RenderError::BufferMismatch {
            width,
            height,
            bytes,
        })?;

        let line_color = order.pixel(CONNECTION_COLOR);
        let half = (self.line_thickness.min(MAX_LINE_THICKNESS) / 2) as i32;
        let mut segments = 0;
        for (start, end) in POSE_CONNECTIONS {
            let (Some(a), Some(b)) = (self.visible(landmarks, start), self.visible(landmarks, end))
            else {
                continue;
            };
            let (ax, ay) = a.to_pixel(width, height);
            let (bx, by) = b.to_pixel(width, height);
            // 以平移多條線模擬線寬
            for offset in -half..=half {
                draw_line_segment_mut(
                    &mut canvas,
                    (ax.saturating_add(offset) as f32, ay as f32),
                    (bx.saturating_add(offset) as f32, by as f32),
                    line_color,
                );
                draw_line_segment_mut(
                    &mut canvas,
                    (ax as f32, ay.saturating_add(offset) as f32),
                    (bx as f32, by.saturating_add(offset) as f32),
                    line_color,
                );
            }
            segments += 1;
        }

        let point_color = order.pixel(LANDMARK_COLOR);
        let mut points = 0;
        for landmark in landmarks
            .iter()
            .take(PoseLandmark::COUNT)
            .filter(|lm| lm.is_visible(self.visibility_threshold))
        {
            draw_filled_circle_mut(
                &mut canvas,
                landmark.to_pixel(width, height),
                self.point_radius.min(MAX_POINT_RADIUS) as i32,
                point_color,
            );
            points += 1;
        }

        tracing::debug!("Overlay drawn: {} segments, {} points", segments, points);
        Ok(())
    }
}
