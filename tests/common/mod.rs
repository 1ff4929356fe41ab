#![allow(dead_code)]

use image::RgbImage;
use squat_form_check::domain::PoseLandmark;
use squat_form_check::{ChannelOrder, Detection, DetectorError, Frame, Landmark, PoseDetector};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// 以頂點與方向角建立一個點
fn ray(vertex: (f32, f32), direction_deg: f32, length: f32, visibility: f32) -> Landmark {
    let t = direction_deg.to_radians();
    Landmark::new(
        vertex.0 + length * t.cos(),
        vertex.1 + length * t.sin(),
        visibility,
    )
}

/// A full 33-point pose whose left knee and back angles are the given values.
pub fn pose_with_angles(knee_angle: f32, back_angle: f32) -> Vec<Landmark> {
    let knee = (0.5, 0.6);
    let hip = (0.5, 0.4);

    let mut landmarks = vec![Landmark::new(0.5, 0.5, 0.9); PoseLandmark::COUNT];
    landmarks[PoseLandmark::LeftKnee.index()] = Landmark::new(knee.0, knee.1, 0.9);
    landmarks[PoseLandmark::LeftAnkle.index()] = ray(knee, 90.0, 0.2, 0.9);
    landmarks[PoseLandmark::LeftFootIndex.index()] = ray(knee, 90.0 - knee_angle, 0.15, 0.9);
    landmarks[PoseLandmark::LeftHip.index()] = Landmark::new(hip.0, hip.1, 0.9);
    landmarks[PoseLandmark::LeftShoulder.index()] = ray(hip, 90.0 - back_angle, 0.2, 0.9);
    landmarks
}

pub fn upright_pose() -> Vec<Landmark> {
    pose_with_angles(175.0, 178.0)
}

pub fn bgr_frame(width: u32, height: u32) -> Frame {
    Frame::from_raw(
        width,
        height,
        ChannelOrder::Bgr,
        vec![0; (width * height * 3) as usize],
    )
}

/// 記錄同時進行中的 detect 呼叫數
#[derive(Debug, Default)]
pub struct ConcurrencyGauge {
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    calls: AtomicUsize,
}

impl ConcurrencyGauge {
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn enter(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
    }

    fn leave(&self) {
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Blocking detector that holds each call open long enough for overlap to show.
pub struct SlowDetector {
    gauge: Arc<ConcurrencyGauge>,
    landmarks: Vec<Landmark>,
    delay: Duration,
}

impl SlowDetector {
    pub fn new(gauge: Arc<ConcurrencyGauge>) -> Self {
        Self {
            gauge,
            landmarks: upright_pose(),
            delay: Duration::from_millis(10),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

impl PoseDetector for SlowDetector {
    fn detect(&mut self, _image: &RgbImage) -> Result<Detection, DetectorError> {
        self.gauge.enter();
        std::thread::sleep(self.delay);
        self.gauge.leave();
        Ok(Detection::Landmarks(self.landmarks.clone()))
    }
}

/// Records the first pixel of every image it receives.
pub struct PixelSpy {
    pub seen: Arc<std::sync::Mutex<Vec<[u8; 3]>>>,
}

impl PoseDetector for PixelSpy {
    fn detect(&mut self, image: &RgbImage) -> Result<Detection, DetectorError> {
        if let Ok(mut seen) = self.seen.lock() {
            seen.push(image.get_pixel(0, 0).0);
        }
        Ok(Detection::Landmarks(upright_pose()))
    }
}

pub fn recording_json(entries: &[Option<Vec<Landmark>>]) -> String {
    let frames: Vec<serde_json::Value> = entries
        .iter()
        .map(|landmarks| serde_json::json!({ "score": 0.9, "landmarks": landmarks }))
        .collect();
    serde_json::json!({ "frames": frames }).to_string()
}
