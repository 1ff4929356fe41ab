// Domain layer: frame and landmark types plus the ports the pipeline talks through.

pub mod frame;
pub mod model;
pub mod ports;

pub use frame::{ChannelOrder, Frame};
pub use model::{
    AnalysisSettings, Detection, DetectorMode, DetectorSettings, KeypointSet, Landmark,
    PoseLandmark,
};
pub use ports::{LandmarkSource, OverlayRenderer, PoseDetector};
