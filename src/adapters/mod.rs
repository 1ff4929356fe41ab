// Adapters layer: concrete implementations of the domain ports (detector sharing, recorded landmarks, overlay, image files).

pub mod detector;
pub mod image_io;
pub mod overlay;
pub mod recorded;

pub use detector::{
    build_source, DetectorFactory, DetectorPool, DetectorWorker, PerCallDetector, SharedDetector,
    SharingStrategy,
};
pub use overlay::SkeletonOverlay;
pub use recorded::{RecordedDetector, Recording};
