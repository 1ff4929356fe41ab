pub mod batch;
pub mod report;

pub use batch::{BatchRunner, BatchSummary, FrameReport};
pub use report::write_csv_report;
