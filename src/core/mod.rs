pub mod analyzer;
pub mod geometry;
pub mod keypoints;
pub mod rules;
pub mod validator;

pub use analyzer::{FrameAnalysis, Outcome, SquatAnalyzer};
pub use geometry::joint_angle;
pub use rules::{FormRule, RuleEngine, RuleEvaluation};
