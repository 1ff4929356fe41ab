use crate::core::geometry::joint_angle;
use crate::domain::KeypointSet;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FormRule {
    /// 膝蓋超過腳尖：踝-膝-腳尖夾角
    KneeOverToe,
    /// 背部過度前傾：肩-髖-膝夾角
    BackBend,
}

impl FormRule {
    /// Evaluation order, which is also the feedback order.
    pub const ORDERED: [FormRule; 2] = [FormRule::KneeOverToe, FormRule::BackBend];

    pub fn measure(self, keypoints: &KeypointSet) -> Option<f32> {
        match self {
            FormRule::KneeOverToe => joint_angle(
                Some(&keypoints.ankle),
                Some(&keypoints.knee),
                Some(&keypoints.foot_index),
            ),
            FormRule::BackBend => joint_angle(
                Some(&keypoints.shoulder),
                Some(&keypoints.hip),
                Some(&keypoints.knee),
            ),
        }
    }

    /// Degrees are truncated toward zero, never rounded.
    pub fn feedback(self, angle: f32) -> String {
        let degrees = angle.trunc() as i32;
        match self {
            FormRule::KneeOverToe => format!("Knee goes beyond toe: {}°", degrees),
            FormRule::BackBend => format!("Back too bent: {}°", degrees),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RuleEvaluation {
    pub knee_angle: Option<f32>,
    pub back_angle: Option<f32>,
    pub violations: Vec<FormRule>,
    pub feedback: Vec<String>,
}

#[derive(Debug, Clone, Copy)]
pub struct RuleEngine {
    angle_threshold_degrees: f32,
}

impl RuleEngine {
    pub fn new(angle_threshold_degrees: f32) -> Self {
        Self {
            angle_threshold_degrees,
        }
    }

    pub fn angle_threshold(&self) -> f32 {
        self.angle_threshold_degrees
    }

    pub fn evaluate(&self, keypoints: &KeypointSet) -> RuleEvaluation {
        let mut evaluation = RuleEvaluation {
            knee_angle: None,
            back_angle: None,
            violations: Vec::new(),
            feedback: Vec::new(),
        };

        for rule in FormRule::ORDERED {
            let angle = rule.measure(keypoints);
            match rule {
                FormRule::KneeOverToe => evaluation.knee_angle = angle,
                FormRule::BackBend => evaluation.back_angle = angle,
            }

            // 角度無法判定時略過該規則
            let Some(angle) = angle else {
                tracing::debug!("Rule {:?} inconclusive, skipped", rule);
                continue;
            };

            if angle < self.angle_threshold_degrees {
                tracing::debug!(
                    "Rule {:?} fired at {:.1}° (threshold {:.1}°)",
                    rule,
                    angle,
                    self.angle_threshold_degrees
                );
                evaluation.violations.push(rule);
                evaluation.feedback.push(rule.feedback(angle));
            }
        }

        evaluation
    }
}

impl Default for RuleEngine {
    fn default() -> Self {
        Self::new(150.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Landmark;

    /// 以頂點與參考方向建立指定夾角的點
    fn ray(vertex: (f32, f32), reference_deg: f32, length: f32) -> Landmark {
        let t = reference_deg.to_radians();
        Landmark::new(vertex.0 + length * t.cos(), vertex.1 + length * t.sin(), 0.9)
    }

    fn keypoints(knee_angle: f32, back_angle: f32) -> KeypointSet {
        let knee = (0.5, 0.6);
        let hip = (0.5, 0.4);
        KeypointSet {
            knee: Landmark::new(knee.0, knee.1, 0.9),
            ankle: ray(knee, 90.0, 0.2),
            foot_index: ray(knee, 90.0 - knee_angle, 0.15),
            hip: Landmark::new(hip.0, hip.1, 0.9),
            shoulder: ray(hip, 90.0 - back_angle, 0.2),
        }
    }

    #[test]
    fn test_knee_rule_fires_alone() {
        let evaluation = RuleEngine::default().evaluate(&keypoints(140.5, 170.0));

        assert_eq!(evaluation.feedback, vec!["Knee goes beyond toe: 140°"]);
        assert_eq!(evaluation.violations, vec![FormRule::KneeOverToe]);
        assert!((evaluation.back_angle.unwrap() - 170.0).abs() < 0.01);
    }

    #[test]
    fn test_back_rule_fires_alone() {
        let evaluation = RuleEngine::default().evaluate(&keypoints(165.0, 120.7));
        assert_eq!(evaluation.feedback, vec!["Back too bent: 120°"]);
    }

    #[test]
    fn test_both_rules_in_fixed_order() {
        // 90.5° 避開浮點誤差落在 89.999° 而截成 89
        let evaluation = RuleEngine::default().evaluate(&keypoints(90.5, 90.5));

        assert_eq!(
            evaluation.violations,
            vec![FormRule::KneeOverToe, FormRule::BackBend]
        );
        assert_eq!(
            evaluation.feedback,
            vec!["Knee goes beyond toe: 90°", "Back too bent: 90°"]
        );
    }

    #[test]
    fn test_no_rule_fires_for_upright_pose() {
        let evaluation = RuleEngine::default().evaluate(&keypoints(175.0, 178.0));
        assert!(evaluation.feedback.is_empty());
        assert!(evaluation.violations.is_empty());
    }

    #[test]
    fn test_threshold_is_configurable() {
        let engine = RuleEngine::new(100.0);
        let evaluation = engine.evaluate(&keypoints(140.5, 95.5));
        assert_eq!(evaluation.feedback, vec!["Back too bent: 95°"]);
    }

    #[test]
    fn test_inconclusive_angle_skips_rule() {
        let mut set = keypoints(90.0, 90.0);
        // 腳尖與膝蓋重合 → 角度無法判定
        set.foot_index = set.knee;

        let evaluation = RuleEngine::default().evaluate(&set);
        assert_eq!(evaluation.knee_angle, None);
        assert_eq!(evaluation.violations, vec![FormRule::BackBend]);
    }

    #[test]
    fn test_feedback_truncates() {
        assert_eq!(FormRule::KneeOverToe.feedback(149.99), "Knee goes beyond toe: 149°");
        assert_eq!(FormRule::BackBend.feedback(0.4), "Back too bent: 0°");
    }
}
