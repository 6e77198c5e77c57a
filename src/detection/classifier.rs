// src/detection/classifier.rs
//
// Maps one frame's (position, trend, detection ratio, width statistics) to
// a raw navigation action. First matching rule wins. The strong-trend rule
// runs before the junction-width rule: a sharp turn transiently widens the
// apparent line, and without that ordering every 90° bend reads as a
// T-junction stop.

use super::estimator::PositionEstimate;
use crate::types::{Action, ClassifierConfig, SegmentDetection};

pub fn classify(
    estimate: &PositionEstimate,
    observations: &[Option<SegmentDetection>],
    span: usize,
    config: &ClassifierConfig,
) -> Action {
    // 1. Nothing visible at all: the line is gone
    if estimate.detected_count == 0 {
        return Action::Terminate;
    }

    // 2. A strong trend is a turn, whatever the current position says
    if estimate.trend.abs() > config.trend_turn_threshold {
        return if estimate.trend < 0.0 {
            Action::Left
        } else {
            Action::Right
        };
    }

    // 3. Several scan lines crossing a very wide segment: T-junction
    let junction_width = config.junction_width_fraction * span as f32;
    let wide_lines = observations
        .iter()
        .flatten()
        .filter(|segment| segment.width as f32 > junction_width)
        .count();
    if wide_lines >= config.junction_min_lines {
        return Action::Terminate;
    }

    // 4. Off-center beyond the straight tolerance
    if estimate.position.abs() > config.straight_tolerance {
        return if estimate.position < 0.0 {
            Action::Left
        } else {
            Action::Right
        };
    }

    // 5. Too few lines still see the line: mostly lost
    let total = observations.len().max(1);
    if (estimate.detected_count as f32 / total as f32) < config.min_detection_ratio {
        return Action::Terminate;
    }

    Action::Straight
}

#[cfg(test)]
mod tests {
    use super::*;

    const SPAN: usize = 140;

    fn config() -> ClassifierConfig {
        ClassifierConfig::default()
    }

    fn estimate(position: f32, trend: f32, detected_count: usize) -> PositionEstimate {
        PositionEstimate {
            position,
            trend,
            detected_count,
        }
    }

    fn segments(widths: &[usize]) -> Vec<Option<SegmentDetection>> {
        widths
            .iter()
            .map(|&width| {
                Some(SegmentDetection {
                    center: 70.0,
                    width,
                    confidence: 1.0,
                })
            })
            .collect()
    }

    #[test]
    fn test_zero_detections_terminate() {
        let observations = vec![None; 8];
        let action = classify(&estimate(0.0, 0.0, 0), &observations, SPAN, &config());
        assert_eq!(action, Action::Terminate);
    }

    #[test]
    fn test_strong_trend_turns() {
        let observations = segments(&[10; 8]);
        assert_eq!(
            classify(&estimate(0.0, -0.3, 8), &observations, SPAN, &config()),
            Action::Left
        );
        assert_eq!(
            classify(&estimate(0.0, 0.3, 8), &observations, SPAN, &config()),
            Action::Right
        );
    }

    #[test]
    fn test_junction_terminates() {
        // 0.7 * 140 = 98 px; two lines above that is a T-junction
        let observations = segments(&[100, 100, 10, 10]);
        let action = classify(&estimate(0.0, 0.0, 4), &observations, SPAN, &config());
        assert_eq!(action, Action::Terminate);
    }

    #[test]
    fn test_one_wide_line_is_not_a_junction() {
        let observations = segments(&[100, 10, 10, 10]);
        let action = classify(&estimate(0.0, 0.0, 4), &observations, SPAN, &config());
        assert_eq!(action, Action::Straight);
    }

    #[test]
    fn test_sharp_turn_overrides_junction_width() {
        // Wide segments on two lines, but the trend says 90° bend, not stop
        let observations = segments(&[100, 100, 10, 10]);
        let action = classify(&estimate(-0.5, -0.8, 4), &observations, SPAN, &config());
        assert_eq!(action, Action::Left);
    }

    #[test]
    fn test_position_tolerance() {
        let observations = segments(&[10; 8]);
        assert_eq!(
            classify(&estimate(-0.3, 0.0, 8), &observations, SPAN, &config()),
            Action::Left
        );
        assert_eq!(
            classify(&estimate(0.3, 0.0, 8), &observations, SPAN, &config()),
            Action::Right
        );
        assert_eq!(
            classify(&estimate(0.1, 0.0, 8), &observations, SPAN, &config()),
            Action::Straight
        );
    }

    #[test]
    fn test_low_detection_ratio_terminates() {
        let mut observations = segments(&[10, 10]);
        observations.extend(vec![None; 6]);
        // 2 of 8 detected, ratio 0.25 < 0.4
        let action = classify(&estimate(0.05, 0.0, 2), &observations, SPAN, &config());
        assert_eq!(action, Action::Terminate);
    }

    #[test]
    fn test_centered_line_is_straight() {
        let observations = segments(&[12; 8]);
        let action = classify(&estimate(0.02, 0.01, 8), &observations, SPAN, &config());
        assert_eq!(action, Action::Straight);
    }
}
