// src/detection/segment.rs
//
// Background-subtraction segment extraction on a single scan line.
// Only darkening relative to the calibrated baseline counts: the track
// line is dark on a light field, so brightening (LED reflection, glare)
// is clamped away instead of thresholded.

use crate::types::{DetectionConfig, SegmentDetection};

/// Find the widest contiguous dark run on one scan line.
///
/// `baseline_row` and `frame_row` are the same row of the baseline and the
/// current frame, both already restricted to the ROI x-span. Runs narrower
/// than `min_segment_width` are noise; runs wider than `max_segment_width`
/// are global darkening or exposure bleed. Among the surviving runs the
/// widest wins (first one on a tie), since width tracks how much of the
/// real line the scan crossed.
pub fn detect_segment(
    baseline_row: &[u8],
    frame_row: &[u8],
    config: &DetectionConfig,
) -> Option<SegmentDetection> {
    debug_assert_eq!(baseline_row.len(), frame_row.len());

    let mut best: Option<(usize, usize)> = None;
    let mut run_start: Option<usize> = None;

    for (x, (&bg, &px)) in baseline_row.iter().zip(frame_row.iter()).enumerate() {
        let diff = bg as i16 - px as i16;
        let dark = diff > config.diff_threshold as i16;

        if dark {
            run_start.get_or_insert(x);
        } else if let Some(start) = run_start.take() {
            consider_run(&mut best, start, x - 1, config);
        }
    }
    if let Some(start) = run_start {
        consider_run(&mut best, start, frame_row.len() - 1, config);
    }

    best.map(|(left, right)| {
        let width = right - left + 1;
        SegmentDetection {
            center: (left + right) as f32 / 2.0,
            width,
            confidence: (width as f32 / config.max_segment_width as f32).min(1.0),
        }
    })
}

fn consider_run(
    best: &mut Option<(usize, usize)>,
    left: usize,
    right: usize,
    config: &DetectionConfig,
) {
    let width = right - left + 1;
    if width < config.min_segment_width || width > config.max_segment_width {
        return;
    }
    let widest = best.map_or(0, |(l, r)| r - l + 1);
    if width > widest {
        *best = Some((left, right));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> DetectionConfig {
        DetectionConfig {
            scan_line_count: 8,
            diff_threshold: 30,
            min_segment_width: 3,
            max_segment_width: 20,
        }
    }

    fn row_with_band(len: usize, left: usize, width: usize) -> (Vec<u8>, Vec<u8>) {
        let baseline = vec![200u8; len];
        let mut frame = vec![200u8; len];
        for x in left..left + width {
            frame[x] = 100;
        }
        (baseline, frame)
    }

    #[test]
    fn test_band_center_and_confidence() {
        let (baseline, frame) = row_with_band(100, 40, 11);
        let segment = detect_segment(&baseline, &frame, &config()).unwrap();
        assert_eq!(segment.center, 45.0);
        assert_eq!(segment.width, 11);
        assert!((segment.confidence - 11.0 / 20.0).abs() < 1e-6);
    }

    #[test]
    fn test_min_width_boundary() {
        let cfg = config();
        let (baseline, frame) = row_with_band(100, 40, cfg.min_segment_width);
        assert!(detect_segment(&baseline, &frame, &cfg).is_some());

        let (baseline, frame) = row_with_band(100, 40, cfg.min_segment_width - 1);
        assert!(detect_segment(&baseline, &frame, &cfg).is_none());
    }

    #[test]
    fn test_max_width_boundary() {
        let cfg = config();
        let (baseline, frame) = row_with_band(100, 40, cfg.max_segment_width);
        let segment = detect_segment(&baseline, &frame, &cfg).unwrap();
        assert_eq!(segment.confidence, 1.0);

        let (baseline, frame) = row_with_band(100, 40, cfg.max_segment_width + 1);
        assert!(detect_segment(&baseline, &frame, &cfg).is_none());
    }

    #[test]
    fn test_widest_run_wins() {
        let baseline = vec![200u8; 100];
        let mut frame = vec![200u8; 100];
        for x in 10..14 {
            frame[x] = 100; // 4 px
        }
        for x in 60..70 {
            frame[x] = 100; // 10 px, should win despite coming second
        }
        let segment = detect_segment(&baseline, &frame, &config()).unwrap();
        assert_eq!(segment.center, 64.5);
        assert_eq!(segment.width, 10);
    }

    #[test]
    fn test_brightening_is_ignored() {
        let baseline = vec![100u8; 100];
        let mut frame = vec![100u8; 100];
        for x in 40..50 {
            frame[x] = 250; // LED reflection, brighter than baseline
        }
        assert!(detect_segment(&baseline, &frame, &config()).is_none());
    }

    #[test]
    fn test_run_touching_right_edge() {
        let (baseline, frame) = row_with_band(100, 95, 5);
        let segment = detect_segment(&baseline, &frame, &config()).unwrap();
        assert_eq!(segment.center, 97.0);
        assert_eq!(segment.width, 5);
    }

    #[test]
    fn test_subthreshold_darkening_is_noise() {
        let baseline = vec![200u8; 100];
        let mut frame = vec![200u8; 100];
        for x in 40..50 {
            frame[x] = 175; // only 25 below baseline, threshold is 30
        }
        assert!(detect_segment(&baseline, &frame, &config()).is_none());
    }
}
