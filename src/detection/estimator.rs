// src/detection/estimator.rs
//
// Turns per-line segment detections into one signed position plus the
// directional trend used to anticipate curvature. The vehicle follows the
// line entering the frame from the top, so the last scan line (largest y)
// is the one nearest the camera and anchors the base position.

use crate::types::{SegmentDetection, TrendWeightsConfig};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionEstimate {
    /// Blended base/trend position in [-1, 1]
    pub position: f32,
    /// Farther-minus-nearer divergence of the most split line pair, [-2, 2]
    pub trend: f32,
    pub detected_count: usize,
}

/// Normalize a pixel center to [-1, 1] over the ROI x-span
pub fn normalize_center(center: f32, span: usize) -> f32 {
    let half = span as f32 / 2.0;
    (center - half) / half
}

/// Estimate position and trend from one frame's scan-line observations.
///
/// `observations` is ordered from the farthest scan line to the nearest.
/// Trend examines every detected pair, not just neighbors, so a sharp bend
/// still registers when intermediate lines miss. K is small (≤12), so the
/// O(K²) pair loop stays a plain nested loop.
pub fn estimate(
    observations: &[Option<SegmentDetection>],
    span: usize,
    weights: &TrendWeightsConfig,
) -> PositionEstimate {
    let positions: Vec<Option<f32>> = observations
        .iter()
        .map(|obs| obs.map(|segment| normalize_center(segment.center, span)))
        .collect();

    let detected_count = positions.iter().flatten().count();

    // Base position: the line nearest the vehicle, or the nearest detected
    // substitute when that exact line missed
    let base = positions.iter().rev().flatten().copied().next();

    if detected_count < 2 {
        return PositionEstimate {
            position: base.unwrap_or(0.0),
            trend: 0.0,
            detected_count,
        };
    }

    let mut trend = 0.0f32;
    for i in 0..positions.len() {
        for j in (i + 1)..positions.len() {
            if let (Some(far), Some(near)) = (positions[i], positions[j]) {
                let pair_trend = far - near;
                if pair_trend.abs() > trend.abs() {
                    trend = pair_trend;
                }
            }
        }
    }

    let (weight_base, weight_trend) = weights.select(trend.abs());
    let base = base.unwrap_or(0.0);
    let position = (weight_base * base + weight_trend * trend).clamp(-1.0, 1.0);

    PositionEstimate {
        position,
        trend,
        detected_count,
    }
}
