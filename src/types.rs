// src/types.rs

use crate::error::{Result, TrackerError};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub camera: CameraConfig,
    pub calibration: CalibrationConfig,
    pub detection: DetectionConfig,
    pub classifier: ClassifierConfig,
    pub trend_weights: TrendWeightsConfig,
    pub filter: FilterConfig,
    pub runtime: RuntimeConfig,
    pub replay: ReplayConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CameraConfig {
    pub width: usize,
    pub height: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalibrationConfig {
    /// Pixels at or above this intensity are overexposed
    pub overexposed_threshold: u8,
    /// Pixels at or below this intensity are underexposed
    pub underexposed_threshold: u8,
    /// Fraction of the effective region trimmed from each ROI side
    pub roi_margin: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionConfig {
    /// Number of horizontal scan lines spread across the ROI
    pub scan_line_count: usize,
    /// Minimum baseline-minus-frame darkening that counts as a line pixel
    pub diff_threshold: u8,
    /// Segments narrower than this are noise
    pub min_segment_width: usize,
    /// Segments wider than this are exposure bleed, not the line
    pub max_segment_width: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierConfig {
    /// |trend| above this is a turn regardless of current position
    pub trend_turn_threshold: f32,
    /// |position| below this still counts as driving straight
    pub straight_tolerance: f32,
    /// Detection ratio below this means the line is mostly lost
    pub min_detection_ratio: f32,
    /// Segment wider than this fraction of the ROI span votes for a junction
    pub junction_width_fraction: f32,
    /// Junction votes required before classifying terminate
    pub junction_min_lines: usize,
}

/// Turn-sharpness dependent blending of base position and trend.
///
/// Each (base, trend) pair must sum to 1.0. The turn buckets carry the
/// weights tuned on the original track; the straight bucket passes the
/// base position through so an untrending line reports its true offset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrendWeightsConfig {
    pub sharp_threshold: f32,
    pub medium_threshold: f32,
    pub gentle_threshold: f32,
    pub sharp_base: f32,
    pub sharp_trend: f32,
    pub medium_base: f32,
    pub medium_trend: f32,
    pub gentle_base: f32,
    pub gentle_trend: f32,
    pub straight_base: f32,
    pub straight_trend: f32,
}

impl TrendWeightsConfig {
    /// Pick the (base, trend) weight pair for a trend magnitude
    pub fn select(&self, trend_abs: f32) -> (f32, f32) {
        if trend_abs > self.sharp_threshold {
            (self.sharp_base, self.sharp_trend)
        } else if trend_abs > self.medium_threshold {
            (self.medium_base, self.medium_trend)
        } else if trend_abs > self.gentle_threshold {
            (self.gentle_base, self.gentle_trend)
        } else {
            (self.straight_base, self.straight_trend)
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterConfig {
    /// Raw classifications kept in the hysteresis window
    pub window_size: usize,
    /// Majority share of the window required to switch the stable action
    pub confidence_threshold: f32,
    /// Terminate votes in the window that force an immediate stop
    pub terminate_votes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Per-frame processing budget; overruns trigger scan-count degradation
    pub frame_budget_ms: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplayConfig {
    pub reference_dir: String,
    pub input_dir: String,
    pub output_dir: String,
    pub save_results: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            width: 160,
            height: 120,
        }
    }
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            overexposed_threshold: 240,
            underexposed_threshold: 20,
            roi_margin: 0.1,
        }
    }
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            scan_line_count: 8,
            diff_threshold: 30,
            min_segment_width: 3,
            max_segment_width: 115,
        }
    }
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            trend_turn_threshold: 0.08,
            straight_tolerance: 0.15,
            min_detection_ratio: 0.4,
            junction_width_fraction: 0.7,
            junction_min_lines: 2,
        }
    }
}

impl Default for TrendWeightsConfig {
    fn default() -> Self {
        Self {
            sharp_threshold: 0.7,  // near-90° turn
            medium_threshold: 0.5, // sharp turn
            gentle_threshold: 0.3, // medium turn
            sharp_base: 0.2,
            sharp_trend: 0.8,
            medium_base: 0.3,
            medium_trend: 0.7,
            gentle_base: 0.5,
            gentle_trend: 0.5,
            straight_base: 1.0,
            straight_trend: 0.0,
        }
    }
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            window_size: 5,
            confidence_threshold: 0.6,
            terminate_votes: 2,
        }
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            frame_budget_ms: 33.0, // 30 FPS
        }
    }
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            reference_dir: "data/reference".to_string(),
            input_dir: "data/track".to_string(),
            output_dir: "output".to_string(),
            save_results: false,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            camera: CameraConfig::default(),
            calibration: CalibrationConfig::default(),
            detection: DetectionConfig::default(),
            classifier: ClassifierConfig::default(),
            trend_weights: TrendWeightsConfig::default(),
            filter: FilterConfig::default(),
            runtime: RuntimeConfig::default(),
            replay: ReplayConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// A single grayscale camera frame, row-major, one byte per pixel
#[derive(Debug, Clone)]
pub struct Frame {
    pub data: Vec<u8>,
    pub width: usize,
    pub height: usize,
    pub timestamp: f64,
}

impl Frame {
    pub fn new(data: Vec<u8>, width: usize, height: usize, timestamp: f64) -> Self {
        Self {
            data,
            width,
            height,
            timestamp,
        }
    }

    /// One row of pixels restricted to [x_start, x_end)
    pub fn row_span(&self, y: usize, x_start: usize, x_end: usize) -> &[u8] {
        &self.data[y * self.width + x_start..y * self.width + x_end]
    }
}

/// Frame sub-rectangle trusted for scanning, half-open on both axes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Roi {
    pub y_start: usize,
    pub y_end: usize,
    pub x_start: usize,
    pub x_end: usize,
}

impl Roi {
    pub fn new(
        y_start: usize,
        y_end: usize,
        x_start: usize,
        x_end: usize,
        width: usize,
        height: usize,
    ) -> Result<Self> {
        if y_start >= y_end || y_end > height || x_start >= x_end || x_end > width {
            return Err(TrackerError::InvalidRoi {
                y_start,
                y_end,
                x_start,
                x_end,
                width,
                height,
            });
        }
        Ok(Self {
            y_start,
            y_end,
            x_start,
            x_end,
        })
    }

    pub fn x_span(&self) -> usize {
        self.x_end - self.x_start
    }

    pub fn y_span(&self) -> usize {
        self.y_end - self.y_start
    }
}

/// Widest valid dark segment found on one scan line
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentDetection {
    /// Segment midpoint in pixels, relative to the ROI x-span
    pub center: f32,
    /// Segment width in pixels
    pub width: usize,
    /// Width-based confidence in [0, 1]
    pub confidence: f32,
}

/// Per-frame output of the tracking pipeline, immutable once built
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FrameResult {
    /// Blended line position, -1 (left ROI edge) to +1 (right ROI edge)
    pub position: f32,
    /// Sharpest positional divergence between any two scan lines
    pub trend: f32,
    pub detected_count: usize,
    pub total_count: usize,
    /// Raw per-frame stop condition (line lost or junction)
    pub terminate: bool,
}

/// Navigation decision handed to the motor controller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Action {
    Straight,
    Left,
    Right,
    Terminate,
    Unknown,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Straight => "straight",
            Self::Left => "left",
            Self::Right => "right",
            Self::Terminate => "terminate",
            Self::Unknown => "unknown",
        }
    }
}

/// Everything the pipeline produced for one frame
#[derive(Debug, Clone, Copy)]
pub struct ProcessedFrame {
    pub result: FrameResult,
    /// Classification before temporal filtering
    pub raw: Action,
    /// Hysteresis-filtered action the motor controller should follow
    pub stable: Action,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roi_rejects_out_of_bounds() {
        assert!(Roi::new(10, 100, 10, 150, 160, 120).is_ok());
        assert!(Roi::new(10, 130, 10, 150, 160, 120).is_err());
        assert!(Roi::new(10, 100, 10, 170, 160, 120).is_err());
        assert!(Roi::new(50, 50, 10, 150, 160, 120).is_err());
        assert!(Roi::new(60, 50, 10, 150, 160, 120).is_err());
    }

    #[test]
    fn test_weight_bucket_selection() {
        let weights = TrendWeightsConfig::default();
        assert_eq!(weights.select(0.9), (0.2, 0.8));
        assert_eq!(weights.select(0.6), (0.3, 0.7));
        assert_eq!(weights.select(0.4), (0.5, 0.5));
        assert_eq!(weights.select(0.1), (1.0, 0.0));
        // Bucket edges are exclusive
        assert_eq!(weights.select(0.7), (0.3, 0.7));
        assert_eq!(weights.select(0.3), (1.0, 0.0));
    }

    #[test]
    fn test_frame_row_span() {
        let mut data = vec![0u8; 8 * 4];
        data[2 * 8 + 3] = 99;
        let frame = Frame::new(data, 8, 4, 0.0);
        let row = frame.row_span(2, 2, 6);
        assert_eq!(row.len(), 4);
        assert_eq!(row[1], 99);
    }
}
