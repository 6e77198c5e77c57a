// src/error.rs

use thiserror::Error;

/// Result type alias for the tracking library
pub type Result<T> = std::result::Result<T, TrackerError>;

/// Errors that can occur during calibration or frame processing
#[derive(Error, Debug)]
pub enum TrackerError {
    #[error("calibration requires at least one reference frame")]
    EmptyCalibration,

    #[error("reference frame {index} is {actual_width}x{actual_height}, expected {expected_width}x{expected_height}")]
    CalibrationSizeMismatch {
        index: usize,
        expected_width: usize,
        expected_height: usize,
        actual_width: usize,
        actual_height: usize,
    },

    #[error("frame is {actual_width}x{actual_height}, expected {expected_width}x{expected_height}")]
    FrameSizeMismatch {
        expected_width: usize,
        expected_height: usize,
        actual_width: usize,
        actual_height: usize,
    },

    #[error("frame buffer holds {actual} bytes, expected {expected}")]
    FrameBufferMismatch { expected: usize, actual: usize },

    #[error("tracker is not calibrated")]
    NotCalibrated,

    #[error("ROI y[{y_start}..{y_end}) x[{x_start}..{x_end}) does not fit a {width}x{height} frame")]
    InvalidRoi {
        y_start: usize,
        y_end: usize,
        x_start: usize,
        x_end: usize,
        width: usize,
        height: usize,
    },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}
