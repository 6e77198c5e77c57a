// src/calibration.rs
//
// Builds the background baseline and the usable scanning region from a
// batch of empty-track reference frames. Runs once at startup or on an
// explicit recalibration command, never during frame processing.

use crate::error::{Result, TrackerError};
use crate::types::{CalibrationConfig, Frame, Roi};
use tracing::{debug, warn};

/// Noise-reduced background image plus the region trusted for scanning.
///
/// Replaced wholesale on recalibration; frame processing only ever reads it.
#[derive(Debug, Clone)]
pub struct CalibrationBaseline {
    mean: Vec<u8>,
    width: usize,
    height: usize,
    roi: Roi,
    quality_warning: bool,
}

impl CalibrationBaseline {
    /// Average the reference batch and derive the effective ROI.
    ///
    /// All frames must share one resolution; an empty batch is rejected.
    pub fn from_frames(frames: &[Frame], config: &CalibrationConfig) -> Result<Self> {
        let first = frames.first().ok_or(TrackerError::EmptyCalibration)?;
        let (width, height) = (first.width, first.height);

        for (index, frame) in frames.iter().enumerate() {
            if frame.width != width || frame.height != height {
                return Err(TrackerError::CalibrationSizeMismatch {
                    index,
                    expected_width: width,
                    expected_height: height,
                    actual_width: frame.width,
                    actual_height: frame.height,
                });
            }
            if frame.data.len() != width * height {
                return Err(TrackerError::FrameBufferMismatch {
                    expected: width * height,
                    actual: frame.data.len(),
                });
            }
        }

        let mean = mean_image(frames, width * height);
        let effective = effective_region(frames, config);
        let (roi, fell_back) = effective_roi(&effective, width, height, config.roi_margin)?;

        if fell_back {
            warn!(
                "calibration found no usable pixels across {} reference frame(s), \
                 falling back to the central half of the frame",
                frames.len()
            );
        } else {
            debug!(
                "calibrated ROI y[{}..{}) x[{}..{}) from {} reference frame(s)",
                roi.y_start,
                roi.y_end,
                roi.x_start,
                roi.x_end,
                frames.len()
            );
        }

        Ok(Self {
            mean,
            width,
            height,
            roi,
            quality_warning: fell_back,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn roi(&self) -> Roi {
        self.roi
    }

    /// Set when the exposure analysis failed and the default ROI is in use
    pub fn quality_warning(&self) -> bool {
        self.quality_warning
    }

    /// Baseline pixels for row `y` restricted to the ROI x-span
    pub fn row_span(&self, y: usize) -> &[u8] {
        &self.mean[y * self.width + self.roi.x_start..y * self.width + self.roi.x_end]
    }
}

/// Per-pixel rounded mean across the batch
fn mean_image(frames: &[Frame], pixels: usize) -> Vec<u8> {
    let count = frames.len() as u32;
    let mut sums = vec![0u32; pixels];
    for frame in frames {
        for (sum, &px) in sums.iter_mut().zip(frame.data.iter()) {
            *sum += px as u32;
        }
    }
    sums.iter()
        .map(|&sum| ((sum + count / 2) / count) as u8)
        .collect()
}

/// Pixels that are neither over- nor under-exposed in every reference frame
fn effective_region(frames: &[Frame], config: &CalibrationConfig) -> Vec<bool> {
    let mut effective = vec![true; frames[0].data.len()];
    for frame in frames {
        for (flag, &px) in effective.iter_mut().zip(frame.data.iter()) {
            if px >= config.overexposed_threshold || px <= config.underexposed_threshold {
                *flag = false;
            }
        }
    }
    effective
}

/// Bounding rectangle of the effective region, shrunk by the safety margin.
///
/// Returns the ROI and whether the central-half fallback was taken.
fn effective_roi(
    effective: &[bool],
    width: usize,
    height: usize,
    margin: f32,
) -> Result<(Roi, bool)> {
    let row_used = |y: usize| effective[y * width..(y + 1) * width].iter().any(|&e| e);
    let col_used = |x: usize| (0..height).any(|y| effective[y * width + x]);

    let y_bounds = (0..height).find(|&y| row_used(y)).and_then(|y_start| {
        (0..height)
            .rev()
            .find(|&y| row_used(y))
            .map(|y_last| (y_start, y_last + 1))
    });
    let x_bounds = (0..width).find(|&x| col_used(x)).and_then(|x_start| {
        (0..width)
            .rev()
            .find(|&x| col_used(x))
            .map(|x_last| (x_start, x_last + 1))
    });

    let (bounds, fell_back) = match (y_bounds, x_bounds) {
        (Some((y_start, y_end)), Some((x_start, x_end))) => {
            ((y_start, y_end, x_start, x_end), false)
        }
        // No trustworthy pixels at all: central half of the frame
        _ => (
            (height / 4, 3 * height / 4, width / 4, 3 * width / 4),
            true,
        ),
    };

    let (y_start, y_end, x_start, x_end) = bounds;
    let (y_start, y_end) = shrink_axis(y_start, y_end, margin);
    let (x_start, x_end) = shrink_axis(x_start, x_end, margin);

    let roi = Roi::new(y_start, y_end, x_start, x_end, width, height)?;
    Ok((roi, fell_back))
}

/// Pull both ends of an axis inward by the margin fraction, unless the
/// remaining span would collapse below two pixels
fn shrink_axis(start: usize, end: usize, margin: f32) -> (usize, usize) {
    let inset = ((end - start) as f32 * margin) as usize;
    if end - start < 2 * inset + 2 {
        return (start, end);
    }
    (start + inset, end - inset)
}
