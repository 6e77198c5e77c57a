// src/tracker.rs
//
// Pipeline facade. Owns the calibration baseline, the hysteresis filter
// and the metrics; everything else is recomputed per frame from immutable
// inputs, so a recalibration can discard in-flight state at any frame
// boundary without rollback.

use crate::calibration::CalibrationBaseline;
use crate::detection::{classify, detect_segment, estimate, scan_lines, ActionFilter};
use crate::error::{Result, TrackerError};
use crate::metrics::TrackerMetrics;
use crate::types::{Action, Config, Frame, FrameResult, ProcessedFrame, SegmentDetection};
use std::time::Instant;
use tracing::{debug, warn};

// Degradation floor: below two scan lines the trend is meaningless
const MIN_SCAN_LINES: usize = 2;

pub struct LineTracker {
    config: Config,
    baseline: Option<CalibrationBaseline>,
    filter: ActionFilter,
    metrics: TrackerMetrics,
    /// Live scan-line count; halved on budget overruns, restored on
    /// recalibration
    effective_scan_lines: usize,
}

impl LineTracker {
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let filter = ActionFilter::new(&config.filter);
        let effective_scan_lines = config.detection.scan_line_count;
        Ok(Self {
            config,
            baseline: None,
            filter,
            metrics: TrackerMetrics::new(),
            effective_scan_lines,
        })
    }

    /// Build the baseline and ROI from a batch of empty-track frames.
    ///
    /// Must complete before the first `process` call; also serves as the
    /// recalibration command, replacing the baseline wholesale and
    /// resetting filter state.
    pub fn calibrate(&mut self, reference_frames: &[Frame]) -> Result<()> {
        let baseline =
            CalibrationBaseline::from_frames(reference_frames, &self.config.calibration)?;
        if baseline.width() != self.config.camera.width
            || baseline.height() != self.config.camera.height
        {
            return Err(TrackerError::CalibrationSizeMismatch {
                index: 0,
                expected_width: self.config.camera.width,
                expected_height: self.config.camera.height,
                actual_width: baseline.width(),
                actual_height: baseline.height(),
            });
        }
        self.baseline = Some(baseline);
        self.filter.reset();
        self.effective_scan_lines = self.config.detection.scan_line_count;
        Ok(())
    }

    pub fn recalibrate(&mut self, reference_frames: &[Frame]) -> Result<()> {
        self.calibrate(reference_frames)
    }

    pub fn is_calibrated(&self) -> bool {
        self.baseline.is_some()
    }

    /// Current filtered action; Unknown before calibration
    pub fn stable_action(&self) -> Action {
        if self.baseline.is_some() {
            self.filter.stable()
        } else {
            Action::Unknown
        }
    }

    pub fn metrics(&self) -> &TrackerMetrics {
        &self.metrics
    }

    /// Clear temporal state without touching the baseline
    pub fn reset(&mut self) {
        self.filter.reset();
        self.effective_scan_lines = self.config.detection.scan_line_count;
    }

    /// Run the full per-frame pipeline.
    ///
    /// A malformed frame is rejected with an error and leaves the filter
    /// untouched, so the consumer keeps the last stable action for that
    /// cycle.
    pub fn process(&mut self, frame: &Frame) -> Result<ProcessedFrame> {
        let baseline = self.baseline.as_ref().ok_or(TrackerError::NotCalibrated)?;

        if frame.width != baseline.width() || frame.height != baseline.height() {
            self.metrics.inc(&self.metrics.frames_rejected);
            return Err(TrackerError::FrameSizeMismatch {
                expected_width: baseline.width(),
                expected_height: baseline.height(),
                actual_width: frame.width,
                actual_height: frame.height,
            });
        }
        if frame.data.len() != frame.width * frame.height {
            self.metrics.inc(&self.metrics.frames_rejected);
            return Err(TrackerError::FrameBufferMismatch {
                expected: frame.width * frame.height,
                actual: frame.data.len(),
            });
        }

        let started = Instant::now();
        let roi = baseline.roi();
        let span = roi.x_span();

        let rows = scan_lines(&roi, self.effective_scan_lines);
        let observations: Vec<Option<SegmentDetection>> = rows
            .iter()
            .map(|&y| {
                detect_segment(
                    baseline.row_span(y),
                    frame.row_span(y, roi.x_start, roi.x_end),
                    &self.config.detection,
                )
            })
            .collect();

        let position = estimate(&observations, span, &self.config.trend_weights);
        let raw = classify(&position, &observations, span, &self.config.classifier);

        let result = FrameResult {
            position: position.position,
            trend: position.trend,
            detected_count: position.detected_count,
            total_count: rows.len(),
            terminate: raw == Action::Terminate,
        };

        let before = self.filter.stable();
        let stable = self.filter.update(raw);

        self.metrics.inc(&self.metrics.frames_processed);
        if result.terminate {
            self.metrics.inc(&self.metrics.terminate_frames);
        }
        if stable != before {
            self.metrics.inc(&self.metrics.stable_transitions);
            debug!(
                "stable action {} -> {} (raw {}, pos {:+.3}, trend {:+.3}, {}/{} lines)",
                before.as_str(),
                stable.as_str(),
                raw.as_str(),
                result.position,
                result.trend,
                result.detected_count,
                result.total_count
            );
        }

        let elapsed = started.elapsed();
        self.metrics.add_time(elapsed.as_micros() as u64);
        if elapsed.as_secs_f64() * 1000.0 > self.config.runtime.frame_budget_ms {
            self.metrics.inc(&self.metrics.budget_overruns);
            self.degrade();
        }

        Ok(ProcessedFrame { result, raw, stable })
    }

    /// Over-budget fallback: halve the scan-line count instead of stalling
    /// the control loop
    fn degrade(&mut self) {
        let reduced = (self.effective_scan_lines / 2).max(MIN_SCAN_LINES);
        if reduced < self.effective_scan_lines {
            warn!(
                "frame exceeded {:.1} ms budget, reducing scan lines {} -> {}",
                self.config.runtime.frame_budget_ms, self.effective_scan_lines, reduced
            );
            self.effective_scan_lines = reduced;
        }
    }
}
