// src/config.rs

use crate::error::{Result, TrackerError};
use crate::types::Config;
use std::fs;
use std::path::Path;

const WEIGHT_SUM_EPSILON: f32 = 1e-4;

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations that would be fatal at runtime.
    ///
    /// Everything checked here is a deployment mistake, not a sensor
    /// condition, so it fails loudly instead of degrading.
    pub fn validate(&self) -> Result<()> {
        if self.camera.width == 0 || self.camera.height == 0 {
            return Err(TrackerError::InvalidConfig(format!(
                "camera resolution {}x{} is empty",
                self.camera.width, self.camera.height
            )));
        }
        if self.detection.scan_line_count < 2 {
            return Err(TrackerError::InvalidConfig(format!(
                "scan_line_count must be at least 2, got {}",
                self.detection.scan_line_count
            )));
        }
        if self.detection.min_segment_width == 0 {
            return Err(TrackerError::InvalidConfig(
                "min_segment_width must be positive".to_string(),
            ));
        }
        if self.detection.min_segment_width > self.detection.max_segment_width {
            return Err(TrackerError::InvalidConfig(format!(
                "min_segment_width {} exceeds max_segment_width {}",
                self.detection.min_segment_width, self.detection.max_segment_width
            )));
        }
        if self.calibration.underexposed_threshold >= self.calibration.overexposed_threshold {
            return Err(TrackerError::InvalidConfig(format!(
                "underexposed_threshold {} must be below overexposed_threshold {}",
                self.calibration.underexposed_threshold, self.calibration.overexposed_threshold
            )));
        }
        if !(0.0..0.5).contains(&self.calibration.roi_margin) {
            return Err(TrackerError::InvalidConfig(format!(
                "roi_margin {} must be in [0, 0.5)",
                self.calibration.roi_margin
            )));
        }
        if !(0.0..=1.0).contains(&self.classifier.junction_width_fraction) {
            return Err(TrackerError::InvalidConfig(format!(
                "junction_width_fraction {} must be in [0, 1]",
                self.classifier.junction_width_fraction
            )));
        }
        if !(0.0..=1.0).contains(&self.classifier.min_detection_ratio) {
            return Err(TrackerError::InvalidConfig(format!(
                "min_detection_ratio {} must be in [0, 1]",
                self.classifier.min_detection_ratio
            )));
        }
        if self.filter.window_size == 0 {
            return Err(TrackerError::InvalidConfig(
                "filter window_size must be positive".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.filter.confidence_threshold) {
            return Err(TrackerError::InvalidConfig(format!(
                "confidence_threshold {} must be in [0, 1]",
                self.filter.confidence_threshold
            )));
        }
        if self.runtime.frame_budget_ms <= 0.0 {
            return Err(TrackerError::InvalidConfig(format!(
                "frame_budget_ms {} must be positive",
                self.runtime.frame_budget_ms
            )));
        }

        let pairs = [
            ("sharp", self.trend_weights.sharp_base, self.trend_weights.sharp_trend),
            ("medium", self.trend_weights.medium_base, self.trend_weights.medium_trend),
            ("gentle", self.trend_weights.gentle_base, self.trend_weights.gentle_trend),
            ("straight", self.trend_weights.straight_base, self.trend_weights.straight_trend),
        ];
        for (name, base, trend) in pairs {
            if (base + trend - 1.0).abs() > WEIGHT_SUM_EPSILON {
                return Err(TrackerError::InvalidConfig(format!(
                    "{name} weights ({base}, {trend}) must sum to 1.0"
                )));
            }
        }
        if self.trend_weights.sharp_threshold < self.trend_weights.medium_threshold
            || self.trend_weights.medium_threshold < self.trend_weights.gentle_threshold
        {
            return Err(TrackerError::InvalidConfig(
                "trend thresholds must be ordered sharp >= medium >= gentle".to_string(),
            ));
        }

        Ok(())
    }
}
