// src/metrics.rs
//
// Observability for the tracking loop. Counters are atomic so an embedder
// can read a summary from another thread while processing runs.

use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub struct TrackerMetrics {
    pub frames_processed: AtomicU64,
    pub frames_rejected: AtomicU64,
    pub budget_overruns: AtomicU64,
    pub terminate_frames: AtomicU64,
    pub stable_transitions: AtomicU64,
    pub processing_time_us: AtomicU64,
}

impl TrackerMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inc(&self, counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_time(&self, duration_us: u64) {
        self.processing_time_us
            .fetch_add(duration_us, Ordering::Relaxed);
    }

    pub fn summary(&self) -> MetricsSummary {
        let frames = self.frames_processed.load(Ordering::Relaxed);
        let total_us = self.processing_time_us.load(Ordering::Relaxed);
        MetricsSummary {
            frames_processed: frames,
            frames_rejected: self.frames_rejected.load(Ordering::Relaxed),
            budget_overruns: self.budget_overruns.load(Ordering::Relaxed),
            terminate_frames: self.terminate_frames.load(Ordering::Relaxed),
            stable_transitions: self.stable_transitions.load(Ordering::Relaxed),
            avg_frame_us: if frames > 0 { total_us / frames } else { 0 },
        }
    }
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct MetricsSummary {
    pub frames_processed: u64,
    pub frames_rejected: u64,
    pub budget_overruns: u64,
    pub terminate_frames: u64,
    pub stable_transitions: u64,
    pub avg_frame_us: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_averages_processing_time() {
        let metrics = TrackerMetrics::new();
        metrics.inc(&metrics.frames_processed);
        metrics.inc(&metrics.frames_processed);
        metrics.add_time(100);
        metrics.add_time(300);
        let summary = metrics.summary();
        assert_eq!(summary.frames_processed, 2);
        assert_eq!(summary.avg_frame_us, 200);
    }

    #[test]
    fn test_empty_summary_has_no_average() {
        assert_eq!(TrackerMetrics::new().summary().avg_frame_us, 0);
    }
}
