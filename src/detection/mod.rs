// src/detection/mod.rs
//
// Per-frame detection stages, in pipeline order:
//   scan_lines → segment → estimator → classifier → hysteresis
// Everything up to the classifier is pure; only the hysteresis filter
// carries state across frames.

mod classifier;
mod estimator;
mod hysteresis;
mod scan_lines;
mod segment;

// Re-export public APIs
pub use classifier::classify;
pub use estimator::{estimate, normalize_center, PositionEstimate};
pub use hysteresis::ActionFilter;
pub use scan_lines::scan_lines;
pub use segment::detect_segment;
