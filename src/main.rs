// src/main.rs

mod calibration;
mod config;
mod detection;
mod error;
mod frame_slot;
mod metrics;
mod replay;
mod tracker;
mod types;

use anyhow::Result;
use replay::FrameReplayer;
use tracker::LineTracker;
use tracing::{info, warn};
use types::Config;

fn main() -> Result<()> {
    let config_path = std::env::args().nth(1).unwrap_or_else(|| "config.yaml".to_string());
    let config = Config::load(&config_path)?;

    tracing_subscriber::fmt()
        .with_env_filter(format!("liner_vision={}", config.logging.level))
        .init();

    info!("🛤️  Liner line tracking starting");
    info!("✓ Configuration loaded from {}", config_path);
    info!(
        "Camera {}x{}, {} scan lines, diff threshold {}, hysteresis window {}",
        config.camera.width,
        config.camera.height,
        config.detection.scan_line_count,
        config.detection.diff_threshold,
        config.filter.window_size
    );

    let replayer = FrameReplayer::new(config.clone());
    let mut tracker = LineTracker::new(config)?;

    let reference_frames = replayer.load_reference_frames()?;
    tracker.calibrate(&reference_frames)?;
    info!("✓ Calibration complete");

    let scenario_dirs = replayer.find_scenario_dirs()?;
    info!("Found {} scenario directories", scenario_dirs.len());

    for dir in &scenario_dirs {
        info!("========================================");
        info!("Replaying {}", dir.display());

        // Each scenario starts from a clean temporal state, like a fresh
        // run on the robot
        tracker.reset();

        let stats = replayer.replay_directory(&mut tracker, dir)?;
        info!("  Frames processed: {}", stats.frames);
        if stats.rejected > 0 {
            warn!("  Frames rejected: {}", stats.rejected);
        }
        info!("  ⬆️  straight: {}", stats.straight);
        info!("  ⬅️  left: {}", stats.left);
        info!("  ➡️  right: {}", stats.right);
        info!("  🛑 terminate: {}", stats.terminate);
        info!("  Final stable action: {}", tracker.stable_action().as_str());
    }

    let summary = tracker.metrics().summary();
    info!("========================================");
    info!(
        "Done: {} frames, {} rejected, {} stable transitions, avg {} µs/frame",
        summary.frames_processed,
        summary.frames_rejected,
        summary.stable_transitions,
        summary.avg_frame_us
    );
    if summary.budget_overruns > 0 {
        warn!("Budget overruns: {}", summary.budget_overruns);
    }

    Ok(())
}
