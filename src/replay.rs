// src/replay.rs
//
// Offline frame source: replays directories of captured camera frames
// through the tracker, mirroring how the robot's evaluation data is laid
// out on disk (one directory per scenario, e.g. img_straight, img_left,
// img_right, img_terminate, plus a reference directory of empty-track
// frames for calibration).

use crate::tracker::LineTracker;
use crate::types::{Action, Config, Frame};
use anyhow::{Context, Result};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

const FRAME_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

pub struct FrameReplayer {
    config: Config,
}

/// One frame's outcome, serialized to the results file
#[derive(Debug, serde::Serialize)]
struct ReplayRecord {
    file: String,
    position: f32,
    trend: f32,
    detected_count: usize,
    total_count: usize,
    terminate: bool,
    raw: &'static str,
    stable: &'static str,
}

#[derive(Debug, Default)]
pub struct ReplayStats {
    pub frames: u64,
    pub rejected: u64,
    pub straight: u64,
    pub left: u64,
    pub right: u64,
    pub terminate: u64,
}

impl ReplayStats {
    fn record(&mut self, stable: Action) {
        match stable {
            Action::Straight => self.straight += 1,
            Action::Left => self.left += 1,
            Action::Right => self.right += 1,
            Action::Terminate => self.terminate += 1,
            Action::Unknown => {}
        }
    }
}

impl FrameReplayer {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Frame files under a directory, sorted for a stable replay order
    pub fn find_frame_files(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        let mut frames = Vec::new();

        for entry in WalkDir::new(dir)
            .max_depth(1)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let path = entry.path();
            if let Some(ext) = path.extension() {
                let ext = ext.to_str().unwrap_or("").to_ascii_lowercase();
                if FRAME_EXTENSIONS.contains(&ext.as_str()) {
                    frames.push(path.to_path_buf());
                }
            }
        }

        frames.sort();
        Ok(frames)
    }

    /// Scenario directories to replay: the immediate subdirectories of the
    /// input dir, or the input dir itself when it has none
    pub fn find_scenario_dirs(&self) -> Result<Vec<PathBuf>> {
        let input_dir = Path::new(&self.config.replay.input_dir);
        let mut dirs: Vec<PathBuf> = fs::read_dir(input_dir)
            .with_context(|| format!("failed to read input dir {}", input_dir.display()))?
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.is_dir())
            .collect();
        dirs.sort();

        if dirs.is_empty() {
            dirs.push(input_dir.to_path_buf());
        }
        Ok(dirs)
    }

    /// Load the calibration batch from the configured reference directory
    pub fn load_reference_frames(&self) -> Result<Vec<Frame>> {
        let dir = PathBuf::from(&self.config.replay.reference_dir);
        let files = self.find_frame_files(&dir)?;
        if files.is_empty() {
            anyhow::bail!("no reference frames found in {}", dir.display());
        }

        let mut frames = Vec::with_capacity(files.len());
        for (index, path) in files.iter().enumerate() {
            frames.push(self.load_frame(path, index as f64)?);
        }
        info!(
            "Loaded {} reference frame(s) from {}",
            frames.len(),
            dir.display()
        );
        Ok(frames)
    }

    /// Decode one image file to a grayscale frame
    pub fn load_frame(&self, path: &Path, timestamp: f64) -> Result<Frame> {
        let image = image::open(path)
            .with_context(|| format!("failed to decode {}", path.display()))?
            .to_luma8();
        let (width, height) = image.dimensions();
        Ok(Frame::new(
            image.into_raw(),
            width as usize,
            height as usize,
            timestamp,
        ))
    }

    /// Replay every frame of one scenario directory through the tracker.
    ///
    /// Frames the tracker rejects (wrong resolution, truncated buffer) are
    /// counted and logged but do not stop the run; the stable action just
    /// holds for that cycle, exactly as it would on the robot.
    pub fn replay_directory(&self, tracker: &mut LineTracker, dir: &Path) -> Result<ReplayStats> {
        let files = self.find_frame_files(dir)?;
        let mut stats = ReplayStats::default();
        let mut writer = self.open_results_file(dir)?;

        for (index, path) in files.iter().enumerate() {
            let frame = self.load_frame(path, index as f64)?;
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();

            let record = match tracker.process(&frame) {
                Ok(processed) => {
                    stats.frames += 1;
                    stats.record(processed.stable);
                    debug!(
                        "{}: pos {:+.3} trend {:+.3} {}/{} raw={} stable={}",
                        name,
                        processed.result.position,
                        processed.result.trend,
                        processed.result.detected_count,
                        processed.result.total_count,
                        processed.raw.as_str(),
                        processed.stable.as_str()
                    );
                    ReplayRecord {
                        file: name,
                        position: processed.result.position,
                        trend: processed.result.trend,
                        detected_count: processed.result.detected_count,
                        total_count: processed.result.total_count,
                        terminate: processed.result.terminate,
                        raw: processed.raw.as_str(),
                        stable: processed.stable.as_str(),
                    }
                }
                Err(e) => {
                    stats.rejected += 1;
                    warn!("{}: frame rejected: {}", name, e);
                    ReplayRecord {
                        file: name,
                        position: 0.0,
                        trend: 0.0,
                        detected_count: 0,
                        total_count: 0,
                        terminate: false,
                        raw: Action::Unknown.as_str(),
                        stable: tracker.stable_action().as_str(),
                    }
                }
            };

            if let Some(writer) = writer.as_mut() {
                let line = serde_json::to_string(&record)?;
                writeln!(writer, "{line}")?;
            }
        }

        Ok(stats)
    }

    fn open_results_file(&self, dir: &Path) -> Result<Option<fs::File>> {
        if !self.config.replay.save_results {
            return Ok(None);
        }
        fs::create_dir_all(&self.config.replay.output_dir)?;
        let scenario = dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "frames".to_string());
        let path =
            PathBuf::from(&self.config.replay.output_dir).join(format!("{scenario}_results.jsonl"));
        let file = fs::File::create(&path)
            .with_context(|| format!("failed to create {}", path.display()))?;
        Ok(Some(file))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_record_actions() {
        let mut stats = ReplayStats::default();
        stats.record(Action::Straight);
        stats.record(Action::Straight);
        stats.record(Action::Left);
        stats.record(Action::Terminate);
        stats.record(Action::Unknown);
        assert_eq!(stats.straight, 2);
        assert_eq!(stats.left, 1);
        assert_eq!(stats.terminate, 1);
        assert_eq!(stats.right, 0);
    }
}
