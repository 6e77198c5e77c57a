// src/frame_slot.rs
//
// Hand-off point between a capture thread and the processing loop. A
// single slot with replace-on-publish semantics: the processor always sees
// the freshest frame and a slow consumer sheds load by dropping stale
// frames instead of building a backlog.

use crate::types::Frame;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

#[derive(Debug, Default)]
pub struct LatestFrameSlot {
    slot: Mutex<Option<Frame>>,
    dropped: AtomicU64,
}

impl LatestFrameSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish a frame, replacing (and counting) any unconsumed one
    pub fn publish(&self, frame: Frame) {
        let mut slot = match self.slot.lock() {
            Ok(slot) => slot,
            Err(poisoned) => poisoned.into_inner(),
        };
        if slot.replace(frame).is_some() {
            self.dropped.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Take the freshest frame, leaving the slot empty
    pub fn take(&self) -> Option<Frame> {
        match self.slot.lock() {
            Ok(mut slot) => slot.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        }
    }

    /// Frames overwritten before the processor consumed them
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(timestamp: f64) -> Frame {
        Frame::new(vec![0; 4], 2, 2, timestamp)
    }

    #[test]
    fn test_take_returns_latest() {
        let slot = LatestFrameSlot::new();
        slot.publish(frame(1.0));
        slot.publish(frame(2.0));
        slot.publish(frame(3.0));
        let taken = slot.take().unwrap();
        assert_eq!(taken.timestamp, 3.0);
        assert_eq!(slot.dropped(), 2);
    }

    #[test]
    fn test_take_empties_slot() {
        let slot = LatestFrameSlot::new();
        slot.publish(frame(1.0));
        assert!(slot.take().is_some());
        assert!(slot.take().is_none());
        assert_eq!(slot.dropped(), 0);
    }

    #[test]
    fn test_shared_across_threads() {
        use std::sync::Arc;

        let slot = Arc::new(LatestFrameSlot::new());
        let producer = Arc::clone(&slot);
        let handle = std::thread::spawn(move || {
            for i in 0..100 {
                producer.publish(frame(i as f64));
            }
        });
        handle.join().unwrap();
        assert_eq!(slot.take().unwrap().timestamp, 99.0);
        assert_eq!(slot.dropped(), 99);
    }
}
