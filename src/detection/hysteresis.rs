// src/detection/hysteresis.rs
//
// Temporal hysteresis over raw per-frame classifications. A fixed-capacity
// circular window (index-wrapping, never reallocated) holds the last N raw
// actions; the externally visible stable action only moves when a clear
// majority agrees, so single-frame sensor noise cannot flip the steering
// direction. Terminate overrides the majority rule and is terminal until
// the filter is reset by a recalibration.

use crate::types::{Action, FilterConfig};

// Majority must also clear this floor so one frame in a nearly-empty
// window cannot switch the action
const MIN_MAJORITY_COUNT: usize = 2;

const VOTE_CANDIDATES: [Action; 4] = [
    Action::Straight,
    Action::Left,
    Action::Right,
    Action::Terminate,
];

#[derive(Debug, Clone)]
pub struct ActionFilter {
    window: Vec<Action>,
    capacity: usize,
    next: usize,
    stable: Action,
    confidence_threshold: f32,
    terminate_votes: usize,
}

impl ActionFilter {
    pub fn new(config: &FilterConfig) -> Self {
        Self {
            window: Vec::with_capacity(config.window_size),
            capacity: config.window_size,
            next: 0,
            stable: Action::Straight,
            confidence_threshold: config.confidence_threshold,
            terminate_votes: config.terminate_votes,
        }
    }

    /// Push one raw classification and return the (possibly updated)
    /// stable action.
    pub fn update(&mut self, raw: Action) -> Action {
        if self.stable == Action::Terminate {
            // Terminal for this run; only reset() leaves it
            return self.stable;
        }

        if self.window.len() < self.capacity {
            self.window.push(raw);
        } else {
            self.window[self.next] = raw;
        }
        self.next = (self.next + 1) % self.capacity;

        let terminate_count = self.count(Action::Terminate);
        if terminate_count >= self.terminate_votes {
            self.stable = Action::Terminate;
            return self.stable;
        }

        if let Some((majority, count)) = self.majority() {
            let share = count as f32 / self.capacity as f32;
            if count >= MIN_MAJORITY_COUNT && share >= self.confidence_threshold {
                self.stable = majority;
            }
        }

        self.stable
    }

    pub fn stable(&self) -> Action {
        self.stable
    }

    /// Clear the window and return to the initial Straight state
    pub fn reset(&mut self) {
        self.window.clear();
        self.next = 0;
        self.stable = Action::Straight;
    }

    fn count(&self, action: Action) -> usize {
        self.window.iter().filter(|&&a| a == action).count()
    }

    /// Most frequent votable action, or None on a tie. Unknown entries
    /// occupy window slots but never vote.
    fn majority(&self) -> Option<(Action, usize)> {
        let mut best: Option<(Action, usize)> = None;
        let mut tied = false;
        for action in VOTE_CANDIDATES {
            let count = self.count(action);
            if count == 0 {
                continue;
            }
            match best {
                Some((_, best_count)) if count == best_count => tied = true,
                Some((_, best_count)) if count > best_count => {
                    best = Some((action, count));
                    tied = false;
                }
                None => best = Some((action, count)),
                _ => {}
            }
        }
        if tied {
            None
        } else {
            best
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filter() -> ActionFilter {
        ActionFilter::new(&FilterConfig::default())
    }

    #[test]
    fn test_initial_state_is_straight() {
        assert_eq!(filter().stable(), Action::Straight);
    }

    #[test]
    fn test_single_outlier_does_not_flip() {
        let mut filter = filter();
        for _ in 0..4 {
            filter.update(Action::Straight);
        }
        // One noisy Left amid consistent Straight
        assert_eq!(filter.update(Action::Left), Action::Straight);
    }

    #[test]
    fn test_consistent_votes_switch() {
        let mut filter = filter();
        filter.update(Action::Left);
        assert_eq!(filter.stable(), Action::Straight); // 1/5 < 0.6
        filter.update(Action::Left);
        assert_eq!(filter.stable(), Action::Straight); // 2/5 < 0.6
        assert_eq!(filter.update(Action::Left), Action::Left); // 3/5 >= 0.6
    }

    #[test]
    fn test_two_terminates_override_majority() {
        let mut filter = filter();
        for _ in 0..3 {
            filter.update(Action::Straight);
        }
        filter.update(Action::Terminate);
        assert_eq!(filter.stable(), Action::Straight);
        // Second terminate anywhere in the window forces the stop
        assert_eq!(filter.update(Action::Terminate), Action::Terminate);
    }

    #[test]
    fn test_terminate_from_any_prior_state() {
        let mut filter = filter();
        for _ in 0..3 {
            filter.update(Action::Right);
        }
        assert_eq!(filter.stable(), Action::Right);
        filter.update(Action::Terminate);
        filter.update(Action::Terminate);
        assert_eq!(filter.stable(), Action::Terminate);
    }

    #[test]
    fn test_terminate_is_terminal() {
        let mut filter = filter();
        filter.update(Action::Terminate);
        filter.update(Action::Terminate);
        for _ in 0..10 {
            assert_eq!(filter.update(Action::Straight), Action::Terminate);
        }
    }

    #[test]
    fn test_reset_restores_initial_state() {
        let mut filter = filter();
        filter.update(Action::Terminate);
        filter.update(Action::Terminate);
        filter.reset();
        assert_eq!(filter.stable(), Action::Straight);
        for _ in 0..3 {
            filter.update(Action::Right);
        }
        assert_eq!(filter.stable(), Action::Right);
    }

    #[test]
    fn test_unknown_never_wins() {
        let mut filter = filter();
        for _ in 0..10 {
            assert_eq!(filter.update(Action::Unknown), Action::Straight);
        }
    }

    #[test]
    fn test_window_evicts_oldest() {
        let mut filter = filter();
        for _ in 0..5 {
            filter.update(Action::Left);
        }
        assert_eq!(filter.stable(), Action::Left);
        // Three rights push out three lefts: window is [R, R, R, L, L]
        filter.update(Action::Right);
        filter.update(Action::Right);
        assert_eq!(filter.stable(), Action::Left);
        assert_eq!(filter.update(Action::Right), Action::Right);
    }

    #[test]
    fn test_majority_tie_holds_current() {
        let mut filter = ActionFilter::new(&FilterConfig {
            window_size: 4,
            confidence_threshold: 0.75,
            terminate_votes: 3,
        });
        filter.update(Action::Left);
        filter.update(Action::Left);
        filter.update(Action::Right);
        filter.update(Action::Right);
        // 2-2 tie: no switch
        assert_eq!(filter.stable(), Action::Straight);
    }
}
