//! Time synchronizer.
//!
//! Owns the authoritative `GameTime` and reconciles every time-bearing
//! message against the stopped/running clock state machine. While the clock
//! is stopped the cycle counter freezes but global vision keeps arriving;
//! each such frame advances the `stopped` sub-step so it remains a distinct
//! decidable instant.

use crate::time::GameTime;

#[derive(Debug, Clone)]
pub struct TimeSynchronizer {
    current: GameTime,
    cycle_stopped: bool,
}

impl Default for TimeSynchronizer {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSynchronizer {
    /// The server starts before kickoff, i.e. with a stopped clock.
    pub fn new() -> Self {
        Self { current: GameTime::default(), cycle_stopped: true }
    }

    pub fn time(&self) -> GameTime {
        self.current
    }

    pub fn is_cycle_stopped(&self) -> bool {
        self.cycle_stopped
    }

    /// Set by the game-mode tracker after every accepted referee message.
    pub fn set_cycle_stopped(&mut self, stopped: bool) {
        self.cycle_stopped = stopped;
    }

    /// Reconcile an incoming cycle number.
    ///
    /// `by_see_global` is true only for global vision messages; only those
    /// advance the stopped sub-step.
    pub fn update(&mut self, new_cycle: i64, by_see_global: bool) {
        if self.cycle_stopped {
            if new_cycle != self.current.cycle {
                // The real clock resumed after a pause.
                log::debug!("CYCLE {}-0 return from cycle stop", new_cycle);
                if new_cycle - 1 != self.current.cycle {
                    // Diagnostic only; time still advances best-effort.
                    log::warn!(
                        "cycle stopped mode: previous server time is incorrect?? {} -> {}",
                        self.current,
                        new_cycle
                    );
                }
                self.current = GameTime::new(new_cycle, 0);
            } else if by_see_global {
                log::debug!(
                    "CYCLE {}-{} stopped time updated by see_global",
                    self.current.cycle,
                    self.current.stopped + 1
                );
                self.current = GameTime::new(self.current.cycle, self.current.stopped + 1);
            }
        } else {
            if self.current.cycle != new_cycle {
                log::debug!("CYCLE {}-0", new_cycle);
            }
            self.current = GameTime::new(new_cycle, 0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_starts_stopped_at_zero() {
        let sync = TimeSynchronizer::new();
        assert_eq!(sync.time(), GameTime::new(0, 0));
        assert!(sync.is_cycle_stopped());
    }

    #[test]
    fn test_running_tracks_cycle() {
        let mut sync = TimeSynchronizer::new();
        sync.set_cycle_stopped(false);
        sync.update(5, true);
        assert_eq!(sync.time(), GameTime::new(5, 0));
        sync.update(6, false);
        assert_eq!(sync.time(), GameTime::new(6, 0));
        // while running the sub-step never advances
        sync.update(6, true);
        assert_eq!(sync.time(), GameTime::new(6, 0));
    }

    #[test]
    fn test_stopped_vision_advances_sub_step() {
        let mut sync = TimeSynchronizer::new();
        sync.set_cycle_stopped(false);
        sync.update(100, true);
        sync.set_cycle_stopped(true);
        sync.update(100, true);
        assert_eq!(sync.time(), GameTime::new(100, 1));
        sync.update(100, true);
        assert_eq!(sync.time(), GameTime::new(100, 2));
    }

    #[test]
    fn test_stopped_non_vision_does_not_advance() {
        let mut sync = TimeSynchronizer::new();
        sync.set_cycle_stopped(false);
        sync.update(100, true);
        sync.set_cycle_stopped(true);
        sync.update(100, false);
        assert_eq!(sync.time(), GameTime::new(100, 0));
    }

    #[test]
    fn test_resume_resets_sub_step() {
        let mut sync = TimeSynchronizer::new();
        sync.set_cycle_stopped(false);
        sync.update(100, true);
        sync.set_cycle_stopped(true);
        sync.update(100, true);
        sync.update(100, true);
        // resumption: a new cycle arrives while stopped
        sync.update(101, false);
        assert_eq!(sync.time(), GameTime::new(101, 0));
    }

    #[test]
    fn test_resume_with_gap_still_advances() {
        let mut sync = TimeSynchronizer::new();
        sync.set_cycle_stopped(false);
        sync.update(100, true);
        sync.set_cycle_stopped(true);
        // gap larger than one cycle: diagnostic only, time still moves
        sync.update(105, false);
        assert_eq!(sync.time(), GameTime::new(105, 0));
    }

    proptest! {
        #[test]
        fn prop_stopped_constant_cycle_increments_by_one(count in 1usize..50) {
            let mut sync = TimeSynchronizer::new();
            sync.set_cycle_stopped(false);
            sync.update(42, true);
            sync.set_cycle_stopped(true);
            for i in 1..=count {
                sync.update(42, true);
                prop_assert_eq!(sync.time(), GameTime::new(42, i as i64));
            }
        }

        #[test]
        fn prop_resume_never_decreases_time(sub_steps in 0i64..20, next in 43i64..200) {
            let mut sync = TimeSynchronizer::new();
            sync.set_cycle_stopped(false);
            sync.update(42, true);
            sync.set_cycle_stopped(true);
            for _ in 0..sub_steps {
                sync.update(42, true);
            }
            let before = sync.time();
            sync.set_cycle_stopped(false);
            sync.update(next, true);
            prop_assert!(sync.time() > before);
        }
    }
}
