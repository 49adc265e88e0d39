//! Game time representation.
//!
//! The server counts time in whole cycles. While the game clock is frozen
//! (every play mode except open play) the server may still emit fresh global
//! vision frames; those frames are sequenced by the `stopped` sub-step so
//! that every materially new observation has a distinct, strictly larger
//! `GameTime`.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A simulated instant: `(cycle, stopped)`.
///
/// Ordering compares `cycle` first, then `stopped` (derived lexicographic
/// order matches the field order).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GameTime {
    /// Primary cycle counter reported by the server. `-1` is the
    /// "never" sentinel used before the first decision.
    pub cycle: i64,
    /// Sub-step counter while the server clock is stopped.
    pub stopped: i64,
}

impl GameTime {
    pub const fn new(cycle: i64, stopped: i64) -> Self {
        Self { cycle, stopped }
    }

    /// Sentinel used for "no decision has happened yet".
    pub const fn never() -> Self {
        Self { cycle: -1, stopped: 0 }
    }
}

impl Default for GameTime {
    fn default() -> Self {
        Self::new(0, 0)
    }
}

impl fmt::Display for GameTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.cycle, self.stopped)
    }
}
