//! Shared protocol types.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Field side assigned by the server at init.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Side {
    Left,
    Right,
    Neutral,
}

impl Side {
    pub fn from_char(c: char) -> Self {
        match c {
            'l' => Side::Left,
            'r' => Side::Right,
            _ => Side::Neutral,
        }
    }

    pub fn as_char(&self) -> char {
        match self {
            Side::Left => 'l',
            Side::Right => 'r',
            Side::Neutral => 'n',
        }
    }

    pub fn opposite(&self) -> Self {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
            Side::Neutral => Side::Neutral,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// Referee card kinds announced on the audio side channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Card {
    Yellow,
    Red,
}

/// Uniform numbers are 1..=11; anything else is unknown.
pub const UNUM_UNKNOWN: i32 = -1;
pub const MAX_UNUM: i32 = 11;
