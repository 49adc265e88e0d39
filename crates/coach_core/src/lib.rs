//! # coach_core - Coaching-side protocol client
//!
//! Message dispatch and time-synchronization engine for the coach client of
//! a cycle-based soccer simulation server.
//!
//! The server speaks a line-oriented, S-expression-like text protocol and
//! can silently freeze and resume its game clock mid-match. This crate turns
//! that stream into:
//! - an authoritative `GameTime` that stays strictly increasing across
//!   clock stops (`sync`),
//! - play-mode and card state (`mode`, `world`),
//! - gated sensor updates that never apply stale frames (`sensor`),
//! - an at-most-once-per-instant decision trigger and version/rate gated
//!   outbound commands (`agent`, `command`).
//!
//! Transport and the geometric world model are collaborators behind the
//! `Transport` and `WorldModel` traits; `coach_cli` supplies a UDP transport
//! and the run loop.

pub mod agent;
pub mod command;
pub mod config;
pub mod error;
pub mod graphic;
pub mod message;
pub mod mode;
pub mod param;
pub mod sensor;
pub mod sync;
pub mod time;
pub mod transport;
pub mod types;
pub mod world;

#[cfg(test)]
mod agent_tests;

pub use agent::{CoachAgent, CoachBrain, PendingDecision, SilentCoach};
pub use command::CoachCommand;
pub use config::CoachConfig;
pub use error::{CoachError, Result};
pub use graphic::TeamGraphic;
pub use message::{classify, AckKind, HearSender, ServerMessage};
pub use mode::{GameMode, PlayMode};
pub use param::{PlayerParam, PlayerTypeSet, ServerParam};
pub use sensor::{AudioSensor, PlayerMessage, VisualSensor};
pub use sync::TimeSynchronizer;
pub use time::GameTime;
pub use transport::{OfflineLogger, Transport};
pub use types::{Card, Side};
pub use world::{CoachWorldModel, WorldModel};

/// Crate version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
