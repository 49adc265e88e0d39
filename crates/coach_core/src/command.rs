//! Outbound command rendering.
//!
//! A `CoachCommand` is the abstract shape of an outbound intent; `render`
//! turns it into protocol text. An empty rendering means "nothing to send"
//! and the gateway refuses to transmit it. Version and rate gating happen in
//! the session, which knows the negotiated version and the current time.

use std::fmt::Write;

#[derive(Debug, Clone, PartialEq)]
pub enum CoachCommand {
    Init { team_name: String, version: f64, coach_name: Option<String> },
    Bye,
    CheckBall,
    Look,
    TeamNames,
    Eye { on: bool },
    Compression { level: i32 },
    ChangePlayerType { unum: i32, type_id: i32 },
    /// Bare broadcast, protocol versions below 7.
    Say { message: String },
    /// Structured envelope form, protocol versions 7 and above.
    SayFreeform { message: String },
    TeamGraphic { x: i32, y: i32, tile: Vec<String> },
    Done,
}

impl CoachCommand {
    pub fn render(&self) -> String {
        match self {
            CoachCommand::Init { team_name, version, coach_name } => match coach_name {
                Some(name) => format!("(init {} {} (version {}))", team_name, name, version),
                None => format!("(init {} (version {}))", team_name, version),
            },
            CoachCommand::Bye => "(bye)".to_string(),
            CoachCommand::CheckBall => "(check_ball)".to_string(),
            CoachCommand::Look => "(look)".to_string(),
            CoachCommand::TeamNames => "(team_names)".to_string(),
            CoachCommand::Eye { on } => {
                format!("(eye {})", if *on { "on" } else { "off" })
            }
            CoachCommand::Compression { level } => format!("(compression {})", level),
            CoachCommand::ChangePlayerType { unum, type_id } => {
                format!("(change_player_type {} {})", unum, type_id)
            }
            CoachCommand::Say { message } => {
                if message.is_empty() {
                    String::new()
                } else {
                    format!("(say {})", message)
                }
            }
            CoachCommand::SayFreeform { message } => {
                if message.is_empty() {
                    String::new()
                } else {
                    format!("(say (freeform \"{}\"))", message)
                }
            }
            CoachCommand::TeamGraphic { x, y, tile } => {
                if tile.is_empty() {
                    return String::new();
                }
                let mut out = String::new();
                let _ = write!(out, "(team_graphic ({} {}", x, y);
                for line in tile {
                    let _ = write!(out, " \"{}\"", line);
                }
                out.push_str("))");
                out
            }
            CoachCommand::Done => "(done)".to_string(),
        }
    }
}
