//! Server message classifier.
//!
//! Decodes one raw text line into a closed set of tagged variants before any
//! handler runs. This replaces ordered prefix matching: pattern matching on
//! `ServerMessage` makes the unsupported-message path a single default arm
//! and removes prefix-collision ordering hazards.
//!
//! Sub-parse failure inside a recognized tag yields `CoachError::Malformed`;
//! the dispatcher logs it and drops the line. The one exception is `(init`:
//! a rejected or unreadable init reply is reported as `Init { side: None }`
//! so the session can treat it as a protocol violation.

use crate::error::{CoachError, Result};
use crate::types::Side;

/// Acknowledgement sub-kinds carried by `(ok ...)` replies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AckKind {
    Say,
    TeamGraphic { x: i32, y: i32 },
    Look,
    CheckBall,
    ChangePlayerType { unum: i32, type_id: i32 },
    Compression { level: i32 },
    Eye,
    TeamNames { left: String, right: Option<String> },
    Other,
}

/// Who spoke in a `(hear ...)` message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HearSender {
    /// Referee announcement; `text` is the body up to the closing paren.
    Referee { text: String },
    /// A player on either team; the audio sensor does the sub-parsing.
    Player,
    Unknown { token: String },
}

/// One decoded server message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerMessage {
    SeeGlobal { cycle: i64 },
    Hear { cycle: i64, sender: HearSender },
    Think,
    /// `type_id` is `None` for opponent announcements, which hide the type.
    ChangePlayerType { unum: i32, type_id: Option<i32> },
    CLangVersion,
    PlayerType,
    PlayerParam,
    ServerParam,
    Ack(AckKind),
    Error { text: String },
    Warning { text: String },
    Score { text: String },
    /// `side` is `None` when the server rejected the session init.
    Init { side: Option<Side> },
    Include,
    Unsupported,
}

/// Decode one raw line.
pub fn classify(raw: &str) -> Result<ServerMessage> {
    let tag = leading_tag(raw);
    match tag {
        "see_global" => {
            let cycle = cycle_after_tag(raw)
                .ok_or_else(|| malformed("see_global time", raw))?;
            Ok(ServerMessage::SeeGlobal { cycle })
        }
        "hear" => parse_hear(raw),
        "think" => Ok(ServerMessage::Think),
        "change_player_type" => parse_change_player_type(raw),
        "clang" => Ok(ServerMessage::CLangVersion),
        "player_type" => Ok(ServerMessage::PlayerType),
        "player_param" => Ok(ServerMessage::PlayerParam),
        "server_param" => Ok(ServerMessage::ServerParam),
        "ok" => parse_ack(raw),
        "error" => Ok(ServerMessage::Error { text: body_text(raw, "error") }),
        "warning" => Ok(ServerMessage::Warning { text: body_text(raw, "warning") }),
        "score" => Ok(ServerMessage::Score { text: body_text(raw, "score") }),
        "init" => Ok(parse_init(raw)),
        "include" => Ok(ServerMessage::Include),
        _ => Ok(ServerMessage::Unsupported),
    }
}

fn malformed(what: &str, raw: &str) -> CoachError {
    CoachError::Malformed(format!("failed to parse {}: [{}]", what, raw))
}

/// First token after the opening paren, up to whitespace or `)`.
fn leading_tag(raw: &str) -> &str {
    let rest = raw.trim_start().strip_prefix('(').unwrap_or(raw);
    rest.split(|c: char| c.is_whitespace() || c == ')').next().unwrap_or("")
}

/// Second whitespace-separated token parsed as a cycle number.
fn cycle_after_tag(raw: &str) -> Option<i64> {
    raw.trim_start()
        .trim_start_matches('(')
        .split_whitespace()
        .nth(1)?
        .trim_end_matches(')')
        .parse()
        .ok()
}

/// Everything between `(<tag> ` and the final `)`.
fn body_text(raw: &str, tag: &str) -> String {
    raw.trim()
        .strip_prefix('(')
        .and_then(|s| s.strip_prefix(tag))
        .map(|s| s.trim_start().trim_end_matches(')').to_string())
        .unwrap_or_default()
}

fn parse_hear(raw: &str) -> Result<ServerMessage> {
    // (hear <time> referee <playmode>)
    // (hear <time> (player "<team>" <unum>) "<msg>")
    // (hear <time> (p "<team>" <unum>) "<msg>")
    let cycle = cycle_after_tag(raw).ok_or_else(|| malformed("hear time", raw))?;

    let mut tokens = raw.trim_start().trim_start_matches('(').split_whitespace();
    let sender = tokens.nth(2).ok_or_else(|| malformed("hear sender", raw))?;

    let sender = if sender == "referee" {
        let text = tokens.collect::<Vec<_>>().join(" ");
        let text = text.split(')').next().unwrap_or("").trim().to_string();
        if text.is_empty() {
            return Err(malformed("referee message", raw));
        }
        HearSender::Referee { text }
    } else if sender.starts_with("(p") {
        HearSender::Player
    } else {
        HearSender::Unknown { token: sender.to_string() }
    };

    Ok(ServerMessage::Hear { cycle, sender })
}

fn parse_change_player_type(raw: &str) -> Result<ServerMessage> {
    // teammate: (change_player_type <unum> <type>)
    // opponent: (change_player_type <unum>)
    let body = body_text(raw, "change_player_type");
    let mut nums = body.split_whitespace();
    let unum: i32 = nums
        .next()
        .and_then(|t| t.parse().ok())
        .ok_or_else(|| malformed("change_player_type", raw))?;
    let type_id = match nums.next() {
        Some(t) => Some(t.parse().map_err(|_| malformed("change_player_type", raw))?),
        None => None,
    };
    Ok(ServerMessage::ChangePlayerType { unum, type_id })
}

fn parse_init(raw: &str) -> ServerMessage {
    // (init l ok) | (init r ok)
    let mut tokens = raw.trim_start().trim_start_matches('(').split_whitespace();
    let side = tokens.nth(1).and_then(|t| t.chars().next());
    let ok = tokens.next().map(|t| t.trim_end_matches(')')) == Some("ok");
    match (side, ok) {
        (Some(c @ ('l' | 'r')), true) => ServerMessage::Init { side: Some(Side::from_char(c)) },
        _ => ServerMessage::Init { side: None },
    }
}

fn parse_ack(raw: &str) -> Result<ServerMessage> {
    let body = body_text(raw, "ok");
    let mut tokens = body.split_whitespace();
    let kind = tokens.next().unwrap_or("");

    let ack = match kind {
        "say" => AckKind::Say,
        "team_graphic" => {
            let x: i32 = tokens
                .next()
                .and_then(|t| t.parse().ok())
                .ok_or_else(|| malformed("ok team_graphic", raw))?;
            let y: i32 = tokens
                .next()
                .and_then(|t| t.trim_end_matches(')').parse().ok())
                .ok_or_else(|| malformed("ok team_graphic", raw))?;
            if x < 0 || y < 0 {
                return Err(malformed("ok team_graphic", raw));
            }
            AckKind::TeamGraphic { x, y }
        }
        "look" => AckKind::Look,
        "check_ball" => AckKind::CheckBall,
        "change_player_type" => {
            let unum: i32 = tokens
                .next()
                .and_then(|t| t.parse().ok())
                .ok_or_else(|| malformed("ok change_player_type", raw))?;
            let type_id: i32 = tokens
                .next()
                .and_then(|t| t.trim_end_matches(')').parse().ok())
                .ok_or_else(|| malformed("ok change_player_type", raw))?;
            AckKind::ChangePlayerType { unum, type_id }
        }
        "compression" => {
            let level: i32 = tokens
                .next()
                .and_then(|t| t.trim_end_matches(')').parse().ok())
                .ok_or_else(|| malformed("ok compression", raw))?;
            AckKind::Compression { level }
        }
        "eye" => AckKind::Eye,
        "team_names" => parse_team_names(&body).ok_or_else(|| malformed("ok team_names", raw))?,
        _ => AckKind::Other,
    };
    Ok(ServerMessage::Ack(ack))
}

fn parse_team_names(body: &str) -> Option<AckKind> {
    // team_names (team l <name>) [(team r <name>)]
    let mut names = Vec::new();
    let mut rest = body;
    while let Some(start) = rest.find("(team ") {
        let seg = &rest[start + "(team ".len()..];
        // the outer trim may already have eaten the last closing paren
        let end = seg.find(')').unwrap_or(seg.len());
        let mut parts = seg[..end].splitn(2, char::is_whitespace);
        let _side = parts.next()?;
        let name = parts.next()?.trim().to_string();
        names.push(name);
        rest = &seg[end..];
    }
    let mut names = names.into_iter();
    let left = names.next()?;
    Some(AckKind::TeamNames { left, right: names.next() })
}
