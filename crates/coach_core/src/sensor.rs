//! Sensor snapshots.
//!
//! Each sensor keeps exactly one snapshot, replaced wholesale on every
//! readable message of its kind; an unreadable message keeps the previous
//! snapshot. The session applies the freshness gate: a snapshot reaches the
//! world model only when its timestamp equals the synchronized current time
//! at the moment of arrival.

use crate::time::GameTime;

/// Latest global vision frame.
///
/// The geometric decoding of the body belongs to the world model; this
/// client only tracks the payload and the instant it describes.
#[derive(Debug, Clone)]
pub struct VisualSensor {
    time: GameTime,
    body: String,
}

impl Default for VisualSensor {
    fn default() -> Self {
        Self { time: GameTime::never(), body: String::new() }
    }
}

impl VisualSensor {
    /// Accept a frame whose own cycle token matches `current_time` and
    /// that carries an object body. An unreadable frame keeps the previous
    /// snapshot, so its stale timestamp fails the downstream freshness
    /// check.
    pub fn parse(&mut self, raw: &str, current_time: GameTime) -> bool {
        let mut parts = raw.trim_start().trim_start_matches('(').splitn(3, char::is_whitespace);
        let _tag = parts.next();
        let cycle: Option<i64> =
            parts.next().map(|t| t.trim_end_matches(')')).and_then(|t| t.parse().ok());
        let objects = parts.next().map(str::trim_start).unwrap_or("");

        if cycle != Some(current_time.cycle) || !objects.starts_with('(') {
            log::debug!("discarded unreadable vision frame [{}]", raw);
            return false;
        }

        self.body = raw.to_string();
        self.time = current_time;
        true
    }

    pub fn time(&self) -> GameTime {
        self.time
    }

    pub fn body(&self) -> &str {
        &self.body
    }
}

/// One decoded player audio message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerMessage {
    pub team: String,
    pub unum: i32,
    pub our_side: bool,
    pub text: String,
    pub time: GameTime,
}

/// Audio sensor for player messages.
///
/// Referee audio never reaches this sensor; the session routes it to the
/// game-mode tracker instead.
#[derive(Debug, Clone, Default)]
pub struct AudioSensor {
    team_name: String,
    last_player_message: Option<PlayerMessage>,
}

impl AudioSensor {
    /// Own team name, used to classify the sender side.
    pub fn set_team_name(&mut self, name: &str) {
        self.team_name = name.to_string();
    }

    /// Parse `(hear <time> (player "<team>" <unum>) "<msg>")`, also in the
    /// abbreviated `(p ...)` form. Returns the message when readable.
    pub fn parse_player_message(
        &mut self,
        raw: &str,
        current_time: GameTime,
    ) -> Option<&PlayerMessage> {
        let open = raw.find("(p")?;
        let inner = &raw[open..];
        let end = inner.find(')')?;
        let sender = &inner[..end];

        let quote_start = sender.find('"')?;
        let quote_end = sender[quote_start + 1..].find('"')? + quote_start + 1;
        let team = sender[quote_start + 1..quote_end].to_string();
        let unum: i32 = sender[quote_end + 1..].split_whitespace().next()?.parse().ok()?;

        let rest = &inner[end + 1..];
        let text_start = rest.find('"')?;
        let text_end = rest[text_start + 1..].find('"')? + text_start + 1;
        let text = rest[text_start + 1..text_end].to_string();

        let our_side = !self.team_name.is_empty() && team == self.team_name;
        self.last_player_message =
            Some(PlayerMessage { team, unum, our_side, text, time: current_time });
        self.last_player_message.as_ref()
    }

    pub fn last_player_message(&self) -> Option<&PlayerMessage> {
        self.last_player_message.as_ref()
    }
}
