//! Server-advertised parameter stores.
//!
//! The server dumps its configuration as `(server_param (name value)...)`
//! and `(player_param ...)` messages, plus one `(player_type (id <n>) ...)`
//! message per heterogeneous type. Parsing is tolerant: an unreadable pair
//! is skipped with a debug log, never fatal.

use std::collections::{BTreeSet, HashMap};

/// Split `(name value)` pairs out of a parameter dump body.
///
/// Values may be quoted strings; quotes are stripped.
fn parse_pairs(raw: &str) -> HashMap<String, String> {
    let mut pairs = HashMap::new();
    let body = match raw.trim().find(' ') {
        Some(idx) => &raw.trim()[idx..],
        None => return pairs,
    };

    let mut rest = body;
    while let Some(start) = rest.find('(') {
        let seg = &rest[start + 1..];
        let Some(end) = seg.find(')') else { break };
        let inner = &seg[..end];
        let mut it = inner.splitn(2, char::is_whitespace);
        match (it.next(), it.next()) {
            (Some(name), Some(value)) if !name.is_empty() => {
                let value = value.trim().trim_matches('"').to_string();
                pairs.insert(name.to_string(), value);
            }
            _ => {
                log::debug!("skipped unreadable parameter pair [{}]", inner);
            }
        }
        rest = &seg[end + 1..];
    }
    pairs
}

/// Server parameter set.
///
/// Typed accessors for the handful of values this client acts on; the full
/// dump stays available in the raw map.
#[derive(Debug, Clone)]
pub struct ServerParam {
    values: HashMap<String, String>,

    pub say_coach_msg_size: i64,
    pub say_coach_cnt_max: i64,
    pub slow_down_factor: i64,
    pub synch_mode: bool,
    pub freeform_wait_period: i64,
    pub send_vi_step: i64,
    pub clang_mess_delay: i64,
}

impl Default for ServerParam {
    fn default() -> Self {
        Self {
            values: HashMap::new(),
            say_coach_msg_size: 128,
            say_coach_cnt_max: 128,
            slow_down_factor: 1,
            synch_mode: false,
            freeform_wait_period: 600,
            send_vi_step: 100,
            clang_mess_delay: 50,
        }
    }
}

impl ServerParam {
    pub fn parse(&mut self, raw: &str) {
        let pairs = parse_pairs(raw);
        self.say_coach_msg_size = int_of(&pairs, "say_coach_msg_size", self.say_coach_msg_size);
        self.say_coach_cnt_max = int_of(&pairs, "say_coach_cnt_max", self.say_coach_cnt_max);
        self.slow_down_factor = int_of(&pairs, "slow_down_factor", self.slow_down_factor);
        self.synch_mode = int_of(&pairs, "synch_mode", self.synch_mode as i64) != 0;
        self.freeform_wait_period =
            int_of(&pairs, "freeform_wait_period", self.freeform_wait_period);
        self.send_vi_step = int_of(&pairs, "send_vi_step", self.send_vi_step);
        self.clang_mess_delay = int_of(&pairs, "clang_mess_delay", self.clang_mess_delay);
        self.values.extend(pairs);
    }

    pub fn raw(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }
}

/// Player tradeoff parameter set.
#[derive(Debug, Clone)]
pub struct PlayerParam {
    values: HashMap<String, String>,

    pub player_types: i64,
    pub subs_max: i64,
    pub pt_max: i64,
}

impl Default for PlayerParam {
    fn default() -> Self {
        Self { values: HashMap::new(), player_types: 18, subs_max: 3, pt_max: 1 }
    }
}

impl PlayerParam {
    pub fn parse(&mut self, raw: &str) {
        let pairs = parse_pairs(raw);
        self.player_types = int_of(&pairs, "player_types", self.player_types);
        self.subs_max = int_of(&pairs, "subs_max", self.subs_max);
        self.pt_max = int_of(&pairs, "pt_max", self.pt_max);
        self.values.extend(pairs);
    }

    pub fn raw(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }
}

fn int_of(pairs: &HashMap<String, String>, name: &str, default: i64) -> i64 {
    match pairs.get(name) {
        Some(v) => v.parse().unwrap_or_else(|_| {
            log::debug!("parameter {} has non-integer value [{}]", name, v);
            default
        }),
        None => default,
    }
}

/// Heterogeneous player type ids seen in `(player_type ...)` dumps.
#[derive(Debug, Clone, Default)]
pub struct PlayerTypeSet {
    ids: BTreeSet<i64>,
}

impl PlayerTypeSet {
    pub fn parse(&mut self, raw: &str) {
        let pairs = parse_pairs(raw);
        match pairs.get("id").and_then(|v| v.parse().ok()) {
            Some(id) => {
                self.ids.insert(id);
            }
            None => {
                log::warn!("player_type message without readable id [{}]", raw);
            }
        }
    }

    pub fn contains(&self, id: i64) -> bool {
        self.ids.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}
