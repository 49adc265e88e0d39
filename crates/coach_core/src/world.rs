//! World-model collaborator interface.
//!
//! The geometric world representation lives outside this crate; the session
//! talks to it through the `WorldModel` trait. `CoachWorldModel` is the
//! bookkeeping implementation shipped here: sides, cards, player types, team
//! names and the freeform send budget. Richer models wrap or replace it.

use std::collections::BTreeMap;

use crate::mode::{GameMode, PlayMode};
use crate::time::GameTime;
use crate::types::{Card, Side};

pub trait WorldModel {
    fn init(&mut self, side: Side, version: f64);

    /// Apply a fresh global vision frame. Called only when the frame's
    /// timestamp equals the synchronized current time.
    fn update_after_see_global(&mut self, body: &str, time: GameTime);

    fn update_game_mode(&mut self, mode: &GameMode, time: GameTime);

    fn set_card(&mut self, side: Side, unum: i32, card: Card);

    /// `type_id` is `None` for opponents, whose type the server hides.
    fn set_player_type(&mut self, side: Side, unum: i32, type_id: Option<i32>);

    fn set_team_name(&mut self, side: Side, name: &str);

    /// Training-episode marker from the referee side channel.
    fn set_training_time(&mut self, time: GameTime);

    /// Reset the freeform budget; `allowed` < 0 means unlimited.
    fn init_freeform_count(&mut self, allowed: i64);

    /// Cycles that must pass after a play-mode change before an open-play
    /// freeform is permitted.
    fn set_freeform_wait_period(&mut self, period: i64);

    fn inc_freeform_send_count(&mut self);

    /// Whether a structured freeform broadcast is permitted at `now`.
    fn can_send_freeform(&self, now: GameTime) -> bool;

    fn our_side(&self) -> Side;
}

/// Minimal stateful world model.
#[derive(Debug, Clone)]
pub struct CoachWorldModel {
    our_side: Side,
    version: f64,
    team_names: BTreeMap<Side, String>,
    cards: BTreeMap<(Side, i32), Card>,
    player_types: BTreeMap<(Side, i32), Option<i32>>,
    play_mode: PlayMode,
    last_mode_time: GameTime,
    last_see_time: GameTime,
    training_time: Option<GameTime>,
    freeform_allowed: i64,
    freeform_sent: i64,
    freeform_wait_period: i64,
}

impl Default for CoachWorldModel {
    fn default() -> Self {
        Self {
            our_side: Side::Neutral,
            version: 0.0,
            team_names: BTreeMap::new(),
            cards: BTreeMap::new(),
            player_types: BTreeMap::new(),
            play_mode: PlayMode::BeforeKickOff,
            last_mode_time: GameTime::default(),
            last_see_time: GameTime::never(),
            training_time: None,
            freeform_allowed: -1,
            freeform_sent: 0,
            freeform_wait_period: 600,
        }
    }
}

impl CoachWorldModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn card(&self, side: Side, unum: i32) -> Option<Card> {
        self.cards.get(&(side, unum)).copied()
    }

    pub fn player_type(&self, side: Side, unum: i32) -> Option<Option<i32>> {
        self.player_types.get(&(side, unum)).copied()
    }

    pub fn team_name(&self, side: Side) -> Option<&str> {
        self.team_names.get(&side).map(String::as_str)
    }

    pub fn play_mode(&self) -> PlayMode {
        self.play_mode
    }

    pub fn last_see_time(&self) -> GameTime {
        self.last_see_time
    }

    pub fn training_time(&self) -> Option<GameTime> {
        self.training_time
    }

    pub fn freeform_sent(&self) -> i64 {
        self.freeform_sent
    }
}

impl WorldModel for CoachWorldModel {
    fn init(&mut self, side: Side, version: f64) {
        self.our_side = side;
        self.version = version;
    }

    fn update_after_see_global(&mut self, _body: &str, time: GameTime) {
        self.last_see_time = time;
    }

    fn update_game_mode(&mut self, mode: &GameMode, time: GameTime) {
        self.play_mode = mode.play_mode();
        self.last_mode_time = time;
    }

    fn set_card(&mut self, side: Side, unum: i32, card: Card) {
        self.cards.insert((side, unum), card);
    }

    fn set_player_type(&mut self, side: Side, unum: i32, type_id: Option<i32>) {
        self.player_types.insert((side, unum), type_id);
    }

    fn set_team_name(&mut self, side: Side, name: &str) {
        self.team_names.insert(side, name.to_string());
    }

    fn set_training_time(&mut self, time: GameTime) {
        self.training_time = Some(time);
    }

    fn init_freeform_count(&mut self, allowed: i64) {
        self.freeform_allowed = allowed;
        self.freeform_sent = 0;
    }

    fn set_freeform_wait_period(&mut self, period: i64) {
        self.freeform_wait_period = period;
    }

    fn inc_freeform_send_count(&mut self) {
        self.freeform_sent += 1;
    }

    fn can_send_freeform(&self, now: GameTime) -> bool {
        // outside open play the coach may always talk
        if self.play_mode != PlayMode::PlayOn {
            return true;
        }
        if self.freeform_allowed >= 0 && self.freeform_sent >= self.freeform_allowed {
            return false;
        }
        now.cycle - self.last_mode_time.cycle >= self.freeform_wait_period
    }

    fn our_side(&self) -> Side {
        self.our_side
    }
}
