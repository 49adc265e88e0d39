//! Game-mode tracker.
//!
//! Owns the referee-reported play state. Card and training announcements are
//! side-channel events handled by the session before this tracker runs; an
//! unrecognized token here simply reports rejection so the caller can warn.

use serde::{Deserialize, Serialize};

use crate::time::GameTime;
use crate::types::Side;

/// Referee play modes.
///
/// Sided modes carry the side the restart is awarded to. `AfterGoal` is
/// announced as `goal_<side>_<score>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlayMode {
    BeforeKickOff,
    TimeOver,
    PlayOn,
    KickOff(Side),
    KickIn(Side),
    FreeKick(Side),
    CornerKick(Side),
    GoalKick(Side),
    AfterGoal(Side),
    DropBall,
    OffSide(Side),
    PenaltyKick(Side),
    FirstHalfOver,
    Pause,
    Human,
    FoulCharge(Side),
    FoulPush(Side),
    FoulMultipleAttacker(Side),
    FoulBallOut(Side),
    BackPass(Side),
    FreeKickFault(Side),
    CatchFault(Side),
    IndFreeKick(Side),
    PenaltySetup(Side),
    PenaltyReady(Side),
    PenaltyTaken(Side),
    PenaltyMiss(Side),
    PenaltyScore(Side),
    PenaltyOnfield(Side),
    PenaltyFoul(Side),
    PenaltyWinner(Side),
    PenaltyDraw,
    GoalieCatchBall(Side),
    HalfTime,
    TimeUp,
    ExtendHalfTime,
    TimeExtended,
    TimeUpWithoutATeam,
}

impl PlayMode {
    /// Parse one referee play-mode token, e.g. `play_on`, `kick_off_l`,
    /// `goal_r_2`. Returns `None` for anything unrecognized.
    pub fn parse(token: &str) -> Option<Self> {
        // unsided modes first
        match token {
            "before_kick_off" => return Some(PlayMode::BeforeKickOff),
            "time_over" => return Some(PlayMode::TimeOver),
            "play_on" => return Some(PlayMode::PlayOn),
            "drop_ball" => return Some(PlayMode::DropBall),
            "first_half_over" => return Some(PlayMode::FirstHalfOver),
            "pause" => return Some(PlayMode::Pause),
            "human_judge" => return Some(PlayMode::Human),
            "penalty_draw" => return Some(PlayMode::PenaltyDraw),
            "half_time" => return Some(PlayMode::HalfTime),
            "time_up" => return Some(PlayMode::TimeUp),
            "extend_half_time" => return Some(PlayMode::ExtendHalfTime),
            "time_extended" => return Some(PlayMode::TimeExtended),
            "time_up_without_a_team" => return Some(PlayMode::TimeUpWithoutATeam),
            _ => {}
        }

        // goal_<side>_<score>
        if let Some(rest) = token.strip_prefix("goal_") {
            let mut parts = rest.split('_');
            if let Some(side) = parts.next().and_then(Self::side_token) {
                if parts.next().map_or(true, |s| s.parse::<i64>().is_ok()) {
                    return Some(PlayMode::AfterGoal(side));
                }
            }
        }

        // sided modes: <base>_<l|r>
        let (base, side) = token.rsplit_once('_')?;
        let side = Self::side_token(side)?;
        let mode = match base {
            "kick_off" => PlayMode::KickOff(side),
            "kick_in" => PlayMode::KickIn(side),
            "free_kick" => PlayMode::FreeKick(side),
            "corner_kick" => PlayMode::CornerKick(side),
            "goal_kick" => PlayMode::GoalKick(side),
            "offside" => PlayMode::OffSide(side),
            "penalty_kick" => PlayMode::PenaltyKick(side),
            "foul_charge" => PlayMode::FoulCharge(side),
            "foul_push" => PlayMode::FoulPush(side),
            "foul_multiple_attacker" => PlayMode::FoulMultipleAttacker(side),
            "foul_ballout" => PlayMode::FoulBallOut(side),
            "back_pass" => PlayMode::BackPass(side),
            "free_kick_fault" => PlayMode::FreeKickFault(side),
            "catch_fault" => PlayMode::CatchFault(side),
            "indirect_free_kick" => PlayMode::IndFreeKick(side),
            "penalty_setup" => PlayMode::PenaltySetup(side),
            "penalty_ready" => PlayMode::PenaltyReady(side),
            "penalty_taken" => PlayMode::PenaltyTaken(side),
            "penalty_miss" => PlayMode::PenaltyMiss(side),
            "penalty_score" => PlayMode::PenaltyScore(side),
            "penalty_onfield" => PlayMode::PenaltyOnfield(side),
            "penalty_foul" => PlayMode::PenaltyFoul(side),
            "penalty_winner" => PlayMode::PenaltyWinner(side),
            "goalie_catch_ball" => PlayMode::GoalieCatchBall(side),
            _ => return None,
        };
        Some(mode)
    }

    fn side_token(token: &str) -> Option<Side> {
        match token {
            "l" => Some(Side::Left),
            "r" => Some(Side::Right),
            _ => None,
        }
    }
}

/// Current referee state plus the time it was announced.
#[derive(Debug, Clone)]
pub struct GameMode {
    play_mode: PlayMode,
    time: GameTime,
}

impl Default for GameMode {
    fn default() -> Self {
        Self { play_mode: PlayMode::BeforeKickOff, time: GameTime::default() }
    }
}

impl GameMode {
    pub fn play_mode(&self) -> PlayMode {
        self.play_mode
    }

    pub fn time(&self) -> GameTime {
        self.time
    }

    /// Apply a referee play-mode token. Returns false (state untouched) when
    /// the token is not a play mode.
    pub fn update(&mut self, mode_text: &str, current_time: GameTime) -> bool {
        match PlayMode::parse(mode_text) {
            Some(mode) => {
                self.play_mode = mode;
                self.time = current_time;
                true
            }
            None => false,
        }
    }

    /// Whether the server freezes its cycle counter in this mode.
    /// Everything except open play stops the clock.
    pub fn is_server_cycle_stopped_mode(&self) -> bool {
        !matches!(self.play_mode, PlayMode::PlayOn)
    }

    /// Whether this mode terminates the match.
    pub fn is_game_end_mode(&self) -> bool {
        matches!(
            self.play_mode,
            PlayMode::TimeOver | PlayMode::TimeUp | PlayMode::TimeUpWithoutATeam
        )
    }

    pub fn is_penalty_kick_mode(&self) -> bool {
        matches!(
            self.play_mode,
            PlayMode::PenaltySetup(_)
                | PlayMode::PenaltyReady(_)
                | PlayMode::PenaltyTaken(_)
                | PlayMode::PenaltyMiss(_)
                | PlayMode::PenaltyScore(_)
        )
    }
}
