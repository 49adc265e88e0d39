//! Coach session orchestration.
//!
//! `CoachAgent` owns every piece of mutable session state (time, game mode,
//! sensors, pending decision, upload counters) and drives it from a single
//! logical thread: the host loop alternates between "drain all buffered
//! inbound messages" and "invoke the decision trigger", with a timeout
//! callback when nothing arrives within the configured wait.
//!
//! Guarantees kept here:
//! - the decision fires at most once per distinct `GameTime`;
//! - a vision frame whose timestamp no longer matches the synchronized time
//!   never reaches the world model;
//! - once the peer is marked dead, inbound messages are ignored and no
//!   further commands are emitted.

use crate::command::CoachCommand;
use crate::config::CoachConfig;
use crate::error::{CoachError, Result};
use crate::graphic::TeamGraphic;
use crate::message::{self, AckKind, HearSender, ServerMessage};
use crate::mode::GameMode;
use crate::param::{PlayerParam, PlayerTypeSet, ServerParam};
use crate::sensor::{AudioSensor, VisualSensor};
use crate::sync::TimeSynchronizer;
use crate::time::GameTime;
use crate::transport::{OfflineLogger, Transport};
use crate::types::{Card, Side, MAX_UNUM, UNUM_UNKNOWN};
use crate::world::WorldModel;

/// Decision bookkeeping.
#[derive(Debug, Clone)]
pub struct PendingDecision {
    /// Time of the last fired decision; `GameTime::never()` before the first.
    pub last_decision: GameTime,
    /// Set by the server's explicit think signal, cleared after the fire.
    pub think_received: bool,
}

impl Default for PendingDecision {
    fn default() -> Self {
        Self { last_decision: GameTime::never(), think_received: false }
    }
}

/// Agent logic seam. The session calls `decide` when the trigger fires; the
/// implementation issues commands back through the agent.
pub trait CoachBrain<W: WorldModel> {
    fn decide(&mut self, agent: &mut CoachAgent<W>);
}

/// A brain that never says anything. Useful for spectating and tests.
pub struct SilentCoach;

impl<W: WorldModel> CoachBrain<W> for SilentCoach {
    fn decide(&mut self, agent: &mut CoachAgent<W>) {
        log::debug!("decision at {}", agent.time());
    }
}

pub struct CoachAgent<W: WorldModel> {
    config: CoachConfig,
    transport: Box<dyn Transport>,
    world: W,

    sync: TimeSynchronizer,
    game_mode: GameMode,
    visual: VisualSensor,
    audio: AudioSensor,
    server_param: ServerParam,
    player_param: PlayerParam,
    player_types: PlayerTypeSet,
    pending: PendingDecision,

    team_graphic: TeamGraphic,
    graphic_send_time: GameTime,
    graphic_send_count: u32,

    offline_log: Option<OfflineLogger>,
    last_error: Option<CoachError>,
}

impl<W: WorldModel> CoachAgent<W> {
    pub fn new(config: CoachConfig, world: W, transport: Box<dyn Transport>) -> Self {
        Self {
            config,
            transport,
            world,
            sync: TimeSynchronizer::new(),
            game_mode: GameMode::default(),
            visual: VisualSensor::default(),
            audio: AudioSensor::default(),
            server_param: ServerParam::default(),
            player_param: PlayerParam::default(),
            player_types: PlayerTypeSet::default(),
            pending: PendingDecision::default(),
            team_graphic: TeamGraphic::default(),
            graphic_send_time: GameTime::never(),
            graphic_send_count: 0,
            offline_log: None,
            last_error: None,
        }
    }

    // === Accessors ===

    pub fn config(&self) -> &CoachConfig {
        &self.config
    }

    pub fn time(&self) -> GameTime {
        self.sync.time()
    }

    pub fn game_mode(&self) -> &GameMode {
        &self.game_mode
    }

    pub fn visual(&self) -> &VisualSensor {
        &self.visual
    }

    pub fn audio(&self) -> &AudioSensor {
        &self.audio
    }

    pub fn server_param(&self) -> &ServerParam {
        &self.server_param
    }

    pub fn player_param(&self) -> &PlayerParam {
        &self.player_param
    }

    pub fn player_types(&self) -> &PlayerTypeSet {
        &self.player_types
    }

    pub fn world(&self) -> &W {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut W {
        &mut self.world
    }

    pub fn team_graphic(&self) -> &TeamGraphic {
        &self.team_graphic
    }

    pub fn set_team_graphic(&mut self, graphic: TeamGraphic) {
        self.team_graphic = graphic;
    }

    pub fn is_server_alive(&self) -> bool {
        self.transport.is_server_alive()
    }

    /// The error that terminated the session, when one did.
    pub fn last_error(&self) -> Option<&CoachError> {
        self.last_error.as_ref()
    }

    /// Record a terminal session error and mark the peer dead.
    fn fail(&mut self, err: CoachError) {
        log::error!("{} coach: {}", self.config.team_name, err);
        self.last_error = Some(err);
        self.transport.set_server_alive(false);
    }

    // === Session lifecycle ===

    /// Connect, open the offline log if configured, and send the init
    /// command. Any failure here marks the peer dead and aborts startup.
    pub fn handle_start(&mut self) -> Result<()> {
        if self.config.host.is_empty() {
            self.transport.set_server_alive(false);
            return Err(CoachError::Config("server host name is empty".to_string()));
        }

        if !self.transport.connect(&self.config.host, self.config.port) {
            self.transport.set_server_alive(false);
            return Err(CoachError::Resource(format!(
                "failed to connect to {}:{}",
                self.config.host, self.config.port
            )));
        }

        if self.config.offline_logging {
            let path = self.config.offline_log_path();
            match OfflineLogger::open(std::path::Path::new(&path)) {
                Ok(logger) => self.offline_log = Some(logger),
                Err(e) => {
                    self.transport.set_server_alive(false);
                    return Err(e);
                }
            }
        }

        self.send_init_command();
        Ok(())
    }

    fn send_init_command(&mut self) {
        let command = CoachCommand::Init {
            team_name: self.config.team_name.clone(),
            version: self.config.version,
            coach_name: self.config.coach_name.clone(),
        };
        if !self.send_command(&command) {
            log::error!("{} coach: failed to send init", self.config.team_name);
            self.transport.set_server_alive(false);
        }
    }

    /// Send the disconnect command and enter the terminal state.
    pub fn send_bye(&mut self) {
        self.send_command(&CoachCommand::Bye);
        self.transport.set_server_alive(false);
    }

    /// Graceful shutdown from the host loop.
    pub fn finalize(&mut self) {
        if self.transport.is_server_alive() {
            self.send_bye();
        }
        log::info!("{} coach: finished", self.config.team_name);
    }

    // === Receive path ===

    /// Drain every currently buffered inbound message, then run the
    /// decision trigger if the think signal arrived. Returns the number of
    /// messages processed so the host loop can track quiet intervals.
    pub fn handle_message(&mut self, brain: &mut dyn CoachBrain<W>) -> usize {
        let start_time = self.sync.time();
        let mut counter = 0usize;

        while let Some(raw) = self.transport.recv() {
            counter += 1;
            if let Some(logger) = self.offline_log.as_mut() {
                logger.log_received(&raw);
            }
            self.dispatch(&raw);
        }

        let now = self.sync.time();
        if now.cycle > start_time.cycle + 1 && start_time.stopped == 0 && now.stopped == 0 {
            // Observational only; decisions are neither gated nor retried.
            log::warn!(
                "{} coach: parser used several steps -- missed an action! received {} messages, \
                 start time={} end time={}",
                self.config.team_name,
                counter,
                start_time,
                now
            );
        }

        if self.pending.think_received {
            self.action(brain);
        }

        counter
    }

    /// Timeout callback from the host loop. `waited_ms` is the accumulated
    /// quiet time since the last received message.
    pub fn handle_timeout(&mut self, waited_ms: u64, brain: &mut dyn CoachBrain<W>) {
        if !self.transport.is_server_alive() {
            return;
        }

        let wait_limit_ms = self.config.server_wait_seconds * 1000;
        if waited_ms > wait_limit_ms {
            // With vision on, the server talks every cycle; silence past the
            // limit means it is gone. Without vision, probe first and only
            // give up after twice the limit.
            if self.config.use_eye || waited_ms > wait_limit_ms * 2 {
                self.fail(CoachError::Liveness(format!(
                    "waited {} seconds. server down??",
                    waited_ms / 1000
                )));
                return;
            }
            self.do_check_ball();
        }

        if self.pending.last_decision != self.sync.time() {
            let fresh_vision = self.visual.time() == self.sync.time();
            let slow_down = self.server_param.slow_down_factor.max(1) as u64;
            if fresh_vision || waited_ms >= 20 * slow_down {
                log::debug!("timeout decision, {}ms from last sensory", waited_ms);
                self.action(brain);
            }
        }
    }

    /// Fire the decision routine, at most once per distinct `GameTime`.
    /// A think-triggered fire is acknowledged with `(done)`.
    pub fn action(&mut self, brain: &mut dyn CoachBrain<W>) {
        if !self.transport.is_server_alive() {
            self.pending.think_received = false;
            return;
        }

        if self.config.offline_logging && !self.server_param.synch_mode {
            if let Some(logger) = self.offline_log.as_mut() {
                logger.log_think();
            }
        }

        if self.pending.last_decision != self.sync.time() {
            brain.decide(self);
            self.pending.last_decision = self.sync.time();
        }

        if self.pending.think_received {
            self.send_command(&CoachCommand::Done);
            self.pending.think_received = false;
        }
    }

    /// Route one raw inbound line. Never fatal: malformed and unsupported
    /// messages are logged and dropped.
    pub fn dispatch(&mut self, raw: &str) {
        if !self.transport.is_server_alive() {
            return;
        }

        let message = match message::classify(raw) {
            Ok(message) => message,
            Err(e) => {
                log::warn!("{} coach: {}", self.config.team_name, e);
                return;
            }
        };

        match message {
            ServerMessage::SeeGlobal { cycle } => self.handle_see_global(cycle, raw),
            ServerMessage::Hear { cycle, sender } => self.handle_hear(cycle, sender, raw),
            ServerMessage::Think => {
                self.pending.think_received = true;
            }
            ServerMessage::ChangePlayerType { unum, type_id } => {
                self.handle_change_player_type(unum, type_id);
            }
            ServerMessage::CLangVersion => {
                log::debug!("clang version message ignored");
            }
            ServerMessage::PlayerType => self.player_types.parse(raw),
            ServerMessage::PlayerParam => self.player_param.parse(raw),
            ServerMessage::ServerParam => self.handle_server_param(raw),
            ServerMessage::Ack(kind) => self.handle_ack(kind, raw),
            ServerMessage::Error { text } => {
                log::warn!("{} coach: server error [{}]", self.config.team_name, text);
            }
            ServerMessage::Warning { text } => {
                log::warn!("{} coach: server warning [{}]", self.config.team_name, text);
            }
            ServerMessage::Score { text } => {
                log::info!("{} coach: score {}", self.config.team_name, text);
            }
            ServerMessage::Init { side } => self.handle_init(side),
            ServerMessage::Include => {
                log::info!("{} coach: include directive ignored", self.config.team_name);
            }
            ServerMessage::Unsupported => {
                log::warn!(
                    "{} coach: {} received unsupported message: [{}]",
                    self.config.team_name,
                    self.sync.time(),
                    raw
                );
            }
        }
    }

    fn handle_see_global(&mut self, cycle: i64, raw: &str) {
        self.sync.update(cycle, true);
        let now = self.sync.time();
        self.visual.parse(raw, now);

        // Freshness gate: a reordered frame describing an instant the
        // synchronizer has moved past must never be applied.
        if self.visual.time() == now {
            self.world.update_after_see_global(self.visual.body(), now);
        }
    }

    fn handle_hear(&mut self, cycle: i64, sender: HearSender, raw: &str) {
        self.sync.update(cycle, false);
        match sender {
            HearSender::Referee { text } => self.handle_hear_referee(&text),
            HearSender::Player => {
                if self.config.hear_say {
                    self.audio.parse_player_message(raw, self.sync.time());
                }
            }
            HearSender::Unknown { token } => {
                log::debug!("hear from unknown sender [{}]", token);
            }
        }
    }

    fn handle_hear_referee(&mut self, text: &str) {
        let now = self.sync.time();

        // Side-channel announcements do not change the play mode and must
        // short-circuit before the unknown-mode warning.
        if let Some(rest) = strip_card_prefix(text, "yellow_card") {
            let (side, unum) = parse_card_target(rest).unwrap_or_else(|| {
                log::warn!("{} coach: could not parse [{}]", self.config.team_name, text);
                (Side::Neutral, UNUM_UNKNOWN)
            });
            self.world.set_card(side, unum, Card::Yellow);
            return;
        }
        if let Some(rest) = strip_card_prefix(text, "red_card") {
            let (side, unum) = parse_card_target(rest).unwrap_or_else(|| {
                log::warn!("{} coach: could not parse [{}]", self.config.team_name, text);
                (Side::Neutral, UNUM_UNKNOWN)
            });
            self.world.set_card(side, unum, Card::Red);
            return;
        }
        if text.starts_with("training") {
            // end of a training episode
            self.world.set_training_time(now);
            return;
        }

        if !self.game_mode.update(text, now) {
            log::warn!("{} coach: unknown playmode [{}]", self.config.team_name, text);
            return;
        }

        self.sync.set_cycle_stopped(self.game_mode.is_server_cycle_stopped_mode());

        if self.game_mode.is_game_end_mode() {
            self.send_bye();
            return;
        }

        self.world.update_game_mode(&self.game_mode, now);
    }

    fn handle_change_player_type(&mut self, unum: i32, type_id: Option<i32>) {
        match type_id {
            Some(id) => {
                self.world.set_player_type(self.world.our_side(), unum, Some(id));
            }
            None => {
                let their_side = self.world.our_side().opposite();
                self.world.set_player_type(their_side, unum, None);
            }
        }
    }

    fn handle_server_param(&mut self, raw: &str) {
        self.server_param.parse(raw);
        self.world.init_freeform_count(self.server_param.say_coach_cnt_max);
        self.world.set_freeform_wait_period(self.server_param.freeform_wait_period);

        if !self.server_param.synch_mode && self.server_param.slow_down_factor > 1 {
            let interval = self.config.interval_ms * self.server_param.slow_down_factor as u64;
            self.transport.set_interval_ms(interval);
        }
    }

    fn handle_ack(&mut self, kind: AckKind, raw: &str) {
        match kind {
            AckKind::Say => {}
            AckKind::TeamGraphic { x, y } => {
                self.team_graphic.mark_acked(x, y);
            }
            AckKind::Look | AckKind::CheckBall | AckKind::Eye => {
                log::info!("{} coach: recv {}", self.config.team_name, raw);
            }
            AckKind::ChangePlayerType { unum, type_id } => {
                log::debug!("change_player_type acknowledged: {} -> {}", unum, type_id);
            }
            AckKind::Compression { level } => {
                log::info!("{} coach: set compression level {}", self.config.team_name, level);
                self.transport.set_compression_level(level);
            }
            AckKind::TeamNames { left, right } => {
                self.world.set_team_name(Side::Left, &left);
                if let Some(right) = right {
                    self.world.set_team_name(Side::Right, &right);
                }
            }
            AckKind::Other => {
                log::info!("{} coach: recv {}", self.config.team_name, raw);
            }
        }
    }

    fn handle_init(&mut self, side: Option<Side>) {
        let Some(side) = side else {
            // The connection is unrecoverable if the server rejects init.
            self.fail(CoachError::Protocol("init rejected by server".to_string()));
            return;
        };

        self.world.init(side, self.config.version);

        if self.config.hear_say {
            let team_name = self.config.team_name.clone();
            self.audio.set_team_name(&team_name);
        }

        if self.config.use_eye {
            self.do_eye(true);
        }

        if (1..=9).contains(&self.config.compression) {
            let level = self.config.compression;
            self.send_command(&CoachCommand::Compression { level });
        }
    }

    // === Command gateway ===

    /// Render and transmit. Refuses empty renderings and dead peers.
    pub fn send_command(&mut self, command: &CoachCommand) -> bool {
        if !self.transport.is_server_alive() {
            return false;
        }
        let text = command.render();
        if text.is_empty() {
            return false;
        }
        self.transport.send(&text) > 0
    }

    pub fn do_check_ball(&mut self) -> bool {
        self.send_command(&CoachCommand::CheckBall)
    }

    pub fn do_look(&mut self) -> bool {
        self.send_command(&CoachCommand::Look)
    }

    pub fn do_team_names(&mut self) -> bool {
        self.send_command(&CoachCommand::TeamNames)
    }

    pub fn do_eye(&mut self, on: bool) -> bool {
        self.send_command(&CoachCommand::Eye { on })
    }

    pub fn do_change_player_type(&mut self, unum: i32, type_id: i32) -> bool {
        if !(1..=MAX_UNUM).contains(&unum) {
            log::warn!(
                "{} coach: illegal player number {} for change_player_type",
                self.config.team_name,
                unum
            );
            return false;
        }
        if type_id < 0 || type_id as i64 >= self.player_param.player_types {
            log::warn!(
                "{} coach: illegal player type {} for change_player_type",
                self.config.team_name,
                type_id
            );
            return false;
        }
        self.send_command(&CoachCommand::ChangePlayerType { unum, type_id })
    }

    pub fn do_change_player_types(&mut self, types: &[(i32, i32)]) -> bool {
        if types.is_empty() {
            return false;
        }
        let mut result = true;
        for &(unum, type_id) in types {
            result = self.do_change_player_type(unum, type_id);
        }
        result
    }

    /// Free-form broadcast with the version-dependent grammar and gating.
    pub fn do_say_freeform(&mut self, message: &str) -> bool {
        if message.is_empty() || message.len() as i64 > self.server_param.say_coach_msg_size {
            log::warn!(
                "{} coach: invalid freeform message length {}",
                self.config.team_name,
                message.len()
            );
            return false;
        }

        if self.config.version < 7.0 {
            if !self.game_mode.is_server_cycle_stopped_mode() {
                // old protocol: no broadcasting during open play
                log::warn!(
                    "{} coach: cannot send freeform while play_on",
                    self.config.team_name
                );
                return false;
            }
            self.world.inc_freeform_send_count();
            return self.send_command(&CoachCommand::Say { message: message.to_string() });
        }

        if !self.world.can_send_freeform(self.sync.time()) {
            log::warn!("{} coach: cannot send freeform now", self.config.team_name);
            return false;
        }
        self.world.inc_freeform_send_count();
        self.send_command(&CoachCommand::SayFreeform { message: message.to_string() })
    }

    /// Upload one team-graphic tile, bounded by the per-instant quota.
    /// The counter resets exactly when the synchronized time changes.
    pub fn do_team_graphic(&mut self, x: i32, y: i32) -> bool {
        if self.graphic_send_time != self.sync.time() {
            self.graphic_send_count = 0;
        }
        self.graphic_send_time = self.sync.time();
        self.graphic_send_count += 1;

        if self.graphic_send_count > self.config.max_team_graphic_per_cycle {
            return false;
        }

        let Some(tile) = self.team_graphic.tile(x, y).cloned() else {
            log::warn!(
                "{} coach: tile ({}, {}) not found in the team graphic",
                self.config.team_name,
                x,
                y
            );
            return false;
        };

        self.send_command(&CoachCommand::TeamGraphic { x, y, tile })
    }
}

fn strip_card_prefix<'a>(text: &'a str, kind: &str) -> Option<&'a str> {
    if !text.starts_with(kind) {
        return None;
    }
    Some(text[kind.len()..].trim_start_matches('_'))
}

/// Parse the `<side>_<unum>` tail of a card announcement.
fn parse_card_target(rest: &str) -> Option<(Side, i32)> {
    let (side, unum) = rest.split_once('_')?;
    let side = match side {
        "l" => Side::Left,
        "r" => Side::Right,
        _ => return None,
    };
    Some((side, unum.parse().ok()?))
}
