//! Session-level scenario tests.
//!
//! These drive a `CoachAgent` with a scripted transport and check the
//! end-to-end contracts: time synchronization across clock stops, referee
//! side channels, decision idempotency and command gating.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use crate::agent::{CoachAgent, CoachBrain};
use crate::config::CoachConfig;
use crate::error::CoachError;
use crate::graphic::TeamGraphic;
use crate::mode::PlayMode;
use crate::time::GameTime;
use crate::transport::Transport;
use crate::types::{Card, Side};
use crate::world::{CoachWorldModel, WorldModel};

#[derive(Debug, Default)]
struct ScriptInner {
    inbound: VecDeque<String>,
    sent: Vec<String>,
    alive: bool,
    compression: Option<i32>,
    interval_ms: Option<u64>,
}

/// Transport fed from a script; keeps everything the agent sent.
#[derive(Clone, Default)]
struct ScriptTransport {
    inner: Rc<RefCell<ScriptInner>>,
}

impl ScriptTransport {
    fn push(&self, line: &str) {
        self.inner.borrow_mut().inbound.push_back(line.to_string());
    }

    fn sent(&self) -> Vec<String> {
        self.inner.borrow().sent.clone()
    }

    fn sent_count(&self) -> usize {
        self.inner.borrow().sent.len()
    }

    fn alive(&self) -> bool {
        self.inner.borrow().alive
    }
}

impl Transport for ScriptTransport {
    fn connect(&mut self, _host: &str, _port: u16) -> bool {
        self.inner.borrow_mut().alive = true;
        true
    }

    fn send(&mut self, text: &str) -> usize {
        self.inner.borrow_mut().sent.push(text.to_string());
        text.len()
    }

    fn recv(&mut self) -> Option<String> {
        self.inner.borrow_mut().inbound.pop_front()
    }

    fn is_server_alive(&self) -> bool {
        self.inner.borrow().alive
    }

    fn set_server_alive(&mut self, alive: bool) {
        self.inner.borrow_mut().alive = alive;
    }

    fn set_compression_level(&mut self, level: i32) {
        self.inner.borrow_mut().compression = Some(level);
    }

    fn set_interval_ms(&mut self, interval_ms: u64) {
        self.inner.borrow_mut().interval_ms = Some(interval_ms);
    }
}

#[derive(Default)]
struct CountingBrain {
    decisions: Vec<GameTime>,
}

impl CoachBrain<CoachWorldModel> for CountingBrain {
    fn decide(&mut self, agent: &mut CoachAgent<CoachWorldModel>) {
        self.decisions.push(agent.time());
    }
}

fn test_config() -> CoachConfig {
    let mut config = CoachConfig::default();
    config.team_name = "Testers".to_string();
    config.host = "localhost".to_string();
    config
}

fn started_agent(config: CoachConfig) -> (CoachAgent<CoachWorldModel>, ScriptTransport) {
    let transport = ScriptTransport::default();
    let handle = transport.clone();
    let mut agent = CoachAgent::new(config, CoachWorldModel::new(), Box::new(transport));
    agent.handle_start().unwrap();
    (agent, handle)
}

#[test]
fn test_start_sends_init() {
    let (_agent, transport) = started_agent(test_config());
    assert_eq!(transport.sent(), vec!["(init Testers (version 18))".to_string()]);
    assert!(transport.alive());
}

#[test]
fn test_init_reply_records_side_and_requests_eye() {
    let (mut agent, transport) = started_agent(test_config());
    let mut brain = CountingBrain::default();

    transport.push("(init l ok)");
    agent.handle_message(&mut brain);

    assert_eq!(agent.world().our_side(), Side::Left);
    assert!(transport.sent().contains(&"(eye on)".to_string()));
    assert!(brain.decisions.is_empty());
}

#[test]
fn test_init_rejection_marks_peer_dead() {
    let (mut agent, transport) = started_agent(test_config());
    let mut brain = CountingBrain::default();

    transport.push("(init err)");
    transport.push("(see_global 10 ((b) 0 0))");
    agent.handle_message(&mut brain);

    assert!(!transport.alive());
    assert!(matches!(agent.last_error(), Some(CoachError::Protocol(_))));
    // messages after the terminal state are ignored
    assert_eq!(agent.time(), GameTime::new(0, 0));
    // and commands are refused
    assert!(!agent.do_check_ball());
}

#[test]
fn test_stopped_clock_scenario() {
    let (mut agent, transport) = started_agent(test_config());
    let mut brain = CountingBrain::default();

    transport.push("(init l ok)");
    transport.push("(server_param (say_coach_msg_size 128)(say_coach_cnt_max 128))");
    transport.push("(see_global 100 ((b) 0 0))");
    agent.handle_message(&mut brain);
    assert_eq!(agent.time(), GameTime::new(100, 0));

    // still a stoppage: a second frame at the same cycle is a new instant
    transport.push("(see_global 100 ((b) 1 0))");
    agent.handle_message(&mut brain);
    assert_eq!(agent.time(), GameTime::new(100, 1));

    // play_on releases the clock; the next frame resets the sub-step
    transport.push("(hear 100 referee play_on)");
    transport.push("(see_global 101 ((b) 2 0))");
    agent.handle_message(&mut brain);
    assert_eq!(agent.time(), GameTime::new(101, 0));
    assert_eq!(agent.world().play_mode(), PlayMode::PlayOn);
}

#[test]
fn test_fresh_vision_reaches_world_model() {
    let (mut agent, transport) = started_agent(test_config());
    let mut brain = CountingBrain::default();

    transport.push("(init l ok)");
    transport.push("(see_global 50 ((b) 0 0))");
    agent.handle_message(&mut brain);

    assert_eq!(agent.world().last_see_time(), GameTime::new(50, 0));
}

#[test]
fn test_bodyless_vision_never_reaches_world_model() {
    let (mut agent, transport) = started_agent(test_config());
    let mut brain = CountingBrain::default();

    transport.push("(init l ok)");
    transport.push("(see_global 50 ((b) 0 0))");
    agent.handle_message(&mut brain);
    assert_eq!(agent.world().last_see_time(), GameTime::new(50, 0));

    // time advances, but the frame has no object body to apply
    transport.push("(see_global 50)");
    agent.handle_message(&mut brain);
    assert_eq!(agent.time(), GameTime::new(50, 1));
    assert_eq!(agent.world().last_see_time(), GameTime::new(50, 0));
    assert_eq!(agent.visual().time(), GameTime::new(50, 0));
}

#[test]
fn test_yellow_card_side_channel() {
    let (mut agent, transport) = started_agent(test_config());
    let mut brain = CountingBrain::default();

    transport.push("(init l ok)");
    transport.push("(hear 12 referee yellow_card_l_5)");
    agent.handle_message(&mut brain);

    assert_eq!(agent.world().card(Side::Left, 5), Some(Card::Yellow));
    // the play-mode tag is untouched
    assert_eq!(agent.game_mode().play_mode(), PlayMode::BeforeKickOff);
}

#[test]
fn test_red_card_side_channel() {
    let (mut agent, transport) = started_agent(test_config());
    let mut brain = CountingBrain::default();

    transport.push("(hear 40 referee red_card_r_3)");
    agent.handle_message(&mut brain);

    assert_eq!(agent.world().card(Side::Right, 3), Some(Card::Red));
}

#[test]
fn test_training_marker_side_channel() {
    let (mut agent, transport) = started_agent(test_config());
    let mut brain = CountingBrain::default();

    transport.push("(hear 77 referee training episode end)");
    agent.handle_message(&mut brain);

    assert_eq!(agent.world().training_time(), Some(GameTime::new(77, 0)));
    assert_eq!(agent.game_mode().play_mode(), PlayMode::BeforeKickOff);
}

#[test]
fn test_unsupported_message_leaves_state_unchanged() {
    let (mut agent, transport) = started_agent(test_config());
    let mut brain = CountingBrain::default();
    let sent_before = transport.sent_count();

    transport.push("(foobar 1 2 3)");
    agent.handle_message(&mut brain);

    assert_eq!(agent.time(), GameTime::new(0, 0));
    assert_eq!(agent.game_mode().play_mode(), PlayMode::BeforeKickOff);
    assert_eq!(transport.sent_count(), sent_before);
    assert!(brain.decisions.is_empty());
}

#[test]
fn test_think_fires_decision_once_and_acks() {
    let (mut agent, transport) = started_agent(test_config());
    let mut brain = CountingBrain::default();

    transport.push("(see_global 10 ((b) 0 0))");
    transport.push("(think)");
    agent.handle_message(&mut brain);

    assert_eq!(brain.decisions, vec![GameTime::new(10, 0)]);
    assert!(transport.sent().contains(&"(done)".to_string()));

    // a second think at the same instant acks again but never re-decides
    transport.push("(think)");
    agent.handle_message(&mut brain);
    assert_eq!(brain.decisions.len(), 1);
    assert_eq!(transport.sent().iter().filter(|s| *s == "(done)").count(), 2);
}

#[test]
fn test_timeout_decision_is_idempotent_per_time() {
    let (mut agent, transport) = started_agent(test_config());
    let mut brain = CountingBrain::default();

    transport.push("(see_global 10 ((b) 0 0))");
    agent.handle_message(&mut brain);
    assert!(brain.decisions.is_empty());

    // fresh vision at the current time lets the timeout path fire
    agent.handle_timeout(25, &mut brain);
    assert_eq!(brain.decisions, vec![GameTime::new(10, 0)]);

    // same time again: suppressed no matter how many conditions hold
    agent.handle_timeout(25, &mut brain);
    agent.handle_timeout(5000, &mut brain);
    assert_eq!(brain.decisions.len(), 1);

    // a new instant re-arms the trigger
    transport.push("(see_global 10 ((b) 1 0))");
    agent.handle_message(&mut brain);
    agent.handle_timeout(25, &mut brain);
    assert_eq!(brain.decisions, vec![GameTime::new(10, 0), GameTime::new(10, 1)]);
}

#[test]
fn test_liveness_escalation_with_eye() {
    let (mut agent, transport) = started_agent(test_config());
    let mut brain = CountingBrain::default();

    // with vision on, silence past the limit is fatal immediately
    agent.handle_timeout(7_000, &mut brain);
    assert!(!transport.alive());
    assert!(matches!(agent.last_error(), Some(CoachError::Liveness(_))));
}

#[test]
fn test_liveness_escalation_without_eye() {
    let mut config = test_config();
    config.use_eye = false;
    let (mut agent, transport) = started_agent(config);
    let mut brain = CountingBrain::default();

    // first escalation: probe the server
    agent.handle_timeout(7_000, &mut brain);
    assert!(transport.alive());
    assert!(transport.sent().contains(&"(check_ball)".to_string()));

    // probing also timed out: give up
    agent.handle_timeout(13_000, &mut brain);
    assert!(!transport.alive());
    assert!(matches!(agent.last_error(), Some(CoachError::Liveness(_))));
}

#[test]
fn test_game_over_sends_bye() {
    let (mut agent, transport) = started_agent(test_config());
    let mut brain = CountingBrain::default();

    transport.push("(hear 6000 referee time_over)");
    agent.handle_message(&mut brain);

    assert!(transport.sent().contains(&"(bye)".to_string()));
    assert!(!transport.alive());
}

#[test]
fn test_change_player_type_messages() {
    let (mut agent, transport) = started_agent(test_config());
    let mut brain = CountingBrain::default();

    transport.push("(init l ok)");
    transport.push("(change_player_type 7 3)");
    transport.push("(change_player_type 9)");
    agent.handle_message(&mut brain);

    assert_eq!(agent.world().player_type(Side::Left, 7), Some(Some(3)));
    assert_eq!(agent.world().player_type(Side::Right, 9), Some(None));
}

#[test]
fn test_change_player_type_request_validation() {
    let (mut agent, transport) = started_agent(test_config());

    assert!(!agent.do_change_player_type(0, 3));
    assert!(!agent.do_change_player_type(12, 3));
    assert!(!agent.do_change_player_type(5, 99));
    assert!(agent.do_change_player_type(5, 3));
    assert!(transport.sent().contains(&"(change_player_type 5 3)".to_string()));
}

#[test]
fn test_freeform_rejections_never_send() {
    let (mut agent, transport) = started_agent(test_config());
    let sent_before = transport.sent_count();

    assert!(!agent.do_say_freeform(""));
    let too_long = "x".repeat(200);
    assert!(!agent.do_say_freeform(&too_long));
    assert_eq!(transport.sent_count(), sent_before);
}

#[test]
fn test_freeform_structured_envelope() {
    let (mut agent, transport) = started_agent(test_config());
    let mut brain = CountingBrain::default();

    transport.push("(init l ok)");
    agent.handle_message(&mut brain);

    assert!(agent.do_say_freeform("mark their 9"));
    assert!(transport.sent().contains(&"(say (freeform \"mark their 9\"))".to_string()));
    assert_eq!(agent.world().freeform_sent(), 1);
}

#[test]
fn test_freeform_waits_after_kickoff() {
    let (mut agent, transport) = started_agent(test_config());
    let mut brain = CountingBrain::default();

    transport.push("(init l ok)");
    transport.push("(server_param (freeform_wait_period 600))");
    transport.push("(hear 1 referee play_on)");
    agent.handle_message(&mut brain);

    // open play began at cycle 1; the wait period has not elapsed
    assert!(!agent.do_say_freeform("too early"));
    let sent_before = transport.sent_count();

    transport.push("(see_global 700 ((b) 0 0))");
    agent.handle_message(&mut brain);
    assert!(agent.do_say_freeform("patience"));
    assert_eq!(transport.sent_count(), sent_before + 1);
}

#[test]
fn test_freeform_old_protocol_blocked_during_play_on() {
    let mut config = test_config();
    config.version = 6.0;
    let (mut agent, transport) = started_agent(config);
    let mut brain = CountingBrain::default();

    transport.push("(hear 10 referee play_on)");
    agent.handle_message(&mut brain);
    assert!(!agent.do_say_freeform("advice"));

    transport.push("(hear 11 referee free_kick_l)");
    agent.handle_message(&mut brain);
    assert!(agent.do_say_freeform("advice"));
    assert!(transport.sent().contains(&"(say advice)".to_string()));
}

fn two_tile_graphic() -> TeamGraphic {
    let mut src = String::from("\"16 8 2 1\",\n\". c #000000\",\n\"# c #ffffff\",\n");
    for _ in 0..8 {
        src.push_str("\"................\",\n");
    }
    TeamGraphic::from_xpm(&src).unwrap()
}

#[test]
fn test_team_graphic_quota_resets_on_time_change() {
    let mut config = test_config();
    config.max_team_graphic_per_cycle = 2;
    let (mut agent, transport) = started_agent(config);
    let mut brain = CountingBrain::default();
    agent.set_team_graphic(two_tile_graphic());

    transport.push("(see_global 5 ((b) 0 0))");
    agent.handle_message(&mut brain);

    assert!(agent.do_team_graphic(0, 0));
    assert!(agent.do_team_graphic(1, 0));
    // third attempt within one instant exceeds the quota
    assert!(!agent.do_team_graphic(0, 0));

    // time change resets the counter
    transport.push("(see_global 5 ((b) 1 0))");
    agent.handle_message(&mut brain);
    assert!(agent.do_team_graphic(0, 0));
}

#[test]
fn test_team_graphic_ack_bookkeeping() {
    let (mut agent, transport) = started_agent(test_config());
    let mut brain = CountingBrain::default();
    agent.set_team_graphic(two_tile_graphic());

    transport.push("(ok team_graphic 0 0)");
    transport.push("(ok team_graphic 1 0)");
    agent.handle_message(&mut brain);

    assert!(agent.team_graphic().is_complete());
}

#[test]
fn test_compression_ack_reaches_transport() {
    let (mut agent, transport) = started_agent(test_config());
    let mut brain = CountingBrain::default();

    transport.push("(ok compression 4)");
    agent.handle_message(&mut brain);

    assert_eq!(transport.inner.borrow().compression, Some(4));
}

#[test]
fn test_slow_down_factor_adjusts_interval() {
    let (mut agent, transport) = started_agent(test_config());
    let mut brain = CountingBrain::default();

    transport.push("(server_param (slow_down_factor 4))");
    agent.handle_message(&mut brain);

    assert_eq!(transport.inner.borrow().interval_ms, Some(40));
    assert_eq!(agent.server_param().slow_down_factor, 4);
}

#[test]
fn test_team_names_ack_updates_world() {
    let (mut agent, transport) = started_agent(test_config());
    let mut brain = CountingBrain::default();

    transport.push("(ok team_names (team l Testers) (team r Others))");
    agent.handle_message(&mut brain);

    assert_eq!(agent.world().team_name(Side::Left), Some("Testers"));
    assert_eq!(agent.world().team_name(Side::Right), Some("Others"));
}

#[test]
fn test_player_audio_routed_when_enabled() {
    let (mut agent, transport) = started_agent(test_config());
    let mut brain = CountingBrain::default();

    transport.push("(init l ok)");
    transport.push(r#"(hear 30 (player "Testers" 7) "go left")"#);
    agent.handle_message(&mut brain);

    let msg = agent.audio().last_player_message().unwrap();
    assert_eq!(msg.unum, 7);
    assert!(msg.our_side);
}

#[test]
fn test_player_audio_ignored_when_disabled() {
    let mut config = test_config();
    config.hear_say = false;
    let (mut agent, transport) = started_agent(config);
    let mut brain = CountingBrain::default();

    transport.push(r#"(hear 30 (player "Testers" 7) "go left")"#);
    agent.handle_message(&mut brain);

    assert!(agent.audio().last_player_message().is_none());
    // the message still bears time
    assert_eq!(agent.time(), GameTime::new(30, 0));
}

#[test]
fn test_compression_requested_after_init_when_configured() {
    let mut config = test_config();
    config.compression = 6;
    let (mut agent, transport) = started_agent(config);
    let mut brain = CountingBrain::default();

    transport.push("(init l ok)");
    agent.handle_message(&mut brain);

    assert!(transport.sent().contains(&"(compression 6)".to_string()));
}
