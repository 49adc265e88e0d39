//! Coach client CLI.
//!
//! Loads the configuration, wires the UDP transport into the session core
//! and runs the poll loop: drain inbound messages, fall back to the timeout
//! callback when the server stays quiet.

mod udp;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use coach_core::{CoachAgent, CoachConfig, CoachWorldModel, SilentCoach, TeamGraphic};

use crate::udp::UdpTransport;

#[derive(Parser)]
#[command(name = "coach")]
#[command(about = "Coaching-side client for the soccer simulation server", long_about = None)]
struct Cli {
    /// Configuration file (JSON); defaults apply when omitted
    #[arg(long)]
    config: Option<PathBuf>,

    /// Server host name
    #[arg(long)]
    host: Option<String>,

    /// Offline coach port
    #[arg(long)]
    port: Option<u16>,

    /// Team name announced at init
    #[arg(long)]
    team: Option<String>,

    /// Protocol version to negotiate
    #[arg(long)]
    protocol_version: Option<f64>,

    /// Coach display name
    #[arg(long)]
    coach_name: Option<String>,

    /// Record received messages to the offline log
    #[arg(long, default_value = "false")]
    offline_log: bool,

    /// Directory for log files
    #[arg(long)]
    log_dir: Option<String>,

    /// Team graphic XPM file to upload after kickoff preparation
    #[arg(long)]
    team_graphic: Option<PathBuf>,
}

fn build_config(cli: &Cli) -> Result<CoachConfig> {
    let mut config = match &cli.config {
        Some(path) => CoachConfig::load(path)?,
        None => CoachConfig::default(),
    };

    if let Some(host) = &cli.host {
        config.host = host.clone();
    }
    if let Some(port) = cli.port {
        config.port = port;
    }
    if let Some(team) = &cli.team {
        config.team_name = team.clone();
    }
    if let Some(version) = cli.protocol_version {
        config.version = version;
    }
    if let Some(name) = &cli.coach_name {
        config.coach_name = Some(name.clone());
    }
    if cli.offline_log {
        config.offline_logging = true;
    }
    if let Some(dir) = &cli.log_dir {
        config.log_dir = dir.clone();
    }

    config.validate()?;
    Ok(config)
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    let config = build_config(&cli)?;

    let graphic = match &cli.team_graphic {
        Some(path) => {
            let source = std::fs::read_to_string(path)
                .with_context(|| format!("reading team graphic {}", path.display()))?;
            Some(TeamGraphic::from_xpm(&source)?)
        }
        None => None,
    };

    run(config, graphic)
}

fn run(config: CoachConfig, graphic: Option<TeamGraphic>) -> Result<()> {
    let interval_ms = config.interval_ms.max(1);
    let transport = UdpTransport::new(interval_ms);
    let mut agent = CoachAgent::new(config, CoachWorldModel::new(), Box::new(transport));
    if let Some(graphic) = graphic {
        agent.set_team_graphic(graphic);
    }

    agent.handle_start()?;

    let mut brain = SilentCoach;
    let mut waited_ms: u64 = 0;

    while agent.is_server_alive() {
        // recv blocks for at most one poll interval, so an empty burst
        // means the server stayed quiet for that long
        let received = agent.handle_message(&mut brain);
        if received == 0 {
            waited_ms += interval_ms;
            agent.handle_timeout(waited_ms, &mut brain);
        } else {
            waited_ms = 0;
        }
    }

    agent.finalize();
    Ok(())
}
