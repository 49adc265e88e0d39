//! Coach client configuration.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{CoachError, Result};

/// Protocol versions outside `[1.0, 19.0)` are not supported by this client.
pub const MIN_PROTOCOL_VERSION: f64 = 1.0;
pub const MAX_PROTOCOL_VERSION: f64 = 19.0;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CoachConfig {
    // === Identity ===
    /// Team name announced in the init command
    pub team_name: String,
    /// Optional coach display name appended to the init command
    pub coach_name: Option<String>,
    /// Negotiated protocol version (default: 18.0)
    pub version: f64,

    // === Connection ===
    /// Server host name (empty host is a startup failure)
    pub host: String,
    /// Offline coach port (default: 6002)
    pub port: u16,
    /// Receive poll interval in milliseconds (default: 10)
    pub interval_ms: u64,
    /// Seconds of silence before the liveness probe escalation (default: 6)
    pub server_wait_seconds: u64,

    // === Behaviour ===
    /// Request global vision after init (default: true)
    pub use_eye: bool,
    /// Listen to player audio messages (default: true)
    pub hear_say: bool,
    /// Compression level requested after init; 0 disables (legal: 1..=9)
    pub compression: i32,
    /// Team graphic tiles allowed per distinct game time (default: 32)
    pub max_team_graphic_per_cycle: u32,

    // === Logging ===
    /// Record every received message to an offline log (default: false)
    pub offline_logging: bool,
    /// Offline log file extension (default: ".ocl")
    pub offline_log_ext: String,
    /// Directory for the offline log (default: ".")
    pub log_dir: String,
}

impl Default for CoachConfig {
    fn default() -> Self {
        Self {
            team_name: "CoachTeam".to_string(),
            coach_name: None,
            version: 18.0,

            host: "localhost".to_string(),
            port: 6002,
            interval_ms: 10,
            server_wait_seconds: 6,

            use_eye: true,
            hear_say: true,
            compression: 0,
            max_team_graphic_per_cycle: 32,

            offline_logging: false,
            offline_log_ext: ".ocl".to_string(),
            log_dir: ".".to_string(),
        }
    }
}

impl CoachConfig {
    /// Load a configuration from a JSON file.
    ///
    /// A missing or unreadable file is a startup failure, not something the
    /// session can recover from later.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| CoachError::Resource(format!("config file {}: {}", path.display(), e)))?;
        let config: CoachConfig = serde_json::from_str(&text)
            .map_err(|e| CoachError::Config(format!("config file {}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.version < MIN_PROTOCOL_VERSION || self.version >= MAX_PROTOCOL_VERSION {
            return Err(CoachError::Config(format!(
                "unsupported client version: {}",
                self.version
            )));
        }
        if self.team_name.is_empty() {
            return Err(CoachError::Config("team name is empty".to_string()));
        }
        Ok(())
    }

    /// Path of the offline log file: `<log_dir>/<team_name>-coach<ext>`.
    pub fn offline_log_path(&self) -> String {
        let mut path = self.log_dir.clone();
        if !path.is_empty() && !path.ends_with('/') {
            path.push('/');
        }
        path.push_str(&self.team_name);
        path.push_str("-coach");
        path.push_str(&self.offline_log_ext);
        path
    }
}
