//! Transport collaborator interface and offline logging.
//!
//! The byte-level client (socket setup, framing, compression) lives outside
//! this crate. The session only needs this narrow surface; `recv` must
//! return `None` as soon as no complete message is currently available so
//! the drain loop never blocks on I/O.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::{CoachError, Result};

pub trait Transport {
    /// Establish the connection. Returns false on failure.
    fn connect(&mut self, host: &str, port: u16) -> bool;

    /// Send one rendered command. Returns bytes written, 0 on failure.
    fn send(&mut self, text: &str) -> usize;

    /// Next complete inbound message, or `None` when nothing is buffered.
    fn recv(&mut self) -> Option<String>;

    fn is_server_alive(&self) -> bool;

    /// Marking the peer dead is terminal for the session.
    fn set_server_alive(&mut self, alive: bool);

    /// Negotiated inflation level for inbound messages, if supported.
    fn set_compression_level(&mut self, _level: i32) {}

    /// Adjust the receive poll interval, e.g. for slowed-down servers.
    fn set_interval_ms(&mut self, _interval_ms: u64) {}
}

/// Records the inbound message stream for offline replay.
///
/// Format: one line per message, `>` prefix for received text and a bare
/// `(think)` marker per decision point, matching the replay reader's
/// expectations.
#[derive(Debug)]
pub struct OfflineLogger {
    out: BufWriter<File>,
}

impl OfflineLogger {
    /// Opening failure is a startup failure; the session must not start.
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::create(path).map_err(|e| {
            CoachError::Resource(format!("offline log {}: {}", path.display(), e))
        })?;
        Ok(Self { out: BufWriter::new(file) })
    }

    pub fn log_received(&mut self, message: &str) {
        if let Err(e) = writeln!(self.out, "> {}", message) {
            log::warn!("offline log write failed: {}", e);
        }
    }

    pub fn log_think(&mut self) {
        if let Err(e) = writeln!(self.out, "(think)") {
            log::warn!("offline log write failed: {}", e);
        }
        let _ = self.out.flush();
    }
}
