//! UDP transport for the coach client.
//!
//! The server listens on the offline-coach port and replies from an
//! ephemeral port; every datagram carries one NUL-terminated message. `recv`
//! blocks for at most the poll interval, so the session's drain loop doubles
//! as the receive poll.

use std::io::ErrorKind;
use std::net::{SocketAddr, ToSocketAddrs, UdpSocket};
use std::time::Duration;

use coach_core::Transport;

const RECV_BUFFER_SIZE: usize = 8192;

pub struct UdpTransport {
    socket: Option<UdpSocket>,
    peer: Option<SocketAddr>,
    alive: bool,
    interval: Duration,
}

impl UdpTransport {
    pub fn new(interval_ms: u64) -> Self {
        Self {
            socket: None,
            peer: None,
            alive: false,
            interval: Duration::from_millis(interval_ms.max(1)),
        }
    }

    fn try_connect(&mut self, host: &str, port: u16) -> std::io::Result<()> {
        let addr = (host, port)
            .to_socket_addrs()?
            .next()
            .ok_or_else(|| std::io::Error::new(ErrorKind::NotFound, "host not resolved"))?;
        let socket = UdpSocket::bind(("0.0.0.0", 0))?;
        socket.set_read_timeout(Some(self.interval))?;
        self.peer = Some(addr);
        self.socket = Some(socket);
        Ok(())
    }
}

impl Transport for UdpTransport {
    fn connect(&mut self, host: &str, port: u16) -> bool {
        match self.try_connect(host, port) {
            Ok(()) => {
                self.alive = true;
                true
            }
            Err(e) => {
                log::error!("failed to connect to {}:{}: {}", host, port, e);
                false
            }
        }
    }

    fn send(&mut self, text: &str) -> usize {
        let (Some(socket), Some(peer)) = (self.socket.as_ref(), self.peer) else {
            return 0;
        };
        // one NUL-terminated message per datagram
        let mut buf = Vec::with_capacity(text.len() + 1);
        buf.extend_from_slice(text.as_bytes());
        buf.push(0);
        match socket.send_to(&buf, peer) {
            Ok(n) => n,
            Err(e) => {
                log::warn!("send failed: {}", e);
                0
            }
        }
    }

    fn recv(&mut self) -> Option<String> {
        let socket = self.socket.as_ref()?;
        let mut buf = [0u8; RECV_BUFFER_SIZE];
        match socket.recv_from(&mut buf) {
            Ok((n, from)) => {
                // the server answers from an ephemeral port; follow it
                self.peer = Some(from);
                let end = buf[..n].iter().position(|&b| b == 0).unwrap_or(n);
                Some(String::from_utf8_lossy(&buf[..end]).into_owned())
            }
            Err(e) if e.kind() == ErrorKind::WouldBlock || e.kind() == ErrorKind::TimedOut => None,
            Err(e) => {
                log::warn!("recv failed: {}", e);
                None
            }
        }
    }

    fn is_server_alive(&self) -> bool {
        self.alive
    }

    fn set_server_alive(&mut self, alive: bool) {
        self.alive = alive;
    }

    fn set_compression_level(&mut self, level: i32) {
        if level > 0 {
            log::warn!("compression level {} acknowledged but inflation is not supported", level);
        }
    }

    fn set_interval_ms(&mut self, interval_ms: u64) {
        self.interval = Duration::from_millis(interval_ms.max(1));
        if let Some(socket) = self.socket.as_ref() {
            if let Err(e) = socket.set_read_timeout(Some(self.interval)) {
                log::warn!("failed to adjust receive interval: {}", e);
            }
        }
    }
}
