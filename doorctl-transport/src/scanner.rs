//! Broadcast discovery scanner (fan-in)
//!
//! The number of controllers on a network segment is unknown in
//! advance and zero is a valid outcome, so discovery cannot use the
//! request/reply primitive: the scanner sends one broadcast frame and
//! then listens for the entire window, however many replies arrive.

use std::collections::HashSet;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use doorctl_core::Frame;
use tokio::net::UdpSocket;
use tokio::sync::mpsc;
use tokio::time::{timeout_at, Instant};
use tracing::{debug, trace};

use crate::{error::*, DEFAULT_WINDOW};

/// One accepted discovery reply
#[derive(Debug, Clone)]
pub struct Reply {
    pub frame: Frame,
    pub source: SocketAddr,
}

/// Timed broadcast collector
///
/// Each scan owns one socket in broadcast mode for its lifetime.
/// Replies are deduplicated by device serial (first seen wins) and
/// processed strictly in arrival order; the dedupe set is the only
/// state shared across replies and lives inside the call.
pub struct Scanner {
    port: u16,
    window: Duration,
}

impl Scanner {
    /// Create a scanner targeting the default controller port
    pub fn new() -> Self {
        Self {
            port: doorctl_core::DEFAULT_PORT,
            window: DEFAULT_WINDOW,
        }
    }

    /// Set the destination port of the broadcast
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set the listen window
    pub fn with_window(mut self, window: Duration) -> Self {
        self.window = window;
        self
    }

    /// Broadcast `frame` and collect replies for the whole window
    ///
    /// Zero replies resolves with an empty list, not an error.
    pub async fn scan(&self, broadcast: IpAddr, frame: &Frame) -> Result<Vec<Reply>> {
        self.scan_with(broadcast, frame, None).await
    }

    /// Like [`scan`](Self::scan), additionally pushing each newly seen
    /// reply into `live` the moment it arrives (live progress
    /// reporting); the returned list is the same set in arrival order
    pub async fn scan_with(
        &self,
        broadcast: IpAddr,
        frame: &Frame,
        live: Option<mpsc::Sender<Reply>>,
    ) -> Result<Vec<Reply>> {
        let socket = UdpSocket::bind("0.0.0.0:0").await?;
        socket.set_broadcast(true)?;

        let request = frame.encode();
        trace!(%broadcast, port = self.port, data = hex::encode(&request), "broadcasting");
        socket.send_to(&request, (broadcast, self.port)).await?;

        let deadline = Instant::now() + self.window;
        let mut seen: HashSet<u32> = HashSet::new();
        let mut found = Vec::new();
        let mut buf = [0u8; 512];

        // Listen out the entire window regardless of traffic
        loop {
            let received = match timeout_at(deadline, socket.recv_from(&mut buf)).await {
                Ok(received) => received,
                Err(_) => break,
            };

            let (len, source) = received?;

            // Malformed datagrams never abort a scan
            let reply = match Frame::decode(&buf[..len]) {
                Ok(reply) => reply,
                Err(e) => {
                    debug!(%source, error = %e, "dropping malformed reply");
                    continue;
                }
            };

            if reply.function != frame.function {
                debug!(%source, function = %reply.function, "dropping unrelated reply");
                continue;
            }

            // First reply per device wins
            if !seen.insert(reply.device_serial) {
                debug!(serial = reply.device_serial, %source, "dropping duplicate reply");
                continue;
            }

            debug!(serial = reply.device_serial, %source, "controller replied");
            let reply = Reply {
                frame: reply,
                source,
            };

            if let Some(tx) = &live {
                // A dropped receiver only disables live reporting
                let _ = tx.send(reply.clone()).await;
            }

            found.push(reply);
        }

        debug!(count = found.len(), "scan window elapsed");
        Ok(found)
    }
}

impl Default for Scanner {
    fn default() -> Self {
        Self::new()
    }
}
