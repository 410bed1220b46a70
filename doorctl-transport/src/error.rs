//! Transport errors

use std::io;
use std::net::SocketAddr;
use std::time::Duration;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// No accepted reply within the full retry budget
    #[error("No reply from {target} after {attempts} attempts ({elapsed:?})")]
    Timeout {
        target: SocketAddr,
        attempts: u32,
        elapsed: Duration,
    },

    /// Socket-level bind/send/receive failure; delivery status unknown,
    /// so never retried
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}
