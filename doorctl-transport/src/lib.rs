//! Transport layer for the controller protocol
//!
//! Two deliberately separate primitives:
//! - [`UdpExchange`] resolves one request with exactly one correlated
//!   reply (retrying on timeout)
//! - [`Scanner`] broadcasts once and collects every reply arriving
//!   within a fixed window (fan-in)
//!
//! Conflating the two shapes invites treating "first reply" as
//! definitive during a multi-reply scan, so they share no abstraction.

pub mod error;
pub mod scanner;
pub mod udp;

pub use error::{Error, Result};
pub use scanner::{Reply, Scanner};
pub use udp::UdpExchange;

use std::net::SocketAddr;
use std::time::Duration;

use async_trait::async_trait;
use doorctl_core::Frame;

/// Default per-attempt reply timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Default total send attempts per request
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Default discovery listen window
pub const DEFAULT_WINDOW: Duration = Duration::from_secs(3);

/// One-shot request/reply seam
///
/// Implemented by [`UdpExchange`] for real devices and by scripted
/// doubles in tests; the facade holds a `Box<dyn Exchange>`.
#[async_trait]
pub trait Exchange: Send + Sync {
    /// Send one frame and resolve with exactly one correlated reply
    async fn request(&self, frame: &Frame, target: SocketAddr) -> Result<Frame>;

    /// Send one frame without waiting for any reply
    /// (the controller restarts after some commands and never answers)
    async fn send_only(&self, frame: &Frame, target: SocketAddr) -> Result<()>;
}
