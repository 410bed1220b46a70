//! One-shot UDP request/reply
//!
//! Controllers listen on UDP port 60000 and answer each request with a
//! single 64-byte frame, sometimes from a port other than the one the
//! request was addressed to.

use std::net::SocketAddr;
use std::time::Duration;

use async_trait::async_trait;
use doorctl_core::Frame;
use tokio::net::UdpSocket;
use tokio::time::{timeout_at, Instant};
use tracing::{debug, trace, warn};

use crate::{error::*, Exchange, DEFAULT_MAX_ATTEMPTS, DEFAULT_TIMEOUT};

/// One-shot UDP exchange
///
/// Each call binds one ephemeral socket, sends the frame, and waits
/// for the first acceptable reply. A reply is accepted iff its source
/// IP equals the target IP; the source port is deliberately ignored.
/// On timeout the identical bytes are resent, up to the attempt
/// budget. The socket is dropped on every exit path.
pub struct UdpExchange {
    timeout: Duration,
    max_attempts: u32,
}

impl UdpExchange {
    /// Create an exchange with default timeout and attempt budget
    pub fn new() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }

    /// Set the per-attempt reply timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the total number of send attempts
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }
}

impl Default for UdpExchange {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Exchange for UdpExchange {
    async fn request(&self, frame: &Frame, target: SocketAddr) -> Result<Frame> {
        let socket = UdpSocket::bind("0.0.0.0:0").await?;

        // Encoded once; retries resend these exact bytes
        let request = frame.encode();
        let started = Instant::now();

        // Oversized datagrams must fail the length check, so read into
        // a buffer larger than one frame
        let mut buf = [0u8; 512];

        for attempt in 1..=self.max_attempts {
            trace!(
                %target,
                attempt,
                data = hex::encode(&request),
                "sending request"
            );
            socket.send_to(&request, target).await?;

            let deadline = Instant::now() + self.timeout;

            loop {
                let received = match timeout_at(deadline, socket.recv_from(&mut buf)).await {
                    Ok(received) => received,
                    Err(_) => {
                        debug!(%target, attempt, "attempt timed out");
                        break;
                    }
                };

                let (len, source) = received?;

                // Correlation is by source IP only: devices may reply
                // from an ephemeral port
                if source.ip() != target.ip() {
                    debug!(%source, %target, "dropping reply from unexpected address");
                    continue;
                }

                match Frame::decode(&buf[..len]) {
                    Ok(reply) => {
                        trace!(%source, reply = %reply, "accepted reply");
                        return Ok(reply);
                    }
                    Err(e) => {
                        // Not a valid frame; keep waiting out this
                        // attempt's deadline
                        debug!(%source, error = %e, "dropping malformed reply");
                    }
                }
            }
        }

        warn!(%target, attempts = self.max_attempts, "request exhausted retry budget");

        Err(Error::Timeout {
            target,
            attempts: self.max_attempts,
            elapsed: started.elapsed(),
        })
    }

    async fn send_only(&self, frame: &Frame, target: SocketAddr) -> Result<()> {
        let socket = UdpSocket::bind("0.0.0.0:0").await?;

        let request = frame.encode();
        trace!(%target, data = hex::encode(&request), "sending without reply");
        socket.send_to(&request, target).await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use doorctl_core::Function;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn test_exchange() -> UdpExchange {
        UdpExchange::new()
            .with_timeout(Duration::from_millis(100))
            .with_max_attempts(3)
    }

    /// Bind a fake device on loopback, returning its address
    async fn fake_device() -> (UdpSocket, SocketAddr) {
        let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let addr = socket.local_addr().unwrap();
        (socket, addr)
    }

    #[tokio::test]
    async fn test_reply_accepted_from_different_source_port() {
        let (device, device_addr) = fake_device().await;

        tokio::spawn(async move {
            let mut buf = [0u8; 512];
            let (len, requester) = device.recv_from(&mut buf).await.unwrap();
            let request = Frame::decode(&buf[..len]).unwrap();

            // Reply from a second socket: same IP, different port
            let other = UdpSocket::bind("127.0.0.1:0").await.unwrap();
            let reply = Frame::with_payload(request.function, request.device_serial, vec![1])
                .unwrap();
            other.send_to(&reply.encode(), requester).await.unwrap();
        });

        let frame = Frame::new(Function::OpenDoor, 42);
        let reply = test_exchange().request(&frame, device_addr).await.unwrap();

        assert_eq!(reply.function, Function::OpenDoor);
        assert!(reply.is_acked());
    }

    #[tokio::test]
    async fn test_reply_from_other_ip_is_ignored() {
        let (device, device_addr) = fake_device().await;

        tokio::spawn(async move {
            let mut buf = [0u8; 512];
            let (len, requester) = device.recv_from(&mut buf).await.unwrap();
            let request = Frame::decode(&buf[..len]).unwrap();

            // A rogue host (different loopback IP) answers first
            let rogue = UdpSocket::bind("127.0.0.2:0").await.unwrap();
            let forged = Frame::with_payload(request.function, 999, vec![0]).unwrap();
            rogue.send_to(&forged.encode(), requester).await.unwrap();

            tokio::time::sleep(Duration::from_millis(20)).await;

            let reply = Frame::with_payload(request.function, request.device_serial, vec![1])
                .unwrap();
            device.send_to(&reply.encode(), requester).await.unwrap();
        });

        let frame = Frame::new(Function::OpenDoor, 42);
        let reply = test_exchange().request(&frame, device_addr).await.unwrap();

        // The rogue frame was dropped; the device's own reply won
        assert_eq!(reply.device_serial, 42);
        assert!(reply.is_acked());
    }

    #[tokio::test]
    async fn test_malformed_reply_is_dropped_not_fatal() {
        let (device, device_addr) = fake_device().await;

        tokio::spawn(async move {
            let mut buf = [0u8; 512];
            let (len, requester) = device.recv_from(&mut buf).await.unwrap();
            let request = Frame::decode(&buf[..len]).unwrap();

            // Garbage first, then the real reply within the same attempt
            device.send_to(&[0xFF; 10], requester).await.unwrap();
            let reply = Frame::with_payload(request.function, request.device_serial, vec![1])
                .unwrap();
            device.send_to(&reply.encode(), requester).await.unwrap();
        });

        let frame = Frame::new(Function::SetTime, 7);
        let reply = test_exchange().request(&frame, device_addr).await.unwrap();

        assert_eq!(reply.device_serial, 7);
    }

    #[tokio::test]
    async fn test_timeout_after_full_attempt_budget() {
        let (device, device_addr) = fake_device().await;
        let received = Arc::new(AtomicU32::new(0));

        let counter = Arc::clone(&received);
        tokio::spawn(async move {
            let mut buf = [0u8; 512];
            loop {
                // Count requests; never reply
                device.recv_from(&mut buf).await.unwrap();
                counter.fetch_add(1, Ordering::SeqCst);
            }
        });

        let frame = Frame::new(Function::ReadTime, 42);
        let result = test_exchange().request(&frame, device_addr).await;

        match result {
            Err(Error::Timeout {
                target, attempts, ..
            }) => {
                assert_eq!(target, device_addr);
                assert_eq!(attempts, 3);
            }
            other => panic!("expected timeout, got {:?}", other.map(|f| f.to_string())),
        }

        // Every attempt actually hit the wire
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(received.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_send_only_completes_without_listener() {
        let (device, device_addr) = fake_device().await;
        drop(device);

        let frame = Frame::new(Function::SetAddress, 42);
        test_exchange().send_only(&frame, device_addr).await.unwrap();
    }
}
