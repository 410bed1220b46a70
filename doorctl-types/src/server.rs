//! Event receiving-server configuration

use std::fmt;
use std::net::Ipv4Addr;

use byteorder::{ByteOrder, LittleEndian};

use crate::error::Result;

/// Where the controller pushes access events
///
/// # Payload Layout (request and reply)
///
/// ```text
/// offset 0   4 bytes  server IP
/// offset 4   u16 LE   server port
/// offset 6   u8       timed upload interval, seconds (0 = disabled)
/// ```
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct EventServer {
    /// Destination IP of the receiving server
    pub ip: Ipv4Addr,

    /// Destination UDP port
    pub port: u16,

    /// Interval of timed status uploads, seconds; 0 disables them
    pub upload_interval: u8,
}

impl EventServer {
    pub fn new(ip: Ipv4Addr, port: u16, upload_interval: u8) -> Self {
        Self {
            ip,
            port,
            upload_interval,
        }
    }

    /// Encode into a request payload
    pub fn encode(&self) -> [u8; 32] {
        let mut payload = [0u8; 32];
        payload[0..4].copy_from_slice(&self.ip.octets());
        LittleEndian::write_u16(&mut payload[4..6], self.port);
        payload[6] = self.upload_interval;
        payload
    }

    /// Decode a reply payload
    pub fn decode(payload: &[u8]) -> Result<Self> {
        if payload.len() < 7 {
            return Err(doorctl_core::Error::PayloadTooShort {
                expected: 7,
                actual: payload.len(),
            }
            .into());
        }

        Ok(Self {
            ip: Ipv4Addr::new(payload[0], payload[1], payload[2], payload[3]),
            port: LittleEndian::read_u16(&payload[4..6]),
            upload_interval: payload[6],
        })
    }
}

impl fmt::Display for EventServer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "EventServer[{}:{}, upload every {}s]",
            self.ip, self.port, self.upload_interval
        )
    }
}
