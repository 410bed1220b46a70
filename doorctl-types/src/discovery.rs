//! Discovery reply payload

use std::fmt;
use std::net::{IpAddr, Ipv4Addr};

use chrono::{DateTime, NaiveDate, Utc};
use doorctl_core::bcd;

use crate::error::Result;

/// One controller found by a broadcast scan
///
/// # Payload Layout
///
/// ```text
/// ┌─────────┬─────────┬─────────┬─────────┬─────────┬──────────────┐
/// │   IP    │  Mask   │ Gateway │   MAC   │ Version │ Release date │
/// │ 4 bytes │ 4 bytes │ 4 bytes │ 6 bytes │ 2 BCD   │    4 BCD     │
/// └─────────┴─────────┴─────────┴─────────┴─────────┴──────────────┘
/// ```
///
/// The serial number comes from the frame header, the source IP from
/// the datagram itself. Immutable once created within a scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredController {
    /// Device serial number (the dedupe key within a scan)
    pub device_serial: u32,

    /// Configured IP address
    pub ip_address: Ipv4Addr,

    /// Subnet mask
    pub subnet_mask: Ipv4Addr,

    /// Gateway address
    pub gateway: Ipv4Addr,

    /// Hardware MAC address
    pub mac: [u8; 6],

    /// Firmware version, e.g. "6.2"
    pub firmware_version: String,

    /// Firmware release date
    pub firmware_release: NaiveDate,

    /// When this reply was received
    pub discovered_at: DateTime<Utc>,

    /// Address the reply actually came from
    pub source_ip: IpAddr,
}

impl DiscoveredController {
    /// Parse a discovery reply payload
    ///
    /// `device_serial` comes from the frame header and `source_ip`
    /// from the receiving socket.
    pub fn from_payload(device_serial: u32, payload: &[u8], source_ip: IpAddr) -> Result<Self> {
        if payload.len() < doorctl_core::PAYLOAD_SIZE {
            return Err(doorctl_core::Error::PayloadTooShort {
                expected: doorctl_core::PAYLOAD_SIZE,
                actual: payload.len(),
            }
            .into());
        }

        let version_major = bcd::to_decimal(payload[18])?;
        let version_minor = bcd::to_decimal(payload[19])?;

        Ok(Self {
            device_serial,
            ip_address: Ipv4Addr::new(payload[0], payload[1], payload[2], payload[3]),
            subnet_mask: Ipv4Addr::new(payload[4], payload[5], payload[6], payload[7]),
            gateway: Ipv4Addr::new(payload[8], payload[9], payload[10], payload[11]),
            mac: [
                payload[12], payload[13], payload[14], payload[15], payload[16], payload[17],
            ],
            firmware_version: format!("{}.{}", version_major, version_minor),
            firmware_release: bcd::decode_date(&payload[20..24])?,
            discovered_at: Utc::now(),
            source_ip,
        })
    }

    /// MAC address in colon-separated hex form
    pub fn mac_address(&self) -> String {
        self.mac
            .iter()
            .map(|b| format!("{:02x}", b))
            .collect::<Vec<_>>()
            .join(":")
    }
}

impl fmt::Display for DiscoveredController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Controller[SN: {}, IP: {}, MAC: {}, FW: {}]",
            self.device_serial,
            self.ip_address,
            self.mac_address(),
            self.firmware_version
        )
    }
}
