//! Controller status and access record payloads

use std::fmt;

use byteorder::{ByteOrder, LittleEndian};
use chrono::{NaiveDateTime, NaiveTime};
use doorctl_core::bcd;

use crate::error::Result;

/// What kind of event an access record describes
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum RecordType {
    /// Index points at no record
    None,

    /// Card swipe
    Swipe,

    /// Door sensor, exit button, device start or remote open
    DoorEvent,

    /// Alarm log
    Alarm,

    /// Record overwritten by the ring buffer
    Overwritten,

    /// Type byte this library does not know
    Other(u8),
}

impl From<u8> for RecordType {
    fn from(value: u8) -> Self {
        match value {
            0x00 => Self::None,
            0x01 => Self::Swipe,
            0x02 => Self::DoorEvent,
            0x03 => Self::Alarm,
            0xFF => Self::Overwritten,
            other => Self::Other(other),
        }
    }
}

impl RecordType {
    pub fn description(self) -> &'static str {
        match self {
            Self::None => "no record",
            Self::Swipe => "swipe card record",
            Self::DoorEvent => "door sensor/button/device start/remote open",
            Self::Alarm => "alarm log",
            Self::Overwritten => "record overwritten",
            Self::Other(_) => "unknown",
        }
    }
}

/// Direction of a card swipe
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Direction {
    In,
    Out,
}

impl From<u8> for Direction {
    fn from(value: u8) -> Self {
        if value == 1 { Self::In } else { Self::Out }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::In => write!(f, "IN"),
            Self::Out => write!(f, "OUT"),
        }
    }
}

/// One stored access record
///
/// # Payload Layout (shared by GET_RECORD replies and the leading
/// section of QUERY_STATUS replies)
///
/// ```text
/// offset 0   u32 LE   record index
/// offset 4   u8       record type
/// offset 5   u8       validity (1 = allowed)
/// offset 6   u8       door number
/// offset 7   u8       direction (1 = in)
/// offset 8   u32 LE   card number
/// offset 12  7 BCD    swipe timestamp
/// offset 19  u8       reason code
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessRecord {
    pub index: u32,
    pub record_type: RecordType,
    pub valid: bool,
    pub door: u8,
    pub direction: Direction,
    pub card_number: u32,
    /// Absent when the slot holds no record
    pub timestamp: Option<NaiveDateTime>,
    pub reason: u8,
}

impl AccessRecord {
    /// Parse an access record from a reply payload
    pub fn from_payload(payload: &[u8]) -> Result<Self> {
        if payload.len() < 20 {
            return Err(doorctl_core::Error::PayloadTooShort {
                expected: 20,
                actual: payload.len(),
            }
            .into());
        }

        let record_type = RecordType::from(payload[4]);

        // An empty slot leaves the timestamp bytes zeroed, which is not
        // a parseable date
        let timestamp = if record_type == RecordType::None {
            None
        } else {
            Some(bcd::decode_datetime(&payload[12..19])?)
        };

        Ok(Self {
            index: LittleEndian::read_u32(&payload[0..4]),
            record_type,
            valid: payload[5] == 1,
            door: payload[6],
            direction: Direction::from(payload[7]),
            card_number: LittleEndian::read_u32(&payload[8..12]),
            timestamp,
            reason: payload[19],
        })
    }
}

/// Controller status reply
///
/// Extends the last access record with live door sensor/button state,
/// the controller's error flag and its on-board clock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerStatus {
    /// Most recent access record
    pub last_record: AccessRecord,

    /// Door sensor state, doors 1-4 (true = triggered)
    pub sensors: [bool; 4],

    /// Exit button state, doors 1-4 (true = pressed)
    pub buttons: [bool; 4],

    /// Controller error number (0 = none)
    pub error_number: u8,

    /// The controller clock, time of day only
    pub clock: NaiveTime,
}

impl ControllerStatus {
    /// Parse a QUERY_STATUS reply payload
    pub fn from_payload(payload: &[u8]) -> Result<Self> {
        if payload.len() < doorctl_core::PAYLOAD_SIZE {
            return Err(doorctl_core::Error::PayloadTooShort {
                expected: doorctl_core::PAYLOAD_SIZE,
                actual: payload.len(),
            }
            .into());
        }

        let hour = bcd::to_decimal(payload[29])?;
        let minute = bcd::to_decimal(payload[30])?;
        let second = bcd::to_decimal(payload[31])?;

        let clock = NaiveTime::from_hms_opt(hour as u32, minute as u32, second as u32).ok_or(
            doorctl_core::Error::InvalidDate {
                year: 0,
                month: 0,
                day: 0,
                hour,
                minute,
                second,
            },
        )?;

        Ok(Self {
            last_record: AccessRecord::from_payload(payload)?,
            sensors: [
                payload[20] == 1,
                payload[21] == 1,
                payload[22] == 1,
                payload[23] == 1,
            ],
            buttons: [
                payload[24] == 1,
                payload[25] == 1,
                payload[26] == 1,
                payload[27] == 1,
            ],
            error_number: payload[28],
            clock,
        })
    }
}
