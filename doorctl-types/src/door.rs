//! Door control parameters

use std::fmt;

use crate::error::{Error, Result};

/// How a door lock is driven
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[repr(u8)]
pub enum ControlMethod {
    /// Lock held open
    NormallyOpen = 1,

    /// Lock held closed
    NormallyClosed = 2,

    /// Lock follows privilege checks (normal operation)
    Online = 3,
}

impl TryFrom<u8> for ControlMethod {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            1 => Ok(Self::NormallyOpen),
            2 => Ok(Self::NormallyClosed),
            3 => Ok(Self::Online),
            other => Err(Error::Validation(format!(
                "unknown control method {}",
                other
            ))),
        }
    }
}

impl fmt::Display for ControlMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NormallyOpen => write!(f, "normally open"),
            Self::NormallyClosed => write!(f, "normally closed"),
            Self::Online => write!(f, "online"),
        }
    }
}

/// Control parameters of one door
///
/// # Payload Layout (request and reply)
///
/// ```text
/// offset 0   u8   door number (1-4)
/// offset 1   u8   control method
/// offset 2   u8   open delay, seconds
/// ```
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct DoorControl {
    /// Door number, 1..=4
    pub door: u8,

    /// Drive mode of the lock
    pub method: ControlMethod,

    /// Seconds the lock stays released after opening
    pub open_delay: u8,
}

impl DoorControl {
    /// Create door control parameters
    ///
    /// # Errors
    ///
    /// Fails validation when the door number is outside 1..=4.
    pub fn new(door: u8, method: ControlMethod, open_delay: u8) -> Result<Self> {
        if !(1..=4).contains(&door) {
            return Err(Error::Validation(format!(
                "door number {} out of range 1-4",
                door
            )));
        }

        Ok(Self {
            door,
            method,
            open_delay,
        })
    }

    /// Encode into a request payload
    pub fn encode(&self) -> [u8; 32] {
        let mut payload = [0u8; 32];
        payload[0] = self.door;
        payload[1] = self.method as u8;
        payload[2] = self.open_delay;
        payload
    }

    /// Decode a reply payload
    pub fn decode(payload: &[u8]) -> Result<Self> {
        if payload.len() < 3 {
            return Err(doorctl_core::Error::PayloadTooShort {
                expected: 3,
                actual: payload.len(),
            }
            .into());
        }

        Self::new(payload[0], ControlMethod::try_from(payload[1])?, payload[2])
    }
}

impl fmt::Display for DoorControl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Door {}: {}, open delay {}s",
            self.door, self.method, self.open_delay
        )
    }
}
