//! Card privilege payloads

use std::fmt;

use bitflags::bitflags;
use byteorder::{ByteOrder, LittleEndian};
use chrono::NaiveDate;
use doorctl_core::bcd;

use crate::error::{Error, Result};

/// Highest password a controller keypad accepts (3 packed bytes)
pub const MAX_PASSWORD: u32 = 999_999;

bitflags! {
    /// Per-door permission set
    ///
    /// On the wire each door is one independent byte (1 = enabled) at
    /// payload offsets 12..16.
    #[derive(Debug, Copy, Clone, PartialEq, Eq)]
    pub struct Doors: u8 {
        const DOOR1 = 1 << 0;
        const DOOR2 = 1 << 1;
        const DOOR3 = 1 << 2;
        const DOOR4 = 1 << 3;
    }
}

impl Doors {
    /// Check one door by its 1-based number
    pub fn has_door(self, door: u8) -> bool {
        match door {
            1 => self.contains(Self::DOOR1),
            2 => self.contains(Self::DOOR2),
            3 => self.contains(Self::DOOR3),
            4 => self.contains(Self::DOOR4),
            _ => false,
        }
    }
}

/// A card's authorized access window and per-door permission set
///
/// # Payload Layout
///
/// ```text
/// offset 0   u32 LE   card number (0 is the "not found" sentinel)
/// offset 4   4 BCD    start date (century, year, month, day)
/// offset 8   4 BCD    end date
/// offset 12  4 × u8   door 1-4 enable flags
/// offset 16  3 bytes  password, little-endian (0 = none)
/// ```
///
/// The dates use the 4-byte BCD shape, not the 7-byte timestamp shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Privilege {
    /// Card number; never 0 for a real privilege
    pub card_number: u32,

    /// First day the card is valid
    pub start: NaiveDate,

    /// Last day the card is valid
    pub end: NaiveDate,

    /// Doors the card may open
    pub doors: Doors,

    /// Optional keypad password, 1..=999999
    pub password: Option<u32>,
}

impl Privilege {
    /// Create a privilege with no password
    pub fn new(card_number: u32, start: NaiveDate, end: NaiveDate, doors: Doors) -> Self {
        Self {
            card_number,
            start,
            end,
            doors,
            password: None,
        }
    }

    /// Attach a keypad password
    pub fn with_password(mut self, password: u32) -> Self {
        self.password = Some(password);
        self
    }

    /// Encode into a request payload
    ///
    /// # Errors
    ///
    /// Fails validation when the card number is the reserved 0, the
    /// password exceeds [`MAX_PASSWORD`], or a date cannot be
    /// BCD-encoded.
    pub fn encode(&self) -> Result<[u8; 32]> {
        if self.card_number == 0 {
            return Err(Error::Validation(
                "card number 0 is reserved as the not-found sentinel".into(),
            ));
        }

        if let Some(password) = self.password {
            if password > MAX_PASSWORD {
                return Err(Error::Validation(format!(
                    "password {} exceeds maximum {}",
                    password, MAX_PASSWORD
                )));
            }
        }

        let mut payload = [0u8; 32];

        LittleEndian::write_u32(&mut payload[0..4], self.card_number);
        payload[4..8].copy_from_slice(&bcd::encode_date(&self.start)?);
        payload[8..12].copy_from_slice(&bcd::encode_date(&self.end)?);

        for door in 0..4u8 {
            payload[12 + door as usize] = self.doors.has_door(door + 1) as u8;
        }

        let password = self.password.unwrap_or(0);
        payload[16] = (password & 0xFF) as u8;
        payload[17] = ((password >> 8) & 0xFF) as u8;
        payload[18] = ((password >> 16) & 0xFF) as u8;

        Ok(payload)
    }

    /// Decode a query reply payload
    ///
    /// Returns `Ok(None)` when the card-number field is 0, the
    /// controller's "no such privilege" sentinel, which is a valid
    /// outcome rather than an error.
    pub fn decode(payload: &[u8]) -> Result<Option<Self>> {
        if payload.len() < 19 {
            return Err(doorctl_core::Error::PayloadTooShort {
                expected: 19,
                actual: payload.len(),
            }
            .into());
        }

        let card_number = LittleEndian::read_u32(&payload[0..4]);
        if card_number == 0 {
            return Ok(None);
        }

        let mut doors = Doors::empty();
        for door in 0..4u8 {
            if payload[12 + door as usize] == 1 {
                doors |= match door {
                    0 => Doors::DOOR1,
                    1 => Doors::DOOR2,
                    2 => Doors::DOOR3,
                    _ => Doors::DOOR4,
                };
            }
        }

        let password =
            payload[16] as u32 | (payload[17] as u32) << 8 | (payload[18] as u32) << 16;

        Ok(Some(Self {
            card_number,
            start: bcd::decode_date(&payload[4..8])?,
            end: bcd::decode_date(&payload[8..12])?,
            doors,
            password: (password != 0).then_some(password),
        }))
    }
}

impl fmt::Display for Privilege {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Privilege[card: {}, {} to {}, doors: {:04b}]",
            self.card_number,
            self.start.format("%Y%m%d"),
            self.end.format("%Y%m%d"),
            self.doors.bits()
        )
    }
}
