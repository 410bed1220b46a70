//! BCD (binary-coded decimal) codecs
//!
//! Every date and time field on the wire is BCD: each nibble holds one
//! decimal digit, so 0x59 means decimal 59. Two layouts exist:
//! - 7 bytes for full timestamps (century, year, month, day, hour,
//!   minute, second)
//! - 4 bytes for privilege validity dates (century, year, month, day)
//!
//! The two layouts are deliberately separate codecs; privilege payloads
//! never use the 7-byte form.

use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike};

use crate::error::{Error, Result};

/// Wire size of a full BCD timestamp
pub const DATETIME_LEN: usize = 7;

/// Wire size of a BCD calendar date
pub const DATE_LEN: usize = 4;

/// Decode one BCD byte to its decimal value
///
/// # Errors
///
/// Returns [`Error::InvalidBcd`] when either nibble is above 9.
///
/// # Examples
///
/// ```
/// use doorctl_core::bcd;
///
/// assert_eq!(bcd::to_decimal(0x59).unwrap(), 59);
/// assert!(bcd::to_decimal(0x5A).is_err());
/// ```
pub fn to_decimal(byte: u8) -> Result<u8> {
    let tens = byte >> 4;
    let units = byte & 0x0F;

    if tens > 9 || units > 9 {
        return Err(Error::InvalidBcd(byte));
    }

    Ok(tens * 10 + units)
}

/// Encode a decimal value 0..=99 as one BCD byte
///
/// # Errors
///
/// Returns [`Error::BcdRange`] for values above 99.
///
/// # Examples
///
/// ```
/// use doorctl_core::bcd;
///
/// assert_eq!(bcd::from_decimal(59).unwrap(), 0x59);
/// assert!(bcd::from_decimal(100).is_err());
/// ```
pub fn from_decimal(decimal: u32) -> Result<u8> {
    if decimal > 99 {
        return Err(Error::BcdRange(decimal));
    }

    Ok((((decimal / 10) << 4) | (decimal % 10)) as u8)
}

/// Encode a timestamp as 7 BCD bytes
pub fn encode_datetime(datetime: &NaiveDateTime) -> Result<[u8; DATETIME_LEN]> {
    let year = datetime.year();
    if !(0..=9999).contains(&year) {
        return Err(Error::BcdRange(year.unsigned_abs()));
    }

    Ok([
        from_decimal(year as u32 / 100)?,
        from_decimal(year as u32 % 100)?,
        from_decimal(datetime.month())?,
        from_decimal(datetime.day())?,
        from_decimal(datetime.hour())?,
        from_decimal(datetime.minute())?,
        from_decimal(datetime.second())?,
    ])
}

/// Decode 7 BCD bytes into a timestamp
///
/// The four-digit year is reconstructed as `century * 100 + year`.
///
/// # Errors
///
/// Returns [`Error::PayloadTooShort`] when fewer than 7 bytes are
/// given, [`Error::InvalidBcd`] on a malformed digit, and
/// [`Error::InvalidDate`] when the digits form no real calendar value.
pub fn decode_datetime(bytes: &[u8]) -> Result<NaiveDateTime> {
    if bytes.len() < DATETIME_LEN {
        return Err(Error::PayloadTooShort {
            expected: DATETIME_LEN,
            actual: bytes.len(),
        });
    }

    let century = to_decimal(bytes[0])?;
    let year = to_decimal(bytes[1])?;
    let month = to_decimal(bytes[2])?;
    let day = to_decimal(bytes[3])?;
    let hour = to_decimal(bytes[4])?;
    let minute = to_decimal(bytes[5])?;
    let second = to_decimal(bytes[6])?;

    let full_year = century as i32 * 100 + year as i32;

    NaiveDate::from_ymd_opt(full_year, month as u32, day as u32)
        .and_then(|date| date.and_hms_opt(hour as u32, minute as u32, second as u32))
        .ok_or(Error::InvalidDate {
            year: full_year,
            month,
            day,
            hour,
            minute,
            second,
        })
}

/// Encode a calendar date as 4 BCD bytes (privilege validity layout)
pub fn encode_date(date: &NaiveDate) -> Result<[u8; DATE_LEN]> {
    let year = date.year();
    if !(0..=9999).contains(&year) {
        return Err(Error::BcdRange(year.unsigned_abs()));
    }

    Ok([
        from_decimal(year as u32 / 100)?,
        from_decimal(year as u32 % 100)?,
        from_decimal(date.month())?,
        from_decimal(date.day())?,
    ])
}

/// Decode 4 BCD bytes into a calendar date (privilege validity layout)
pub fn decode_date(bytes: &[u8]) -> Result<NaiveDate> {
    if bytes.len() < DATE_LEN {
        return Err(Error::PayloadTooShort {
            expected: DATE_LEN,
            actual: bytes.len(),
        });
    }

    let century = to_decimal(bytes[0])?;
    let year = to_decimal(bytes[1])?;
    let month = to_decimal(bytes[2])?;
    let day = to_decimal(bytes[3])?;

    let full_year = century as i32 * 100 + year as i32;

    NaiveDate::from_ymd_opt(full_year, month as u32, day as u32).ok_or(Error::InvalidDate {
        year: full_year,
        month,
        day,
        hour: 0,
        minute: 0,
        second: 0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    #[test]
    fn test_byte_codec() {
        assert_eq!(to_decimal(0x59).unwrap(), 59);
        assert_eq!(from_decimal(59).unwrap(), 0x59);
        assert_eq!(to_decimal(0x00).unwrap(), 0);
        assert_eq!(from_decimal(0).unwrap(), 0x00);
        assert_eq!(to_decimal(0x99).unwrap(), 99);
        assert_eq!(from_decimal(99).unwrap(), 0x99);
    }

    #[test]
    fn test_byte_codec_rejects() {
        assert!(matches!(to_decimal(0x0A), Err(Error::InvalidBcd(0x0A))));
        assert!(matches!(to_decimal(0xA0), Err(Error::InvalidBcd(0xA0))));
        assert!(matches!(from_decimal(100), Err(Error::BcdRange(100))));
    }

    #[test]
    fn test_datetime_codec() {
        let datetime = NaiveDate::from_ymd_opt(2025, 12, 31)
            .unwrap()
            .and_hms_opt(23, 59, 58)
            .unwrap();

        let bytes = encode_datetime(&datetime).unwrap();
        assert_eq!(bytes, [0x20, 0x25, 0x12, 0x31, 0x23, 0x59, 0x58]);
        assert_eq!(decode_datetime(&bytes).unwrap(), datetime);
    }

    #[test]
    fn test_datetime_short_buffer() {
        assert!(matches!(
            decode_datetime(&[0x20, 0x25]),
            Err(Error::PayloadTooShort { .. })
        ));
    }

    #[test]
    fn test_datetime_invalid_calendar() {
        // 2025-02-30 does not exist
        let bytes = [0x20, 0x25, 0x02, 0x30, 0x00, 0x00, 0x00];
        assert!(matches!(
            decode_datetime(&bytes),
            Err(Error::InvalidDate { .. })
        ));
    }

    #[test]
    fn test_date_codec() {
        let date = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();

        let bytes = encode_date(&date).unwrap();
        assert_eq!(bytes, [0x20, 0x25, 0x01, 0x01]);
        assert_eq!(decode_date(&bytes).unwrap(), date);
    }

    #[test]
    fn test_date_codec_is_not_the_timestamp_codec() {
        // 4-byte dates must not be fed to the 7-byte decoder
        let bytes = encode_date(&NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()).unwrap();
        assert!(decode_datetime(&bytes).is_err());
    }

    proptest! {
        #[test]
        fn prop_byte_roundtrip(decimal in 0u32..=99) {
            let byte = from_decimal(decimal).unwrap();
            prop_assert_eq!(to_decimal(byte).unwrap() as u32, decimal);
        }

        #[test]
        fn prop_datetime_roundtrip(
            year in 1900i32..=2099,
            month in 1u32..=12,
            day in 1u32..=28,
            hour in 0u32..=23,
            minute in 0u32..=59,
            second in 0u32..=59,
        ) {
            let datetime = NaiveDate::from_ymd_opt(year, month, day)
                .unwrap()
                .and_hms_opt(hour, minute, second)
                .unwrap();

            let bytes = encode_datetime(&datetime).unwrap();
            prop_assert_eq!(decode_datetime(&bytes).unwrap(), datetime);
        }

        #[test]
        fn prop_date_roundtrip(year in 1900i32..=2099, month in 1u32..=12, day in 1u32..=28) {
            let date = NaiveDate::from_ymd_opt(year, month, day).unwrap();
            let bytes = encode_date(&date).unwrap();
            prop_assert_eq!(decode_date(&bytes).unwrap(), date);
        }
    }
}
