//! Error types for doorctl-core



/// Result type alias for core protocol operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core protocol errors
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Received buffer is not a whole frame
    #[error("Invalid frame length: expected {expected} bytes, got {actual} bytes")]
    InvalidFrameLength {
        expected: usize,
        actual: usize,
    },

    /// Payload exceeds the fixed 32-byte section
    #[error("Payload too large: {size} bytes (max: {max} bytes)")]
    PayloadTooLarge {
        size: usize,
        max: usize,
    },

    /// Payload section ends before the field being decoded
    #[error("Payload too short: expected at least {expected} bytes, got {actual} bytes")]
    PayloadTooShort {
        expected: usize,
        actual: usize,
    },

    /// Unknown function id byte
    #[error("Unknown function id: 0x{0:02X}")]
    UnknownFunction(u8),

    /// Byte is not valid BCD (a nibble above 9)
    #[error("Invalid BCD byte: 0x{0:02X}")]
    InvalidBcd(u8),

    /// Decimal value cannot be packed into one BCD byte
    #[error("Value out of BCD range: {0} (max: 99)")]
    BcdRange(u32),

    /// Decoded digits do not form a valid calendar date/time
    #[error("Invalid date: {year:04}-{month:02}-{day:02} {hour:02}:{minute:02}:{second:02}")]
    InvalidDate {
        year: i32,
        month: u8,
        day: u8,
        hour: u8,
        minute: u8,
        second: u8,
    },
}

impl Error {
    /// Check if the error means a received buffer should be dropped
    /// rather than surfaced (best-effort collection paths)
    pub fn is_malformed_input(&self) -> bool {
        matches!(
            self,
            Self::InvalidFrameLength { .. }
                | Self::PayloadTooShort { .. }
                | Self::UnknownFunction(_)
                | Self::InvalidBcd(_)
                | Self::InvalidDate { .. }
        )
    }
}
