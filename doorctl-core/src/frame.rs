//! Protocol frame structure and encoding/decoding

use bytes::{Buf, BufMut, Bytes, BytesMut};
use std::fmt;

use crate::{
    error::{Error, Result},
    function::Function,
    FRAME_SIZE, FRAME_TYPE, PAYLOAD_SIZE,
};

/// Protocol frame
///
/// # Frame Structure
///
/// ```text
/// ┌────────┬──────────┬──────────┬──────────┬───────────┬──────────┬──────────┐
/// │  Type  │ Function │ Reserved │  Serial  │  Payload  │ Sequence │   Tail   │
/// │ 1 byte │  1 byte  │ 2 bytes  │ 4 bytes  │ 32 bytes  │ 4 bytes  │ 20 bytes │
/// │ (0x17) │          │  (zero)  │ (LE u32) │           │ (LE u32) │  (zero)  │
/// └────────┴──────────┴──────────┴──────────┴───────────┴──────────┴──────────┘
/// ```
///
/// All multi-byte values are in little-endian format; every frame is
/// exactly 64 bytes on the wire.
///
/// # Examples
///
/// ```
/// use doorctl_core::{Frame, Function};
///
/// let frame = Frame::new(Function::QueryStatus, 423187757);
/// let encoded = frame.encode();
/// assert_eq!(encoded.len(), 64);
///
/// let decoded = Frame::decode(&encoded).unwrap();
/// assert_eq!(frame.function, decoded.function);
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct Frame {
    /// Function id selecting the operation
    pub function: Function,

    /// Device serial number (0 for broadcast discovery)
    pub device_serial: u32,

    /// Function-specific payload, at most 32 bytes; shorter payloads
    /// are zero-padded on encode
    pub payload: Bytes,

    /// Caller-assigned sequence id (0 when unused)
    pub sequence_id: u32,
}

impl Frame {
    /// Create a new frame with empty payload
    ///
    /// # Examples
    ///
    /// ```
    /// use doorctl_core::{Frame, Function};
    ///
    /// let frame = Frame::new(Function::ReadTime, 423187757);
    /// assert_eq!(frame.payload.len(), 0);
    /// ```
    pub fn new(function: Function, device_serial: u32) -> Self {
        Self {
            function,
            device_serial,
            payload: Bytes::new(),
            sequence_id: 0,
        }
    }

    /// Create a frame with payload
    ///
    /// # Errors
    ///
    /// Returns [`Error::PayloadTooLarge`] if the payload exceeds the
    /// fixed 32-byte section.
    ///
    /// # Examples
    ///
    /// ```
    /// use doorctl_core::{Frame, Function};
    ///
    /// let frame = Frame::with_payload(Function::OpenDoor, 423187757, vec![1]).unwrap();
    /// assert_eq!(frame.payload.len(), 1);
    /// ```
    pub fn with_payload(
        function: Function,
        device_serial: u32,
        payload: impl Into<Bytes>,
    ) -> Result<Self> {
        let payload = payload.into();
        if payload.len() > PAYLOAD_SIZE {
            return Err(Error::PayloadTooLarge {
                size: payload.len(),
                max: PAYLOAD_SIZE,
            });
        }

        Ok(Self {
            function,
            device_serial,
            payload,
            sequence_id: 0,
        })
    }

    /// Set the caller-assigned sequence id
    pub fn with_sequence_id(mut self, sequence_id: u32) -> Self {
        self.sequence_id = sequence_id;
        self
    }

    /// Encode frame to its 64-byte wire form
    ///
    /// # Examples
    ///
    /// ```
    /// use doorctl_core::{Frame, Function};
    ///
    /// let bytes = Frame::new(Function::Search, 0).encode();
    /// assert_eq!(bytes.len(), 64);
    /// assert_eq!(bytes[0], 0x17);
    /// ```
    pub fn encode(&self) -> BytesMut {
        let mut buf = BytesMut::with_capacity(FRAME_SIZE);

        buf.put_u8(FRAME_TYPE);
        buf.put_u8(self.function.into());
        buf.put_u16_le(0x0000); // Reserved
        buf.put_u32_le(self.device_serial);

        // Payload section, zero-padded to 32 bytes
        buf.put_slice(&self.payload);
        buf.put_bytes(0, PAYLOAD_SIZE - self.payload.len());

        buf.put_u32_le(self.sequence_id);

        // Reserved 20-byte tail
        buf.put_bytes(0, FRAME_SIZE - buf.len());

        buf
    }

    /// Decode a frame from its wire form
    ///
    /// The type sentinel and function id are not validated against any
    /// expectation here: discovery replies always carry 0x94 while a
    /// request/reply caller checks the echo itself.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Buffer length differs from 64 bytes
    /// - The function id byte is not in the catalogue
    ///
    /// # Examples
    ///
    /// ```
    /// use doorctl_core::{Frame, Function};
    ///
    /// let original = Frame::new(Function::ReadTime, 423187757);
    /// let decoded = Frame::decode(&original.encode()).unwrap();
    /// assert_eq!(original.function, decoded.function);
    /// assert_eq!(original.device_serial, decoded.device_serial);
    /// ```
    pub fn decode(buf: &[u8]) -> Result<Self> {
        if buf.len() != FRAME_SIZE {
            return Err(Error::InvalidFrameLength {
                expected: FRAME_SIZE,
                actual: buf.len(),
            });
        }

        let mut buf = Bytes::copy_from_slice(buf);

        let _frame_type = buf.get_u8();
        let function = Function::try_from(buf.get_u8())?;
        let _reserved = buf.get_u16_le();
        let device_serial = buf.get_u32_le();
        let payload = buf.split_to(PAYLOAD_SIZE);
        let sequence_id = buf.get_u32_le();
        // Remaining 20 reserved bytes are ignored

        Ok(Self {
            function,
            device_serial,
            payload,
            sequence_id,
        })
    }

    /// Payload as a fixed 32-byte view (zero-padded like the wire form)
    pub fn payload_bytes(&self) -> [u8; PAYLOAD_SIZE] {
        let mut bytes = [0u8; PAYLOAD_SIZE];
        bytes[..self.payload.len()].copy_from_slice(&self.payload);
        bytes
    }

    /// Check if the reply payload carries the success flag
    /// (shape of every [`ResponseKind::AckFlag`] operation)
    ///
    /// [`ResponseKind::AckFlag`]: crate::function::ResponseKind::AckFlag
    pub fn is_acked(&self) -> bool {
        self.payload.first() == Some(&1)
    }
}

impl fmt::Debug for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Frame")
            .field("function", &self.function)
            .field("device_serial", &self.device_serial)
            .field("sequence_id", &self.sequence_id)
            .field("payload", &hex::encode(&self.payload))
            .finish()
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Frame[{}](serial={}, seq={}, len={})",
            self.function,
            self.device_serial,
            self.sequence_id,
            self.payload.len()
        )
    }
}
