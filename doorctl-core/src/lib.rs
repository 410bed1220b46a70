//! # doorctl-core
//!
//! Core protocol implementation for UDP door access controllers.
//!
//! This crate provides the low-level protocol primitives:
//! - Frame structure and encoding/decoding (fixed 64-byte datagrams)
//! - BCD date/time codecs
//! - Function-id definitions and response-shape classification

pub mod bcd;
pub mod error;
pub mod frame;
pub mod function;

pub use error::{Error, Result};
pub use frame::Frame;
pub use function::{Function, ResponseKind};

/// Fixed first byte of every request and reply frame
pub const FRAME_TYPE: u8 = 0x17;

/// Wire size of every frame
pub const FRAME_SIZE: usize = 64;

/// Size of the function-specific payload section
pub const PAYLOAD_SIZE: usize = 32;

/// Default controller port
pub const DEFAULT_PORT: u16 = 60000;
