//! Type definitions for doorctl
//!
//! Typed records exchanged with controllers, plus their 32-byte
//! payload encodings.

pub mod discovery;
pub mod door;
pub mod error;
pub mod privilege;
pub mod server;
pub mod status;

pub use discovery::DiscoveredController;
pub use door::{ControlMethod, DoorControl};
pub use error::{Error, Result};
pub use privilege::{Doors, Privilege};
pub use server::EventServer;
pub use status::{AccessRecord, ControllerStatus, Direction, RecordType};
