//! # doorctl
//!
//! Rust implementation of the fixed-64-byte UDP protocol spoken by
//! door access controllers.
//!
//! ## Features
//!
//! - Type-safe frame and BCD codecs
//! - Async/await API using Tokio, one socket per exchange
//! - Broadcast discovery with live progress reporting
//! - The full 21-operation function catalogue
//!
//! ## Quick Start
//!
//! ```no_run
//! use doorctl::{Controller, Discovery};
//!
//! #[tokio::main]
//! async fn main() -> doorctl::Result<()> {
//!     // Find controllers on the local segment
//!     let controllers = Discovery::new().run().await?;
//!
//!     for found in &controllers {
//!         println!("{}", found);
//!
//!         // Talk to one of them
//!         let controller = Controller::new(found.device_serial, found.source_ip);
//!         let status = controller.status().await?;
//!         println!("  clock: {}", status.clock);
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod controller;
pub mod discover;
pub mod error;

// Re-exports
pub use controller::Controller;
pub use discover::{Discovery, DEFAULT_BROADCAST};
pub use error::{Error, Result};

// Re-export protocol and record types
pub use doorctl_core::{bcd, Frame, Function, ResponseKind, DEFAULT_PORT};
pub use doorctl_transport::{Exchange, Scanner, UdpExchange};
pub use doorctl_types::{
    AccessRecord, ControlMethod, ControllerStatus, Direction, DiscoveredController, DoorControl,
    Doors, EventServer, Privilege, RecordType,
};
