//! High-level error types

use doorctl_core::Function;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Core protocol error: {0}")]
    Core(#[from] doorctl_core::Error),

    #[error("Transport error: {0}")]
    Transport(#[from] doorctl_transport::Error),

    #[error("Type error: {0}")]
    Types(#[from] doorctl_types::Error),

    /// The controller answered but refused the command (ack byte not
    /// set, or an echoed field that does not match the request);
    /// distinct from a transport timeout
    #[error("Controller rejected {function}")]
    Rejected { function: Function },

    /// The reply's function id is not the one the request carried
    #[error("Unexpected reply: expected {expected}, got {actual}")]
    UnexpectedReply {
        expected: Function,
        actual: Function,
    },
}
