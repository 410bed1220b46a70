//! Protocol function-id definitions

use std::fmt;

use crate::error::{Error, Result};

/// Protocol function ids
///
/// One byte at frame offset 1 selecting the operation. Replies echo the
/// request's function id, including discovery replies (0x94).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Function {
    // Network management
    Search = 0x94,
    SetAddress = 0x96,

    // Controller state
    QueryStatus = 0x20,
    SetTime = 0x30,
    ReadTime = 0x32,

    // Doors
    OpenDoor = 0x40,
    SetDoorControl = 0x80,
    ReadDoorControl = 0x82,

    // Privileges (card permissions)
    AddPrivilege = 0x50,
    DeletePrivilege = 0x52,
    ClearPrivileges = 0x54,
    AddPrivilegeSorted = 0x56,
    PrivilegeCount = 0x58,
    QueryPrivilege = 0x5A,
    PrivilegeAtIndex = 0x5C,

    // Event upload
    RecordSpecialEvents = 0x8C,
    SetEventServer = 0x90,
    ReadEventServer = 0x92,

    // Access records
    GetRecord = 0xB0,
    SetRecordIndex = 0xB2,
    GetRecordIndex = 0xB4,
}

/// How a controller answers a given function
///
/// Success semantics differ per operation; every function id falls into
/// one of four reply shapes rather than being special-cased at each
/// call site.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ResponseKind {
    /// Reply payload byte 0 is 1 on success, 0 on refusal
    AckFlag,

    /// Reply echoes a request field; success iff the echo matches
    Echo,

    /// The controller restarts and never replies; the send completing
    /// is the only confirmation
    FireAndForget,

    /// Reply carries data; "not found" is a sentinel field value, not
    /// a failure
    Query,
}

impl Function {
    /// Classify this function's reply shape
    pub fn response_kind(self) -> ResponseKind {
        match self {
            Self::OpenDoor
            | Self::AddPrivilege
            | Self::AddPrivilegeSorted
            | Self::DeletePrivilege
            | Self::ClearPrivileges
            | Self::SetRecordIndex
            | Self::RecordSpecialEvents
            | Self::SetEventServer => ResponseKind::AckFlag,

            Self::SetDoorControl => ResponseKind::Echo,

            Self::SetAddress => ResponseKind::FireAndForget,

            Self::Search
            | Self::QueryStatus
            | Self::SetTime
            | Self::ReadTime
            | Self::ReadDoorControl
            | Self::PrivilegeCount
            | Self::QueryPrivilege
            | Self::PrivilegeAtIndex
            | Self::ReadEventServer
            | Self::GetRecord
            | Self::GetRecordIndex => ResponseKind::Query,
        }
    }

    /// Whether any reply is expected at all
    pub fn expects_reply(self) -> bool {
        self.response_kind() != ResponseKind::FireAndForget
    }

    /// Get function name
    pub fn name(self) -> &'static str {
        match self {
            Self::Search => "SEARCH",
            Self::SetAddress => "SET_ADDRESS",
            Self::QueryStatus => "QUERY_STATUS",
            Self::SetTime => "SET_TIME",
            Self::ReadTime => "READ_TIME",
            Self::OpenDoor => "OPEN_DOOR",
            Self::SetDoorControl => "SET_DOOR_CONTROL",
            Self::ReadDoorControl => "READ_DOOR_CONTROL",
            Self::AddPrivilege => "ADD_PRIVILEGE",
            Self::DeletePrivilege => "DELETE_PRIVILEGE",
            Self::ClearPrivileges => "CLEAR_PRIVILEGES",
            Self::AddPrivilegeSorted => "ADD_PRIVILEGE_SORTED",
            Self::PrivilegeCount => "PRIVILEGE_COUNT",
            Self::QueryPrivilege => "QUERY_PRIVILEGE",
            Self::PrivilegeAtIndex => "PRIVILEGE_AT_INDEX",
            Self::RecordSpecialEvents => "RECORD_SPECIAL_EVENTS",
            Self::SetEventServer => "SET_EVENT_SERVER",
            Self::ReadEventServer => "READ_EVENT_SERVER",
            Self::GetRecord => "GET_RECORD",
            Self::SetRecordIndex => "SET_RECORD_INDEX",
            Self::GetRecordIndex => "GET_RECORD_INDEX",
        }
    }
}

impl From<Function> for u8 {
    fn from(function: Function) -> u8 {
        function as u8
    }
}

impl TryFrom<u8> for Function {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0x94 => Ok(Self::Search),
            0x96 => Ok(Self::SetAddress),
            0x20 => Ok(Self::QueryStatus),
            0x30 => Ok(Self::SetTime),
            0x32 => Ok(Self::ReadTime),
            0x40 => Ok(Self::OpenDoor),
            0x80 => Ok(Self::SetDoorControl),
            0x82 => Ok(Self::ReadDoorControl),
            0x50 => Ok(Self::AddPrivilege),
            0x52 => Ok(Self::DeletePrivilege),
            0x54 => Ok(Self::ClearPrivileges),
            0x56 => Ok(Self::AddPrivilegeSorted),
            0x58 => Ok(Self::PrivilegeCount),
            0x5A => Ok(Self::QueryPrivilege),
            0x5C => Ok(Self::PrivilegeAtIndex),
            0x8C => Ok(Self::RecordSpecialEvents),
            0x90 => Ok(Self::SetEventServer),
            0x92 => Ok(Self::ReadEventServer),
            0xB0 => Ok(Self::GetRecord),
            0xB2 => Ok(Self::SetRecordIndex),
            0xB4 => Ok(Self::GetRecordIndex),
            _ => Err(Error::UnknownFunction(value)),
        }
    }
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(0x{:02X})", self.name(), *self as u8)
    }
}
