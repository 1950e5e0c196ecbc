//! Common types for the GATT profile
//!
//! Permission and property sets, the interface/connection identifiers handed
//! out by the stack, and the client configuration written to a CCCD.

use super::constants::*;
use bitflags::bitflags;
use byteorder::{ByteOrder, LittleEndian};
use std::fmt;

bitflags! {
    /// Access permissions of an attribute
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct AttPermissions: u16 {
        const READ = GATT_PERM_READ;
        const READ_ENCRYPTED = GATT_PERM_READ_ENCRYPTED;
        const READ_ENC_MITM = GATT_PERM_READ_ENC_MITM;
        const WRITE = GATT_PERM_WRITE;
        const WRITE_ENCRYPTED = GATT_PERM_WRITE_ENCRYPTED;
        const WRITE_ENC_MITM = GATT_PERM_WRITE_ENC_MITM;
    }
}

impl AttPermissions {
    pub const fn read_only() -> Self {
        Self::READ
    }

    pub const fn read_write() -> Self {
        Self::READ.union(Self::WRITE)
    }

    pub fn can_write(&self) -> bool {
        self.contains(Self::WRITE)
    }
}

bitflags! {
    /// Properties advertised in a characteristic declaration
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct CharacteristicProperty: u8 {
        const BROADCAST = CHAR_PROP_BROADCAST;
        const READ = CHAR_PROP_READ;
        const WRITE_WITHOUT_RESPONSE = CHAR_PROP_WRITE_NR;
        const WRITE = CHAR_PROP_WRITE;
        const NOTIFY = CHAR_PROP_NOTIFY;
        const INDICATE = CHAR_PROP_INDICATE;
    }
}

/// Who answers reads and writes on an attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseMode {
    /// The stack answers from its own copy of the value
    Auto,
    /// The application must send every response itself
    Application,
}

/// GATT interface handle assigned by the stack on app registration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GattIf(pub u8);

impl GattIf {
    /// Wildcard interface: the event is not bound to a registered app.
    pub const NONE: GattIf = GattIf(0xFF);

    pub fn is_none(&self) -> bool {
        *self == Self::NONE
    }
}

impl fmt::Display for GattIf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Connection id assigned by the stack
pub type ConnId = u16;

/// Value the stack reserves for "no connection"
pub const INVALID_CONN_ID: ConnId = 0xFFFF;

/// Client Characteristic Configuration as last written by the peer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClientConfig {
    #[default]
    Disabled,
    Notify,
    Indicate,
}

impl ClientConfig {
    /// Decodes a CCCD write. Returns `None` for lengths other than 2 and for
    /// values outside disabled/notify/indicate.
    pub fn from_cccd(value: &[u8]) -> Option<Self> {
        if value.len() != 2 {
            return None;
        }
        match LittleEndian::read_u16(value) {
            CCCD_DISABLED => Some(ClientConfig::Disabled),
            CCCD_NOTIFY => Some(ClientConfig::Notify),
            CCCD_INDICATE => Some(ClientConfig::Indicate),
            _ => None,
        }
    }
}

/// Attribute value echoed back in a write response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttrValue {
    pub handle: u16,
    pub offset: u16,
    pub value: Vec<u8>,
}
