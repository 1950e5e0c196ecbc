//! Bluetooth UUIDs as used in attribute tables and advertising payloads.
//!
//! Every UUID is stored as a full 128-bit value in little-endian order (the
//! order the stack and the air interface use). SIG-assigned 16-bit values sit
//! on top of the Bluetooth base UUID and are emitted in their short form
//! wherever the protocol allows it.

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Bluetooth base UUID `00000000-0000-1000-8000-00805F9B34FB`, little-endian.
const BASE_UUID_BYTES: [u8; 16] = [
    0xFB, 0x34, 0x9B, 0x5F, 0x80, 0x00, 0x00, 0x80, 0x00, 0x10, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
];

/// Offset of the 16/32-bit alias inside the base UUID.
const BASE_OFFSET: usize = 12;

/// A Bluetooth UUID.
#[derive(Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Uuid {
    bytes: [u8; 16],
}

impl Uuid {
    /// Builds a UUID from 16 big-endian bytes (textual order).
    pub fn from_bytes_be(mut bytes: [u8; 16]) -> Self {
        bytes.reverse();
        Uuid { bytes }
    }

    /// Builds a UUID from a SIG-assigned 16-bit alias.
    pub const fn from_u16(uuid16: u16) -> Self {
        let mut bytes = BASE_UUID_BYTES;
        bytes[BASE_OFFSET] = uuid16 as u8;
        bytes[BASE_OFFSET + 1] = (uuid16 >> 8) as u8;
        Uuid { bytes }
    }

    pub const fn as_bytes_le(&self) -> &[u8; 16] {
        &self.bytes
    }

    pub fn as_bytes_be(&self) -> [u8; 16] {
        let mut bytes = self.bytes;
        bytes.reverse();
        bytes
    }

    fn is_sig_assigned(&self) -> bool {
        self.bytes[..BASE_OFFSET] == BASE_UUID_BYTES[..BASE_OFFSET]
    }

    /// Returns the 16-bit alias when this UUID has one.
    pub fn as_u16(&self) -> Option<u16> {
        if self.is_sig_assigned() && self.bytes[BASE_OFFSET + 2] == 0 && self.bytes[BASE_OFFSET + 3] == 0 {
            Some(u16::from_le_bytes([
                self.bytes[BASE_OFFSET],
                self.bytes[BASE_OFFSET + 1],
            ]))
        } else {
            None
        }
    }

    /// Length in bytes of the shortest encoding (2 or 16).
    pub fn encoded_len(&self) -> usize {
        if self.as_u16().is_some() {
            2
        } else {
            16
        }
    }

    /// Shortest little-endian encoding, as stored in declarations and AD fields.
    pub fn to_le_vec(&self) -> Vec<u8> {
        match self.as_u16() {
            Some(short) => short.to_le_bytes().to_vec(),
            None => self.bytes.to_vec(),
        }
    }
}

impl PartialEq<u16> for Uuid {
    fn eq(&self, other: &u16) -> bool {
        self.as_u16() == Some(*other)
    }
}

impl fmt::Display for Uuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let b = self.as_bytes_be();
        write!(
            f,
            "{}-{}-{}-{}-{}",
            hex::encode(&b[0..4]),
            hex::encode(&b[4..6]),
            hex::encode(&b[6..8]),
            hex::encode(&b[8..10]),
            hex::encode(&b[10..16])
        )
    }
}

impl fmt::Debug for Uuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.as_u16() {
            Some(short) => write!(f, "Uuid(0x{:04X})", short),
            None => write!(f, "Uuid({})", self),
        }
    }
}

#[derive(Debug, Error)]
pub enum UuidParseError {
    #[error("invalid UUID length: {0} hex digits")]
    InvalidLength(usize),
    #[error("invalid hex in UUID: {0}")]
    Hex(#[from] hex::FromHexError),
}

impl FromStr for Uuid {
    type Err = UuidParseError;

    /// Accepts `"00FF"` or a 128-bit UUID with or without hyphens.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let cleaned: String = s.chars().filter(|c| *c != '-').collect();
        match cleaned.len() {
            4 => {
                let mut be = [0u8; 2];
                hex::decode_to_slice(&cleaned, &mut be)?;
                Ok(Uuid::from_u16(u16::from_be_bytes(be)))
            }
            32 => {
                let mut be = [0u8; 16];
                hex::decode_to_slice(&cleaned, &mut be)?;
                Ok(Uuid::from_bytes_be(be))
            }
            n => Err(UuidParseError::InvalidLength(n)),
        }
    }
}
