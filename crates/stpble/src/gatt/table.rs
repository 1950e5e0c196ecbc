//! Attribute table of the profile
//!
//! The table is handed to the stack in one call. Its order fixes the runtime
//! handles the stack assigns, so `AttributeIndex` doubles as the index into
//! the `HandleTable` returned after creation.

use super::constants::*;
use super::types::{AttPermissions, CharacteristicProperty, ResponseMode};
use crate::uuid::Uuid;

/// Logical position of each attribute in the table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(usize)]
pub enum AttributeIndex {
    Service = 0,
    CharA,
    CharAValue,
    CharAConfig,
    CharB,
    CharBValue,
    CharC,
    CharCValue,
}

/// Number of entries in the attribute table.
pub const ATTRIBUTE_COUNT: usize = 8;

impl AttributeIndex {
    pub const ALL: [AttributeIndex; ATTRIBUTE_COUNT] = [
        AttributeIndex::Service,
        AttributeIndex::CharA,
        AttributeIndex::CharAValue,
        AttributeIndex::CharAConfig,
        AttributeIndex::CharB,
        AttributeIndex::CharBValue,
        AttributeIndex::CharC,
        AttributeIndex::CharCValue,
    ];

    pub const fn as_usize(self) -> usize {
        self as usize
    }
}

/// One attribute as the stack expects it for table creation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeEntry {
    pub uuid: Uuid,
    pub permissions: AttPermissions,
    pub max_len: u16,
    pub value: Vec<u8>,
    pub response: ResponseMode,
}

impl AttributeEntry {
    fn auto(uuid: Uuid, permissions: AttPermissions, max_len: u16, value: Vec<u8>) -> Self {
        Self {
            uuid,
            permissions,
            max_len,
            value,
            response: ResponseMode::Auto,
        }
    }

    fn declaration(properties: CharacteristicProperty) -> Self {
        Self::auto(
            Uuid::from_u16(CHARACTERISTIC_UUID),
            AttPermissions::read_only(),
            CHAR_DECLARATION_SIZE,
            vec![properties.bits()],
        )
    }

    fn value(uuid: u16) -> Self {
        Self::auto(
            Uuid::from_u16(uuid),
            AttPermissions::read_write(),
            CHAR_VAL_LEN_MAX,
            CHAR_INITIAL_VALUE.to_vec(),
        )
    }

    /// Current length of the initial value
    pub fn len(&self) -> u16 {
        self.value.len() as u16
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }
}

const CHAR_INITIAL_VALUE: [u8; 4] = [0x11, 0x22, 0x33, 0x44];

/// Builds the full table in declaration order.
pub fn attribute_table() -> [AttributeEntry; ATTRIBUTE_COUNT] {
    [
        AttributeEntry::auto(
            Uuid::from_u16(PRIMARY_SERVICE_UUID),
            AttPermissions::read_only(),
            2,
            SERVICE_UUID.to_le_bytes().to_vec(),
        ),
        AttributeEntry::declaration(
            CharacteristicProperty::WRITE | CharacteristicProperty::READ | CharacteristicProperty::NOTIFY,
        ),
        AttributeEntry::value(CHAR_UUID_A),
        AttributeEntry::auto(
            Uuid::from_u16(CLIENT_CHAR_CONFIG_UUID),
            AttPermissions::read_write(),
            2,
            CCCD_DISABLED.to_le_bytes().to_vec(),
        ),
        AttributeEntry::declaration(CharacteristicProperty::READ),
        AttributeEntry::value(CHAR_UUID_B),
        AttributeEntry::declaration(CharacteristicProperty::WRITE),
        AttributeEntry::value(CHAR_UUID_C),
    ]
}

/// Handles assigned by the stack, parallel to the attribute table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HandleTable {
    handles: [u16; ATTRIBUTE_COUNT],
}

impl HandleTable {
    /// Accepts the handles reported by table creation. `None` when the count
    /// differs from `ATTRIBUTE_COUNT`: the table is corrupt.
    pub fn from_created(handles: &[u16]) -> Option<Self> {
        let handles: [u16; ATTRIBUTE_COUNT] = handles.try_into().ok()?;
        Some(Self { handles })
    }

    pub fn handle(&self, index: AttributeIndex) -> u16 {
        self.handles[index.as_usize()]
    }

    pub fn service_handle(&self) -> u16 {
        self.handle(AttributeIndex::Service)
    }

    /// Reverse lookup of a runtime handle
    pub fn index_of(&self, handle: u16) -> Option<AttributeIndex> {
        AttributeIndex::ALL
            .iter()
            .copied()
            .find(|index| self.handle(*index) == handle)
    }
}
