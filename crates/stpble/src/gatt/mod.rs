//! GATT profile definition
//!
//! The attribute table the peripheral serves, the status codes exchanged
//! with the stack, and the prepared-write reassembler.

pub mod constants;
pub mod error;
pub mod prepare;
pub mod table;
pub mod types;


pub use constants::*;
pub use error::{GattStatus, PrepareError};
pub use prepare::PrepareWriteBuffer;
pub use table::{attribute_table, AttributeEntry, AttributeIndex, HandleTable, ATTRIBUTE_COUNT};
pub use types::{
    AttPermissions, AttrValue, CharacteristicProperty, ClientConfig, ConnId, GattIf, ResponseMode,
    INVALID_CONN_ID,
};
