//! stpble - A single-profile BLE GATT peripheral
//!
//! This library serves one GATT service with three characteristics over a
//! vendor BLE stack. It registers the profile, creates the attribute table,
//! advertises until a central connects, reassembles prepared (long) writes
//! and periodically indicates a counter to the connected central.
//!
//! The vendor stack is reached through the [`BleStack`] trait; its callbacks
//! are fed back into [`BleService`] as [`GapEvent`] and [`GattsEvent`] values.

pub mod error;
pub mod gap;
pub mod gatt;
pub mod profile;
pub mod service;
pub mod stack;
pub mod uuid;

// Re-export common types for convenience
pub use error::{Error, SetupStep};
pub use gap::{AdvParams, AdvertisingData, BdAddr, ConnParams, ConnUpdateRequest, LinkState};
pub use gatt::{
    AttrValue, AttributeEntry, AttributeIndex, ClientConfig, ConnId, GattIf, GattStatus,
    HandleTable,
};
pub use profile::{Notifier, ProfileDescriptor};
pub use service::{BleService, ServiceConfig};
pub use stack::{BleStack, GapEvent, GattsEvent, StackError, StackResult, WriteRequest};
pub use uuid::Uuid;
