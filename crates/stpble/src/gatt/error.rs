//! GATT status codes and request-level errors
use super::constants::*;
use thiserror::Error;

/// Status carried by stack events and by responses sent to the peer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GattStatus {
    Ok,
    InvalidHandle,
    ReadNotPermitted,
    WriteNotPermitted,
    InvalidPdu,
    InsufficientAuthentication,
    RequestNotSupported,
    InvalidOffset,
    InsufficientAuthorization,
    PrepareQueueFull,
    NotFound,
    NotLong,
    InsufficientKeySize,
    InvalidAttributeLength,
    Unlikely,
    InsufficientEncryption,
    UnsupportedGroupType,
    InsufficientResource,
    /// Local allocation failed
    NoResources,
    InternalError,
    WrongState,
    DatabaseFull,
    Busy,
    Error,
    /// Code not known to this crate
    Unknown(u8),
}

impl GattStatus {
    pub fn is_ok(&self) -> bool {
        *self == GattStatus::Ok
    }
}

impl From<u8> for GattStatus {
    fn from(code: u8) -> Self {
        match code {
            GATT_OK => GattStatus::Ok,
            GATT_INVALID_HANDLE => GattStatus::InvalidHandle,
            GATT_READ_NOT_PERMIT => GattStatus::ReadNotPermitted,
            GATT_WRITE_NOT_PERMIT => GattStatus::WriteNotPermitted,
            GATT_INVALID_PDU => GattStatus::InvalidPdu,
            GATT_INSUF_AUTHENTICATION => GattStatus::InsufficientAuthentication,
            GATT_REQ_NOT_SUPPORTED => GattStatus::RequestNotSupported,
            GATT_INVALID_OFFSET => GattStatus::InvalidOffset,
            GATT_INSUF_AUTHORIZATION => GattStatus::InsufficientAuthorization,
            GATT_PREPARE_Q_FULL => GattStatus::PrepareQueueFull,
            GATT_NOT_FOUND => GattStatus::NotFound,
            GATT_NOT_LONG => GattStatus::NotLong,
            GATT_INSUF_KEY_SIZE => GattStatus::InsufficientKeySize,
            GATT_INVALID_ATTR_LEN => GattStatus::InvalidAttributeLength,
            GATT_ERR_UNLIKELY => GattStatus::Unlikely,
            GATT_INSUF_ENCRYPTION => GattStatus::InsufficientEncryption,
            GATT_UNSUPPORT_GRP_TYPE => GattStatus::UnsupportedGroupType,
            GATT_INSUF_RESOURCE => GattStatus::InsufficientResource,
            GATT_NO_RESOURCES => GattStatus::NoResources,
            GATT_INTERNAL_ERROR => GattStatus::InternalError,
            GATT_WRONG_STATE => GattStatus::WrongState,
            GATT_DB_FULL => GattStatus::DatabaseFull,
            GATT_BUSY => GattStatus::Busy,
            GATT_ERROR => GattStatus::Error,
            other => GattStatus::Unknown(other),
        }
    }
}

impl From<GattStatus> for u8 {
    fn from(status: GattStatus) -> Self {
        match status {
            GattStatus::Ok => GATT_OK,
            GattStatus::InvalidHandle => GATT_INVALID_HANDLE,
            GattStatus::ReadNotPermitted => GATT_READ_NOT_PERMIT,
            GattStatus::WriteNotPermitted => GATT_WRITE_NOT_PERMIT,
            GattStatus::InvalidPdu => GATT_INVALID_PDU,
            GattStatus::InsufficientAuthentication => GATT_INSUF_AUTHENTICATION,
            GattStatus::RequestNotSupported => GATT_REQ_NOT_SUPPORTED,
            GattStatus::InvalidOffset => GATT_INVALID_OFFSET,
            GattStatus::InsufficientAuthorization => GATT_INSUF_AUTHORIZATION,
            GattStatus::PrepareQueueFull => GATT_PREPARE_Q_FULL,
            GattStatus::NotFound => GATT_NOT_FOUND,
            GattStatus::NotLong => GATT_NOT_LONG,
            GattStatus::InsufficientKeySize => GATT_INSUF_KEY_SIZE,
            GattStatus::InvalidAttributeLength => GATT_INVALID_ATTR_LEN,
            GattStatus::Unlikely => GATT_ERR_UNLIKELY,
            GattStatus::InsufficientEncryption => GATT_INSUF_ENCRYPTION,
            GattStatus::UnsupportedGroupType => GATT_UNSUPPORT_GRP_TYPE,
            GattStatus::InsufficientResource => GATT_INSUF_RESOURCE,
            GattStatus::NoResources => GATT_NO_RESOURCES,
            GattStatus::InternalError => GATT_INTERNAL_ERROR,
            GattStatus::WrongState => GATT_WRONG_STATE,
            GattStatus::DatabaseFull => GATT_DB_FULL,
            GattStatus::Busy => GATT_BUSY,
            GattStatus::Error => GATT_ERROR,
            GattStatus::Unknown(code) => code,
        }
    }
}

/// Rejection of a prepared-write chunk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PrepareError {
    #[error("prepare write offset {offset} beyond buffer capacity {capacity}")]
    InvalidOffset { offset: usize, capacity: usize },

    #[error("prepare write of {len} bytes at offset {offset} overruns buffer capacity {capacity}")]
    InvalidLength {
        offset: usize,
        len: usize,
        capacity: usize,
    },

    #[error("no memory for prepare write buffer")]
    NoResources,
}

impl PrepareError {
    /// Status reported to the peer for this rejection
    pub fn to_status(&self) -> GattStatus {
        match self {
            PrepareError::InvalidOffset { .. } => GattStatus::InvalidOffset,
            PrepareError::InvalidLength { .. } => GattStatus::InvalidAttributeLength,
            PrepareError::NoResources => GattStatus::NoResources,
        }
    }
}

impl From<PrepareError> for GattStatus {
    fn from(err: PrepareError) -> Self {
        err.to_status()
    }
}
