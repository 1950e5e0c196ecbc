//! Boundary with the vendor BLE stack
//!
//! The stack owns the controller, the GAP/GATT engines and the radio. This
//! crate talks to it through [`BleStack`] (outbound requests, all
//! non-blocking) and receives its completions and peer requests as
//! [`GapEvent`] / [`GattsEvent`] values from the stack's event context.

use crate::gap::{AdvParams, AdvertisingData, BdAddr, ConnUpdateRequest};
use crate::gatt::{AttrValue, AttributeEntry, ConnId, GattIf, GattStatus};
use thiserror::Error;

/// A request the stack refused
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{request} failed with error code 0x{code:x}")]
pub struct StackError {
    /// Name of the refused request
    pub request: &'static str,
    /// Vendor error code
    pub code: i32,
}

impl StackError {
    pub fn new(request: &'static str, code: i32) -> Self {
        Self { request, code }
    }
}

pub type StackResult<T> = Result<T, StackError>;

/// Outbound requests into the vendor stack.
///
/// Completion of a request is reported later through an event; none of
/// these calls wait for the peer. Implementations must not deliver events
/// to the service from inside a request: the service holds its state lock
/// while issuing requests.
pub trait BleStack {
    /// Releases classic-BT memory, initialises and enables the controller in
    /// BLE-only mode.
    fn enable_controller(&self) -> StackResult<()>;
    /// Initialises and enables the host stack.
    fn enable_host(&self) -> StackResult<()>;
    /// Routes GATT server and GAP callbacks to this crate.
    fn register_callbacks(&self) -> StackResult<()>;
    fn register_app(&self, app_id: u16) -> StackResult<()>;
    fn set_local_mtu(&self, mtu: u16) -> StackResult<()>;
    /// Public address of the local controller, if known.
    fn local_address(&self) -> Option<BdAddr>;

    fn set_device_name(&self, name: &str) -> StackResult<()>;
    fn config_adv_data(&self, data: &AdvertisingData) -> StackResult<()>;
    fn start_advertising(&self, params: &AdvParams) -> StackResult<()>;
    fn stop_advertising(&self) -> StackResult<()>;
    fn update_conn_params(&self, request: &ConnUpdateRequest) -> StackResult<()>;

    fn create_attr_table(
        &self,
        gatts_if: GattIf,
        table: &[AttributeEntry],
        svc_inst_id: u8,
    ) -> StackResult<()>;
    fn start_service(&self, service_handle: u16) -> StackResult<()>;
    fn send_response(
        &self,
        gatts_if: GattIf,
        conn_id: ConnId,
        trans_id: u32,
        status: GattStatus,
        value: Option<&AttrValue>,
    ) -> StackResult<()>;
    /// Sends a handle-value indication (`need_confirm`) or notification.
    fn send_indicate(
        &self,
        gatts_if: GattIf,
        conn_id: ConnId,
        attr_handle: u16,
        value: &[u8],
        need_confirm: bool,
    ) -> StackResult<()>;
}

/// GAP callback events
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GapEvent {
    AdvDataSetComplete {
        status: GattStatus,
    },
    ScanRspDataSetComplete {
        status: GattStatus,
    },
    AdvStartComplete {
        status: GattStatus,
    },
    AdvStopComplete {
        status: GattStatus,
    },
    ConnParamsUpdated {
        status: GattStatus,
        min_int: u16,
        max_int: u16,
        conn_int: u16,
        latency: u16,
        timeout: u16,
    },
    /// Event code this crate does not handle
    Other(u32),
}

/// Write request from the peer, plain or prepared
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteRequest {
    pub conn_id: ConnId,
    pub trans_id: u32,
    pub handle: u16,
    pub offset: u16,
    pub value: Vec<u8>,
    pub need_rsp: bool,
    pub is_prep: bool,
}

/// GATT server callback events
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GattsEvent {
    Register {
        status: GattStatus,
        app_id: u16,
    },
    Read {
        conn_id: ConnId,
        trans_id: u32,
        handle: u16,
        offset: u16,
    },
    Write(WriteRequest),
    ExecWrite {
        conn_id: ConnId,
        trans_id: u32,
        commit: bool,
    },
    Mtu {
        conn_id: ConnId,
        mtu: u16,
    },
    Confirm {
        status: GattStatus,
        handle: u16,
    },
    ServiceStarted {
        status: GattStatus,
        service_handle: u16,
    },
    Connect {
        conn_id: ConnId,
        remote_bda: BdAddr,
    },
    Disconnect {
        conn_id: ConnId,
        remote_bda: BdAddr,
        reason: u16,
    },
    AttrTableCreated {
        status: GattStatus,
        handles: Vec<u16>,
    },
    /// Event code this crate does not handle
    Other(u32),
}
