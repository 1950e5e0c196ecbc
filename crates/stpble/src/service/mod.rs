//! GATT peripheral service
//!
//! [`BleService`] owns all state of the peripheral and reacts to the events
//! the stack delivers. The stack's callback context and the timer that calls
//! [`BleService::notify`] may run on different threads, so the state sits
//! behind one mutex.

use crate::error::{Error, SetupStep};
use crate::gap::{
    AdvConfigPending, AdvParams, AdvertisingController, AdvertisingData, BdAddr, ConnParams,
    ConnUpdateRequest, LinkState, DEVICE_NAME_PREFIX,
};
use crate::gatt::{
    attribute_table, AttrValue, AttributeIndex, ClientConfig, ConnId, GattIf, GattStatus,
    HandleTable, PrepareWriteBuffer, APP_ID, ATTRIBUTE_COUNT, INVALID_CONN_ID, LOCAL_MTU,
    SVC_INST_ID,
};
use crate::profile::{Notifier, ProfileDescriptor};
use crate::stack::{BleStack, GapEvent, GattsEvent, WriteRequest};
use log::{debug, error, info, warn};
use std::sync::{Mutex, MutexGuard, PoisonError};

#[cfg(test)]
mod tests;

/// Configuration of the peripheral
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Application id used when registering with the stack
    pub app_id: u16,
    /// Local MTU offered to centrals
    pub local_mtu: u16,
    /// Prepended to the hex address to form the device name
    pub name_prefix: String,
    pub adv_params: AdvParams,
    pub adv_data: AdvertisingData,
    pub scan_rsp_data: AdvertisingData,
    /// Parameters requested right after a central connects
    pub conn_params: ConnParams,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            app_id: APP_ID,
            local_mtu: LOCAL_MTU,
            name_prefix: DEVICE_NAME_PREFIX.to_string(),
            adv_params: AdvParams::default(),
            adv_data: AdvertisingData::primary(),
            scan_rsp_data: AdvertisingData::scan_response(),
            conn_params: ConnParams::default(),
        }
    }
}

#[derive(Debug, Default)]
struct ServiceState {
    setup_done: bool,
    profile: ProfileDescriptor,
    handles: Option<HandleTable>,
    service_started: bool,
    advertising: AdvertisingController,
    prepare: PrepareWriteBuffer,
    notifier: Notifier,
    mtu: Option<u16>,
}

/// The GATT peripheral bound to a stack
pub struct BleService<S: BleStack> {
    stack: S,
    config: ServiceConfig,
    state: Mutex<ServiceState>,
}

impl<S: BleStack> BleService<S> {
    pub fn new(stack: S, config: ServiceConfig) -> Self {
        Self {
            stack,
            config,
            state: Mutex::new(ServiceState::default()),
        }
    }

    pub fn with_defaults(stack: S) -> Self {
        Self::new(stack, ServiceConfig::default())
    }

    /// Starts the notifier counter at `count` instead of zero.
    pub fn with_notify_count(self, count: u32) -> Self {
        self.lock_state().notifier = Notifier::starting_at(count);
        self
    }

    pub fn stack(&self) -> &S {
        &self.stack
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    fn lock_state(&self) -> MutexGuard<'_, ServiceState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Brings up the stack and registers the profile. Calling it again after
    /// a successful run does nothing.
    pub fn setup(&self) -> Result<(), Error> {
        let mut state = self.lock_state();
        if state.setup_done {
            debug!("setup already done");
            return Ok(());
        }

        self.stack
            .enable_controller()
            .map_err(Error::setup(SetupStep::EnableController))?;
        self.stack
            .enable_host()
            .map_err(Error::setup(SetupStep::EnableHost))?;
        self.stack
            .register_callbacks()
            .map_err(Error::setup(SetupStep::RegisterCallbacks))?;

        state.advertising.registering();
        self.stack
            .register_app(self.config.app_id)
            .map_err(Error::setup(SetupStep::RegisterApp))?;
        self.stack
            .set_local_mtu(self.config.local_mtu)
            .map_err(Error::setup(SetupStep::SetLocalMtu))?;

        state.setup_done = true;
        info!("BLE stack initialised, app 0x{:04x} registering", self.config.app_id);
        Ok(())
    }

    /// Like [`setup`](Self::setup) but aborts the process on failure: there
    /// is no useful degraded mode without the stack.
    pub fn setup_or_abort(&self) {
        if let Err(e) = self.setup() {
            error!("{}", e);
            std::process::abort();
        }
    }

    /// GAP callback entry point
    pub fn handle_gap_event(&self, event: GapEvent) {
        let mut state = self.lock_state();
        match event {
            GapEvent::AdvDataSetComplete { status } => {
                if !status.is_ok() {
                    warn!("advertising data set completed with status {:?}", status);
                }
                self.payload_configured(&mut state, AdvConfigPending::ADV);
            }
            GapEvent::ScanRspDataSetComplete { status } => {
                if !status.is_ok() {
                    warn!("scan response data set completed with status {:?}", status);
                }
                self.payload_configured(&mut state, AdvConfigPending::SCAN_RSP);
            }
            GapEvent::AdvStartComplete { status } => {
                if status.is_ok() {
                    info!("advertising started");
                } else {
                    error!("advertising start failed: {:?}", status);
                    state.advertising.advertising_stopped();
                }
            }
            GapEvent::AdvStopComplete { status } => {
                if status.is_ok() {
                    info!("advertising stopped");
                    state.advertising.advertising_stopped();
                } else {
                    error!("advertising stop failed: {:?}", status);
                }
            }
            GapEvent::ConnParamsUpdated {
                status,
                min_int,
                max_int,
                conn_int,
                latency,
                timeout,
            } => {
                info!(
                    "update connection params status = {:?}, min_int = {}, max_int = {}, conn_int = {}, latency = {}, timeout = {}",
                    status, min_int, max_int, conn_int, latency, timeout
                );
            }
            GapEvent::Other(code) => {
                info!("gap handler: unknown event {}", code);
            }
        }
    }

    /// GATT server callback entry point.
    ///
    /// A successful registration binds the profile to `gatts_if`. Any other
    /// event reaches the profile when it is not bound to an interface or is
    /// bound to the profile's.
    pub fn handle_gatts_event(&self, gatts_if: GattIf, event: GattsEvent) {
        let mut state = self.lock_state();

        if let GattsEvent::Register { status, app_id } = &event {
            if status.is_ok() {
                state.profile.registered(gatts_if);
            } else {
                error!("reg app failed, app_id {:04x}, status {:?}", app_id, status);
                return;
            }
        }

        if state.profile.accepts(gatts_if) {
            self.profile_event(&mut state, gatts_if, event);
        } else {
            debug!("event for foreign interface {} dropped", gatts_if);
        }
    }

    /// Sends the next counter value as an indication on characteristic A.
    /// Does nothing while no central is connected.
    pub fn notify(&self) {
        let mut state = self.lock_state();
        let (Some(gatts_if), Some(conn_id)) = (state.profile.gatts_if(), state.profile.conn_id())
        else {
            return;
        };
        let Some(handles) = state.handles else {
            warn!("connected without an attribute table, indication skipped");
            return;
        };

        let count = state.notifier.advance();
        debug!("sending indication #{}", count);
        if let Err(e) = self.stack.send_indicate(
            gatts_if,
            conn_id,
            handles.handle(AttributeIndex::CharAValue),
            state.notifier.payload(),
            true,
        ) {
            error!("indication #{} not sent: {}", count, e);
        }
    }

    pub fn conn_id(&self) -> Option<ConnId> {
        self.lock_state().profile.conn_id()
    }

    pub fn gatts_if(&self) -> Option<GattIf> {
        self.lock_state().profile.gatts_if()
    }

    pub fn client_config(&self) -> ClientConfig {
        self.lock_state().profile.client_config()
    }

    pub fn handle_table(&self) -> Option<HandleTable> {
        self.lock_state().handles
    }

    pub fn is_service_started(&self) -> bool {
        self.lock_state().service_started
    }

    pub fn link_state(&self) -> LinkState {
        self.lock_state().advertising.state()
    }

    pub fn notify_count(&self) -> u32 {
        self.lock_state().notifier.count()
    }

    pub fn mtu(&self) -> Option<u16> {
        self.lock_state().mtu
    }

    fn payload_configured(&self, state: &mut ServiceState, payload: AdvConfigPending) {
        if state.advertising.payload_configured(payload) {
            self.start_advertising(state);
        }
    }

    /// Requests advertising; the link state falls back to idle when the
    /// stack refuses.
    fn start_advertising(&self, state: &mut ServiceState) {
        if let Err(e) = self.stack.start_advertising(&self.config.adv_params) {
            error!("{}", e);
            state.advertising.advertising_stopped();
        }
    }

    fn profile_event(&self, state: &mut ServiceState, gatts_if: GattIf, event: GattsEvent) {
        match event {
            GattsEvent::Register { .. } => self.on_register(state, gatts_if),
            GattsEvent::Read {
                conn_id,
                handle,
                offset,
                ..
            } => {
                info!("read, conn_id {}, handle {}, offset {}", conn_id, handle, offset);
            }
            GattsEvent::Write(request) if request.is_prep => {
                self.on_prepare_write(state, gatts_if, request)
            }
            GattsEvent::Write(request) => self.on_write(state, gatts_if, request),
            GattsEvent::ExecWrite {
                conn_id,
                trans_id,
                commit,
            } => {
                match state.prepare.finish(commit) {
                    Some(data) => info!(
                        "prepared write committed, {} bytes: {}",
                        data.len(),
                        hex::encode(&data)
                    ),
                    None => info!("prepared write cancelled"),
                }
                self.respond(gatts_if, conn_id, trans_id, GattStatus::Ok, None);
            }
            GattsEvent::Mtu { conn_id, mtu } => {
                info!("MTU exchanged on conn_id {}: {}", conn_id, mtu);
                state.mtu = Some(mtu);
            }
            GattsEvent::Confirm { status, handle } => {
                info!("confirm, status {:?}, attr_handle {}", status, handle);
            }
            GattsEvent::ServiceStarted {
                status,
                service_handle,
            } => {
                if status.is_ok() {
                    info!("service started, service_handle {}", service_handle);
                    state.service_started = true;
                } else {
                    error!("service start failed, status {:?}, service_handle {}", status, service_handle);
                }
            }
            GattsEvent::Connect {
                conn_id,
                remote_bda,
            } => self.on_connect(state, conn_id, remote_bda),
            GattsEvent::Disconnect {
                conn_id, reason, ..
            } => {
                if state.profile.conn_id() != Some(conn_id) {
                    warn!(
                        "disconnect for conn_id {} while holding {:?}, ignored",
                        conn_id,
                        state.profile.conn_id()
                    );
                    return;
                }
                info!("disconnected, conn_id {}, reason 0x{:x}", conn_id, reason);
                state.profile.disconnect();
                if state.prepare.is_active() {
                    state.prepare.finish(false);
                    warn!("dropped unfinished prepared write");
                }
                state.advertising.disconnected();
                self.start_advertising(state);
            }
            GattsEvent::AttrTableCreated { status, handles } => {
                self.on_table_created(state, status, &handles)
            }
            GattsEvent::Other(code) => {
                info!("profile handler: unknown event {}", code);
            }
        }
    }

    fn on_register(&self, state: &mut ServiceState, gatts_if: GattIf) {
        match self.stack.local_address() {
            Some(addr) => {
                let name = addr.name_with_prefix(&self.config.name_prefix);
                info!("device name: {}", name);
                if let Err(e) = self.stack.set_device_name(&name) {
                    error!("{}", e);
                }
            }
            None => error!("local address unavailable, device name not set"),
        }

        state.advertising.begin_configuration();
        if let Err(e) = self.stack.config_adv_data(&self.config.adv_data) {
            error!("config adv data: {}", e);
        }
        if let Err(e) = self.stack.config_adv_data(&self.config.scan_rsp_data) {
            error!("config scan response data: {}", e);
        }

        if let Err(e) = self
            .stack
            .create_attr_table(gatts_if, &attribute_table(), SVC_INST_ID)
        {
            error!("{}", e);
        }
    }

    fn on_write(&self, state: &mut ServiceState, gatts_if: GattIf, request: WriteRequest) {
        info!(
            "write, handle {}, value len {}: {}",
            request.handle,
            request.value.len(),
            hex::encode(&request.value)
        );

        let is_cccd = state
            .handles
            .and_then(|handles| handles.index_of(request.handle))
            == Some(AttributeIndex::CharAConfig);
        if is_cccd && request.value.len() == 2 {
            match ClientConfig::from_cccd(&request.value) {
                Some(config) => {
                    info!("client configuration: {:?}", config);
                    state.profile.set_client_config(config);
                }
                None => error!("unexpected descriptor value {}", hex::encode(&request.value)),
            }
        }

        if request.need_rsp {
            self.respond(
                gatts_if,
                request.conn_id,
                request.trans_id,
                GattStatus::Ok,
                None,
            );
        }
    }

    fn on_prepare_write(&self, state: &mut ServiceState, gatts_if: GattIf, request: WriteRequest) {
        info!(
            "prepare write, handle {}, offset {}, value len {}",
            request.handle,
            request.offset,
            request.value.len()
        );

        let status = match state
            .prepare
            .begin_or_continue(request.offset as usize, &request.value)
        {
            Ok(()) => GattStatus::Ok,
            Err(e) => {
                warn!("{}", e);
                e.to_status()
            }
        };

        if request.need_rsp {
            let echo = AttrValue {
                handle: request.handle,
                offset: request.offset,
                value: request.value,
            };
            self.respond(gatts_if, request.conn_id, request.trans_id, status, Some(&echo));
        }
    }

    fn on_connect(&self, state: &mut ServiceState, conn_id: ConnId, peer: BdAddr) {
        if !state.profile.connect(conn_id, peer) {
            error!("connect reported with invalid conn_id 0x{:04x}, ignored", INVALID_CONN_ID);
            return;
        }
        info!("connected, conn_id {}, peer {}", conn_id, peer);
        state.advertising.connected();

        let request = ConnUpdateRequest {
            peer,
            params: self.config.conn_params,
        };
        if let Err(e) = self.stack.update_conn_params(&request) {
            error!("{}", e);
        }
    }

    fn on_table_created(&self, state: &mut ServiceState, status: GattStatus, handles: &[u16]) {
        if !status.is_ok() {
            error!("create attribute table failed, status {:?}", status);
            return;
        }
        let Some(table) = HandleTable::from_created(handles) else {
            error!(
                "create attribute table abnormally, num_handle ({}) doesn't equal to {}",
                handles.len(),
                ATTRIBUTE_COUNT
            );
            return;
        };

        info!("attribute table created, {} handles", handles.len());
        state.handles = Some(table);
        if let Err(e) = self.stack.start_service(table.service_handle()) {
            error!("{}", e);
        }
    }

    fn respond(
        &self,
        gatts_if: GattIf,
        conn_id: ConnId,
        trans_id: u32,
        status: GattStatus,
        value: Option<&AttrValue>,
    ) {
        if let Err(e) = self
            .stack
            .send_response(gatts_if, conn_id, trans_id, status, value)
        {
            error!("send response error: {}", e);
        }
    }
}
