//! In-process stand-in for the vendor stack
//!
//! Every request succeeds and queues the completion event a controller
//! would report. Events are delivered through a channel so they reach the
//! service from the pump loop, never from inside a request.

use log::{debug, info};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Mutex;
use stpble::gap::{AdvParams, AdvertisingData, BdAddr, ConnUpdateRequest};
use stpble::gatt::{AttrValue, AttributeEntry, ConnId, GattIf, GattStatus};
use stpble::{BleStack, GapEvent, GattsEvent, StackError, StackResult};

/// First handle the loopback assigns to a created table
const FIRST_HANDLE: u16 = 0x0028;
const TX_POWER: i8 = 9;

#[derive(Debug)]
pub enum StackEvent {
    Gap(GapEvent),
    Gatts(GattIf, GattsEvent),
}

pub struct LoopbackStack {
    address: BdAddr,
    gatts_if: GattIf,
    events: Mutex<Sender<StackEvent>>,
    device_name: Mutex<String>,
}

impl LoopbackStack {
    pub fn new(address: BdAddr, gatts_if: GattIf) -> (Self, Receiver<StackEvent>) {
        let (tx, rx) = mpsc::channel();
        let stack = Self {
            address,
            gatts_if,
            events: Mutex::new(tx),
            device_name: Mutex::new(String::new()),
        };
        (stack, rx)
    }

    /// Queues an event as if the controller had reported it
    pub fn inject(&self, event: StackEvent) -> StackResult<()> {
        self.deliver("inject", event)
    }

    pub fn gatts_if(&self) -> GattIf {
        self.gatts_if
    }

    fn deliver(&self, request: &'static str, event: StackEvent) -> StackResult<()> {
        let events = self
            .events
            .lock()
            .map_err(|_| StackError::new(request, -1))?;
        events
            .send(event)
            .map_err(|_| StackError::new(request, -1))
    }

    fn gatts(&self, request: &'static str, event: GattsEvent) -> StackResult<()> {
        self.deliver(request, StackEvent::Gatts(self.gatts_if, event))
    }
}

impl BleStack for LoopbackStack {
    fn enable_controller(&self) -> StackResult<()> {
        debug!("controller enabled in BLE mode");
        Ok(())
    }

    fn enable_host(&self) -> StackResult<()> {
        debug!("host enabled");
        Ok(())
    }

    fn register_callbacks(&self) -> StackResult<()> {
        Ok(())
    }

    fn register_app(&self, app_id: u16) -> StackResult<()> {
        self.gatts(
            "register_app",
            GattsEvent::Register {
                status: GattStatus::Ok,
                app_id,
            },
        )
    }

    fn set_local_mtu(&self, mtu: u16) -> StackResult<()> {
        debug!("local MTU {}", mtu);
        Ok(())
    }

    fn local_address(&self) -> Option<BdAddr> {
        Some(self.address)
    }

    fn set_device_name(&self, name: &str) -> StackResult<()> {
        let mut device_name = self
            .device_name
            .lock()
            .map_err(|_| StackError::new("set_device_name", -1))?;
        *device_name = name.to_string();
        Ok(())
    }

    fn config_adv_data(&self, data: &AdvertisingData) -> StackResult<()> {
        let name = self
            .device_name
            .lock()
            .map(|name| name.clone())
            .unwrap_or_default();
        let payload = data.encode(&name, TX_POWER);
        let (kind, event) = if data.set_scan_rsp {
            (
                "scan response",
                GapEvent::ScanRspDataSetComplete {
                    status: GattStatus::Ok,
                },
            )
        } else {
            (
                "advertising data",
                GapEvent::AdvDataSetComplete {
                    status: GattStatus::Ok,
                },
            )
        };
        info!("{} ({} bytes): {}", kind, payload.len(), hex::encode(&payload));
        self.deliver("config_adv_data", StackEvent::Gap(event))
    }

    fn start_advertising(&self, params: &AdvParams) -> StackResult<()> {
        debug!(
            "advertising interval 0x{:x}..0x{:x}",
            params.interval_min, params.interval_max
        );
        self.deliver(
            "start_advertising",
            StackEvent::Gap(GapEvent::AdvStartComplete {
                status: GattStatus::Ok,
            }),
        )
    }

    fn stop_advertising(&self) -> StackResult<()> {
        self.deliver(
            "stop_advertising",
            StackEvent::Gap(GapEvent::AdvStopComplete {
                status: GattStatus::Ok,
            }),
        )
    }

    fn update_conn_params(&self, request: &ConnUpdateRequest) -> StackResult<()> {
        let params = request.params;
        self.deliver(
            "update_conn_params",
            StackEvent::Gap(GapEvent::ConnParamsUpdated {
                status: GattStatus::Ok,
                min_int: params.min_interval,
                max_int: params.max_interval,
                conn_int: params.max_interval,
                latency: params.latency,
                timeout: params.timeout,
            }),
        )
    }

    fn create_attr_table(
        &self,
        gatts_if: GattIf,
        table: &[AttributeEntry],
        svc_inst_id: u8,
    ) -> StackResult<()> {
        debug!("creating {} attributes, instance {}", table.len(), svc_inst_id);
        let handles = (FIRST_HANDLE..).take(table.len()).collect();
        self.deliver(
            "create_attr_table",
            StackEvent::Gatts(
                gatts_if,
                GattsEvent::AttrTableCreated {
                    status: GattStatus::Ok,
                    handles,
                },
            ),
        )
    }

    fn start_service(&self, service_handle: u16) -> StackResult<()> {
        self.gatts(
            "start_service",
            GattsEvent::ServiceStarted {
                status: GattStatus::Ok,
                service_handle,
            },
        )
    }

    fn send_response(
        &self,
        _gatts_if: GattIf,
        conn_id: ConnId,
        trans_id: u32,
        status: GattStatus,
        value: Option<&AttrValue>,
    ) -> StackResult<()> {
        debug!(
            "response to conn {} trans {}: {:?}{}",
            conn_id,
            trans_id,
            status,
            value
                .map(|v| format!(", {}", hex::encode(&v.value)))
                .unwrap_or_default()
        );
        Ok(())
    }

    fn send_indicate(
        &self,
        _gatts_if: GattIf,
        conn_id: ConnId,
        attr_handle: u16,
        value: &[u8],
        need_confirm: bool,
    ) -> StackResult<()> {
        debug!(
            "indicate conn {} handle {}: {}..",
            conn_id,
            attr_handle,
            hex::encode(&value[..value.len().min(4)])
        );
        if need_confirm {
            self.gatts(
                "send_indicate",
                GattsEvent::Confirm {
                    status: GattStatus::Ok,
                    handle: attr_handle,
                },
            )?;
        }
        Ok(())
    }
}
