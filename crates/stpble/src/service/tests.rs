//! Tests for the event dispatcher against a recording stack

use super::*;
use crate::gatt::{CCCD_INDICATE, GATT_OK};
use crate::stack::{StackError, StackResult};
use std::sync::{Arc, Mutex};
use std::thread;

const IF: GattIf = GattIf(3);
const HANDLES: [u16; ATTRIBUTE_COUNT] = [40, 41, 42, 43, 44, 45, 46, 47];
const PEER: BdAddr = BdAddr::new([0xfe, 0x1c, 0x0b, 0x60, 0xa1, 0x24]);

#[derive(Debug, Clone, PartialEq, Eq)]
enum Request {
    EnableController,
    EnableHost,
    RegisterCallbacks,
    RegisterApp(u16),
    SetLocalMtu(u16),
    SetDeviceName(String),
    ConfigAdvData { scan_rsp: bool },
    StartAdvertising,
    StopAdvertising,
    UpdateConnParams(ConnUpdateRequest),
    CreateAttrTable { gatts_if: GattIf, entries: usize },
    StartService(u16),
    Response {
        trans_id: u32,
        status: GattStatus,
        value: Option<AttrValue>,
    },
    Indicate {
        conn_id: ConnId,
        handle: u16,
        value: Vec<u8>,
        need_confirm: bool,
    },
}

#[derive(Default)]
struct RecordingStack {
    requests: Mutex<Vec<Request>>,
    address: Option<BdAddr>,
    fail_on: Option<&'static str>,
}

impl RecordingStack {
    fn new() -> Self {
        Self {
            address: Some(BdAddr::new([0x24, 0xa1, 0x60, 0x0b, 0x1c, 0xfe])),
            ..Default::default()
        }
    }

    fn failing(request: &'static str) -> Self {
        Self {
            fail_on: Some(request),
            ..Self::new()
        }
    }

    fn record(&self, name: &'static str, request: Request) -> StackResult<()> {
        self.requests.lock().unwrap().push(request);
        match self.fail_on {
            Some(failing) if failing == name => Err(StackError::new(name, 0x103)),
            _ => Ok(()),
        }
    }

    fn take(&self) -> Vec<Request> {
        std::mem::take(&mut *self.requests.lock().unwrap())
    }

    fn count(&self, pred: impl Fn(&Request) -> bool) -> usize {
        self.requests.lock().unwrap().iter().filter(|r| pred(r)).count()
    }
}

impl BleStack for RecordingStack {
    fn enable_controller(&self) -> StackResult<()> {
        self.record("enable_controller", Request::EnableController)
    }

    fn enable_host(&self) -> StackResult<()> {
        self.record("enable_host", Request::EnableHost)
    }

    fn register_callbacks(&self) -> StackResult<()> {
        self.record("register_callbacks", Request::RegisterCallbacks)
    }

    fn register_app(&self, app_id: u16) -> StackResult<()> {
        self.record("register_app", Request::RegisterApp(app_id))
    }

    fn set_local_mtu(&self, mtu: u16) -> StackResult<()> {
        self.record("set_local_mtu", Request::SetLocalMtu(mtu))
    }

    fn local_address(&self) -> Option<BdAddr> {
        self.address
    }

    fn set_device_name(&self, name: &str) -> StackResult<()> {
        self.record("set_device_name", Request::SetDeviceName(name.to_string()))
    }

    fn config_adv_data(&self, data: &AdvertisingData) -> StackResult<()> {
        self.record(
            "config_adv_data",
            Request::ConfigAdvData {
                scan_rsp: data.set_scan_rsp,
            },
        )
    }

    fn start_advertising(&self, _params: &AdvParams) -> StackResult<()> {
        self.record("start_advertising", Request::StartAdvertising)
    }

    fn stop_advertising(&self) -> StackResult<()> {
        self.record("stop_advertising", Request::StopAdvertising)
    }

    fn update_conn_params(&self, request: &ConnUpdateRequest) -> StackResult<()> {
        self.record("update_conn_params", Request::UpdateConnParams(*request))
    }

    fn create_attr_table(
        &self,
        gatts_if: GattIf,
        table: &[crate::gatt::AttributeEntry],
        _svc_inst_id: u8,
    ) -> StackResult<()> {
        self.record(
            "create_attr_table",
            Request::CreateAttrTable {
                gatts_if,
                entries: table.len(),
            },
        )
    }

    fn start_service(&self, service_handle: u16) -> StackResult<()> {
        self.record("start_service", Request::StartService(service_handle))
    }

    fn send_response(
        &self,
        _gatts_if: GattIf,
        _conn_id: ConnId,
        trans_id: u32,
        status: GattStatus,
        value: Option<&AttrValue>,
    ) -> StackResult<()> {
        self.record(
            "send_response",
            Request::Response {
                trans_id,
                status,
                value: value.cloned(),
            },
        )
    }

    fn send_indicate(
        &self,
        _gatts_if: GattIf,
        conn_id: ConnId,
        attr_handle: u16,
        value: &[u8],
        need_confirm: bool,
    ) -> StackResult<()> {
        self.record(
            "send_indicate",
            Request::Indicate {
                conn_id,
                handle: attr_handle,
                value: value.to_vec(),
                need_confirm,
            },
        )
    }
}

fn ok() -> GattStatus {
    GattStatus::from(GATT_OK)
}

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// A service that has gone through setup, registration and table creation
fn registered_service() -> BleService<RecordingStack> {
    registered_service_on(RecordingStack::new())
}

fn registered_service_on(stack: RecordingStack) -> BleService<RecordingStack> {
    init_logger();
    let service = BleService::with_defaults(stack);
    service.setup().unwrap();
    service.handle_gatts_event(
        IF,
        GattsEvent::Register {
            status: ok(),
            app_id: APP_ID,
        },
    );
    service.handle_gatts_event(
        IF,
        GattsEvent::AttrTableCreated {
            status: ok(),
            handles: HANDLES.to_vec(),
        },
    );
    service.handle_gatts_event(
        IF,
        GattsEvent::ServiceStarted {
            status: ok(),
            service_handle: HANDLES[0],
        },
    );
    service
}

fn connected_service() -> BleService<RecordingStack> {
    connected_service_on(RecordingStack::new())
}

fn connected_service_on(stack: RecordingStack) -> BleService<RecordingStack> {
    let service = registered_service_on(stack);
    service.handle_gatts_event(
        IF,
        GattsEvent::Connect {
            conn_id: 0,
            remote_bda: PEER,
        },
    );
    service.stack().take();
    service
}

fn write(trans_id: u32, handle: u16, offset: u16, value: &[u8], is_prep: bool) -> GattsEvent {
    GattsEvent::Write(WriteRequest {
        conn_id: 0,
        trans_id,
        handle,
        offset,
        value: value.to_vec(),
        need_rsp: true,
        is_prep,
    })
}

#[test]
fn test_setup_runs_steps_in_order() {
    let service = BleService::with_defaults(RecordingStack::new());
    service.setup().unwrap();

    assert_eq!(
        service.stack().take(),
        vec![
            Request::EnableController,
            Request::EnableHost,
            Request::RegisterCallbacks,
            Request::RegisterApp(0x55),
            Request::SetLocalMtu(500),
        ]
    );
    assert_eq!(service.link_state(), LinkState::Registering);
}

#[test]
fn test_setup_is_idempotent() {
    let service = BleService::with_defaults(RecordingStack::new());
    service.setup().unwrap();
    service.stack().take();

    service.setup().unwrap();
    assert!(service.stack().take().is_empty());
}

#[test]
fn test_setup_failure_names_the_step() {
    let service = BleService::with_defaults(RecordingStack::failing("enable_host"));
    let err = service.setup().unwrap_err();

    let Error::Setup { step, source } = &err;
    assert_eq!(*step, SetupStep::EnableHost);
    assert_eq!(source.code, 0x103);
    assert_eq!(
        err.to_string(),
        "enable bluetooth host failed: enable_host failed with error code 0x103"
    );
    // Stopped at the failing step
    assert_eq!(service.stack().count(|r| *r == Request::RegisterCallbacks), 0);

    // Not marked done, so a retry runs the steps again
    assert!(service.setup().is_err());
    assert_eq!(service.stack().count(|r| *r == Request::EnableController), 2);
}

#[test]
fn test_register_configures_name_advertising_and_table() {
    let service = BleService::with_defaults(RecordingStack::new());
    service.setup().unwrap();
    service.stack().take();

    service.handle_gatts_event(
        IF,
        GattsEvent::Register {
            status: ok(),
            app_id: APP_ID,
        },
    );

    assert_eq!(service.gatts_if(), Some(IF));
    assert_eq!(service.link_state(), LinkState::ConfiguringAdvertisement);
    assert_eq!(
        service.stack().take(),
        vec![
            Request::SetDeviceName("STP-24A1600B1CFE".to_string()),
            Request::ConfigAdvData { scan_rsp: false },
            Request::ConfigAdvData { scan_rsp: true },
            Request::CreateAttrTable {
                gatts_if: IF,
                entries: ATTRIBUTE_COUNT,
            },
        ]
    );
}

#[test]
fn test_register_without_address_skips_name() {
    let stack = RecordingStack {
        address: None,
        ..Default::default()
    };
    let service = BleService::with_defaults(stack);
    service.handle_gatts_event(
        IF,
        GattsEvent::Register {
            status: ok(),
            app_id: APP_ID,
        },
    );

    assert_eq!(
        service
            .stack()
            .count(|r| matches!(r, Request::SetDeviceName(_))),
        0
    );
    assert_eq!(
        service
            .stack()
            .count(|r| matches!(r, Request::CreateAttrTable { .. })),
        1
    );
}

#[test]
fn test_failed_registration_is_dropped() {
    let service = BleService::with_defaults(RecordingStack::new());
    service.handle_gatts_event(
        IF,
        GattsEvent::Register {
            status: GattStatus::Error,
            app_id: APP_ID,
        },
    );

    assert_eq!(service.gatts_if(), None);
    assert!(service.stack().take().is_empty());
}

#[test]
fn test_events_for_foreign_interface_are_ignored() {
    let service = registered_service();
    service.stack().take();

    service.handle_gatts_event(
        GattIf(7),
        GattsEvent::Connect {
            conn_id: 0,
            remote_bda: PEER,
        },
    );
    assert_eq!(service.conn_id(), None);
    assert!(service.stack().take().is_empty());

    // Wildcard events reach the profile
    service.handle_gatts_event(
        GattIf::NONE,
        GattsEvent::Connect {
            conn_id: 0,
            remote_bda: PEER,
        },
    );
    assert_eq!(service.conn_id(), Some(0));
}

#[test]
fn test_table_created_starts_service() {
    let service = registered_service();
    assert_eq!(
        service.handle_table(),
        HandleTable::from_created(&HANDLES)
    );
    assert_eq!(
        service.stack().count(|r| *r == Request::StartService(40)),
        1
    );
    assert!(service.is_service_started());
}

#[test]
fn test_table_with_wrong_handle_count_is_rejected() {
    let service = BleService::with_defaults(RecordingStack::new());
    service.handle_gatts_event(
        IF,
        GattsEvent::Register {
            status: ok(),
            app_id: APP_ID,
        },
    );
    service.handle_gatts_event(
        IF,
        GattsEvent::AttrTableCreated {
            status: ok(),
            handles: HANDLES[..7].to_vec(),
        },
    );

    assert_eq!(service.handle_table(), None);
    assert_eq!(
        service
            .stack()
            .count(|r| matches!(r, Request::StartService(_))),
        0
    );
    assert!(!service.is_service_started());
}

#[test]
fn test_advertising_starts_once_both_payloads_complete() {
    let adv = GapEvent::AdvDataSetComplete { status: ok() };
    let scan_rsp = GapEvent::ScanRspDataSetComplete { status: ok() };

    for order in [[adv.clone(), scan_rsp.clone()], [scan_rsp, adv]] {
        let service = registered_service();
        let [first, second] = order;

        service.handle_gap_event(first);
        assert_eq!(service.stack().count(|r| *r == Request::StartAdvertising), 0);

        service.handle_gap_event(second);
        assert_eq!(service.stack().count(|r| *r == Request::StartAdvertising), 1);
        assert_eq!(service.link_state(), LinkState::Advertising);
    }
}

#[test]
fn test_repeated_completion_does_not_start_advertising() {
    let service = registered_service();
    service.handle_gap_event(GapEvent::AdvDataSetComplete { status: ok() });
    service.handle_gap_event(GapEvent::AdvDataSetComplete { status: ok() });
    assert_eq!(service.stack().count(|r| *r == Request::StartAdvertising), 0);

    service.handle_gap_event(GapEvent::ScanRspDataSetComplete { status: ok() });
    service.handle_gap_event(GapEvent::ScanRspDataSetComplete { status: ok() });
    assert_eq!(service.stack().count(|r| *r == Request::StartAdvertising), 1);
}

#[test]
fn test_connect_requests_parameter_update() {
    let service = registered_service();
    service.stack().take();
    service.handle_gatts_event(
        IF,
        GattsEvent::Connect {
            conn_id: 2,
            remote_bda: PEER,
        },
    );

    assert_eq!(service.conn_id(), Some(2));
    assert_eq!(service.link_state(), LinkState::Connected);
    assert_eq!(
        service.stack().take(),
        vec![Request::UpdateConnParams(ConnUpdateRequest {
            peer: PEER,
            params: ConnParams {
                min_interval: 0x10,
                max_interval: 0x20,
                latency: 0,
                timeout: 400,
            },
        })]
    );
}

#[test]
fn test_connect_with_sentinel_id_is_ignored() {
    let service = registered_service();
    service.stack().take();
    service.handle_gatts_event(
        IF,
        GattsEvent::Connect {
            conn_id: INVALID_CONN_ID,
            remote_bda: PEER,
        },
    );

    assert_eq!(service.conn_id(), None);
    assert!(service.stack().take().is_empty());
}

#[test]
fn test_disconnect_restarts_advertising_once() {
    let service = connected_service();
    service.handle_gatts_event(
        IF,
        GattsEvent::Disconnect {
            conn_id: 0,
            remote_bda: PEER,
            reason: 0x13,
        },
    );

    assert_eq!(service.conn_id(), None);
    assert_eq!(service.link_state(), LinkState::Advertising);
    assert_eq!(service.stack().take(), vec![Request::StartAdvertising]);
}

#[test]
fn test_notify_without_connection_sends_nothing() {
    let service = registered_service();
    service.stack().take();
    service.notify();
    service.notify();

    assert!(service.stack().take().is_empty());
    assert_eq!(service.notify_count(), 0);
}

#[test]
fn test_notify_sends_counter_indications() {
    let service = connected_service().with_notify_count(0xFFFE);
    for _ in 0..3 {
        service.notify();
    }

    let sent: Vec<_> = service
        .stack()
        .take()
        .into_iter()
        .map(|r| match r {
            Request::Indicate {
                conn_id,
                handle,
                value,
                need_confirm,
            } => {
                assert_eq!(conn_id, 0);
                assert_eq!(handle, HANDLES[AttributeIndex::CharAValue.as_usize()]);
                assert!(need_confirm);
                assert_eq!(value.len(), 200);
                [value[0], value[1]]
            }
            other => panic!("unexpected request {:?}", other),
        })
        .collect();

    assert_eq!(sent, vec![[0xFF, 0xFF], [0x00, 0x00], [0x00, 0x01]]);
    assert_eq!(service.notify_count(), 0x1_0001);
}

#[test]
fn test_notify_stops_after_disconnect() {
    let service = connected_service();
    service.notify();
    service.handle_gatts_event(
        IF,
        GattsEvent::Disconnect {
            conn_id: 0,
            remote_bda: PEER,
            reason: 0x13,
        },
    );
    service.stack().take();

    service.notify();
    assert!(service.stack().take().is_empty());
    assert_eq!(service.notify_count(), 1);
}

#[test]
fn test_cccd_write_updates_client_config() {
    let service = connected_service();
    let cccd = HANDLES[AttributeIndex::CharAConfig.as_usize()];
    service.handle_gatts_event(IF, write(5, cccd, 0, &CCCD_INDICATE.to_le_bytes(), false));

    assert_eq!(service.client_config(), ClientConfig::Indicate);
    assert_eq!(
        service.stack().take(),
        vec![Request::Response {
            trans_id: 5,
            status: GattStatus::Ok,
            value: None,
        }]
    );

    // Same value on another characteristic is plain data
    service.handle_gatts_event(IF, write(6, HANDLES[5], 0, &[0x00, 0x00], false));
    assert_eq!(service.client_config(), ClientConfig::Indicate);
}

#[test]
fn test_write_without_response_sends_nothing() {
    let service = connected_service();
    service.handle_gatts_event(
        IF,
        GattsEvent::Write(WriteRequest {
            conn_id: 0,
            trans_id: 1,
            handle: HANDLES[7],
            offset: 0,
            value: vec![1, 2, 3],
            need_rsp: false,
            is_prep: false,
        }),
    );
    assert!(service.stack().take().is_empty());
}

#[test]
fn test_prepared_write_sequence() {
    let service = connected_service();
    let handle = HANDLES[2];

    service.handle_gatts_event(IF, write(1, handle, 0, &[0xAA, 0xBB], true));
    service.handle_gatts_event(IF, write(2, handle, 2, &[0xCC], true));
    service.handle_gatts_event(
        IF,
        GattsEvent::ExecWrite {
            conn_id: 0,
            trans_id: 3,
            commit: true,
        },
    );

    assert_eq!(
        service.stack().take(),
        vec![
            Request::Response {
                trans_id: 1,
                status: GattStatus::Ok,
                value: Some(AttrValue {
                    handle,
                    offset: 0,
                    value: vec![0xAA, 0xBB],
                }),
            },
            Request::Response {
                trans_id: 2,
                status: GattStatus::Ok,
                value: Some(AttrValue {
                    handle,
                    offset: 2,
                    value: vec![0xCC],
                }),
            },
            Request::Response {
                trans_id: 3,
                status: GattStatus::Ok,
                value: None,
            },
        ]
    );
}

#[test]
fn test_prepared_write_out_of_bounds() {
    let service = connected_service();
    let handle = HANDLES[2];

    service.handle_gatts_event(IF, write(1, handle, 1025, &[0x01], true));
    service.handle_gatts_event(IF, write(2, handle, 1000, &[0u8; 30], true));

    let statuses: Vec<_> = service
        .stack()
        .take()
        .into_iter()
        .filter_map(|r| match r {
            Request::Response { status, .. } => Some(status),
            _ => None,
        })
        .collect();
    assert_eq!(
        statuses,
        vec![GattStatus::InvalidOffset, GattStatus::InvalidAttributeLength]
    );
}

#[test]
fn test_exec_write_cancel_and_reuse() {
    let service = connected_service();
    let handle = HANDLES[2];

    service.handle_gatts_event(IF, write(1, handle, 0, &[0x01; 10], true));
    service.handle_gatts_event(
        IF,
        GattsEvent::ExecWrite {
            conn_id: 0,
            trans_id: 2,
            commit: false,
        },
    );
    assert!(!service.lock_state().prepare.is_active());

    service.handle_gatts_event(IF, write(3, handle, 0, &[0x02], true));
    assert_eq!(service.lock_state().prepare.accumulated_len(), 1);
}

#[test]
fn test_disconnect_drops_staged_prepared_write() {
    let service = connected_service();
    service.handle_gatts_event(IF, write(1, HANDLES[2], 0, &[0x01; 4], true));
    assert!(service.lock_state().prepare.is_active());

    service.handle_gatts_event(
        IF,
        GattsEvent::Disconnect {
            conn_id: 0,
            remote_bda: PEER,
            reason: 0x08,
        },
    );
    assert!(!service.lock_state().prepare.is_active());
}

#[test]
fn test_mtu_is_recorded() {
    let service = connected_service();
    service.handle_gatts_event(IF, GattsEvent::Mtu { conn_id: 0, mtu: 247 });
    assert_eq!(service.mtu(), Some(247));
}

fn disconnect(conn_id: ConnId) -> GattsEvent {
    GattsEvent::Disconnect {
        conn_id,
        remote_bda: PEER,
        reason: 0x13,
    }
}

#[test]
fn test_disconnect_for_other_connection_is_ignored() {
    let service = connected_service();
    service.handle_gatts_event(IF, disconnect(9));

    assert_eq!(service.conn_id(), Some(0));
    assert_eq!(service.link_state(), LinkState::Connected);
    assert!(service.stack().take().is_empty());
}

#[test]
fn test_repeated_disconnect_advertises_once() {
    let service = connected_service();
    service.handle_gatts_event(IF, disconnect(0));
    service.handle_gatts_event(IF, disconnect(0));

    assert_eq!(service.stack().take(), vec![Request::StartAdvertising]);
}

#[test]
fn test_refused_advertising_start_leaves_link_idle() {
    let service = connected_service_on(RecordingStack::failing("start_advertising"));
    service.handle_gatts_event(IF, disconnect(0));

    assert_eq!(service.conn_id(), None);
    assert_eq!(service.link_state(), LinkState::Idle);
    assert_eq!(service.stack().count(|r| *r == Request::StartAdvertising), 1);
}

#[test]
fn test_refused_initial_advertising_start_leaves_link_idle() {
    let service = registered_service_on(RecordingStack::failing("start_advertising"));
    service.handle_gap_event(GapEvent::AdvDataSetComplete { status: ok() });
    service.handle_gap_event(GapEvent::ScanRspDataSetComplete { status: ok() });

    assert_eq!(service.link_state(), LinkState::Idle);
}

#[test]
fn test_notify_runs_alongside_event_delivery() {
    const ROUNDS: usize = 1000;
    let service = Arc::new(connected_service());

    let notifier = Arc::clone(&service);
    let handle = thread::spawn(move || {
        for _ in 0..ROUNDS {
            notifier.notify();
        }
    });

    let char_a = HANDLES[AttributeIndex::CharAValue.as_usize()];
    for i in 0..ROUNDS {
        service.handle_gatts_event(IF, GattsEvent::Mtu { conn_id: 0, mtu: 247 });
        service.handle_gatts_event(IF, write(i as u32, char_a, 0, &[i as u8], false));
    }
    handle.join().unwrap();

    assert_eq!(service.notify_count(), ROUNDS as u32);
    assert_eq!(service.conn_id(), Some(0));
    assert_eq!(
        service
            .stack()
            .count(|r| matches!(r, Request::Indicate { .. })),
        ROUNDS
    );
    assert_eq!(
        service
            .stack()
            .count(|r| matches!(r, Request::Response { .. })),
        ROUNDS
    );
}
