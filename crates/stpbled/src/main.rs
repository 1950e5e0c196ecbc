use std::sync::mpsc::RecvTimeoutError;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use log::{info, warn};
use rand::Rng;
use stpble::gap::{AddressType, AdvParams, BdAddr};
use stpble::gatt::{AttributeIndex, GattIf, CCCD_INDICATE};
use stpble::{BleService, GattsEvent, LinkState, ServiceConfig, WriteRequest};

mod loopback;

use loopback::{LoopbackStack, StackEvent};

const LOOPBACK_GATTS_IF: GattIf = GattIf(3);
const SIMULATED_CONN_ID: u16 = 0;

/// Runs the STP GATT peripheral against an in-process loopback stack
#[derive(Parser, Debug)]
#[clap(name = "stpbled", version, about)]
struct Args {
    /// Interval between counter indications
    #[clap(long, default_value_t = 1000)]
    notify_interval_ms: u64,

    /// Local device address, e.g. 24:A1:60:0B:1C:FE (random when omitted)
    #[clap(long)]
    address: Option<BdAddr>,

    /// Connect a simulated central once advertising has started
    #[clap(long)]
    simulate_client: bool,

    /// Device name prefix
    #[clap(long, default_value = "STP-")]
    name_prefix: String,

    /// Stop after this many seconds instead of running forever
    #[clap(long)]
    run_for_secs: Option<u64>,
}

fn random_address() -> BdAddr {
    let mut bytes = [0u8; 6];
    rand::thread_rng().fill(&mut bytes);
    // Static random address: two most significant bits set
    bytes[0] |= 0xC0;
    BdAddr::new(bytes)
}

/// Plays a central that connects, subscribes to indications and performs
/// one long write split over two prepare requests.
fn simulate_client(service: &BleService<LoopbackStack>) -> Result<()> {
    let handles = service
        .handle_table()
        .context("attribute table not created yet")?;
    let stack = service.stack();
    let gatts_if = stack.gatts_if();
    let peer = BdAddr::new([0x11, 0x22, 0x33, 0x44, 0x55, 0x66]);
    let char_a = handles.handle(AttributeIndex::CharAValue);

    let write = |trans_id, handle, offset, value: &[u8], is_prep| {
        GattsEvent::Write(WriteRequest {
            conn_id: SIMULATED_CONN_ID,
            trans_id,
            handle,
            offset,
            value: value.to_vec(),
            need_rsp: true,
            is_prep,
        })
    };

    let events = [
        GattsEvent::Connect {
            conn_id: SIMULATED_CONN_ID,
            remote_bda: peer,
        },
        GattsEvent::Mtu {
            conn_id: SIMULATED_CONN_ID,
            mtu: 247,
        },
        write(
            1,
            handles.handle(AttributeIndex::CharAConfig),
            0,
            &CCCD_INDICATE.to_le_bytes(),
            false,
        ),
        write(2, char_a, 0, &[0xAA, 0xBB], true),
        write(3, char_a, 2, &[0xCC], true),
        GattsEvent::ExecWrite {
            conn_id: SIMULATED_CONN_ID,
            trans_id: 4,
            commit: true,
        },
    ];

    info!("simulated central {} connecting", peer);
    for event in events {
        stack.inject(StackEvent::Gatts(gatts_if, event))?;
    }
    Ok(())
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let (address, own_addr_type) = match args.address {
        Some(address) => (address, AddressType::Public),
        None => (random_address(), AddressType::Random),
    };
    info!("local address {} ({:?})", address, own_addr_type);

    let (stack, events) = LoopbackStack::new(address, LOOPBACK_GATTS_IF);
    let config = ServiceConfig {
        name_prefix: args.name_prefix.clone(),
        adv_params: AdvParams {
            own_addr_type,
            ..AdvParams::default()
        },
        ..ServiceConfig::default()
    };
    let service = Arc::new(BleService::new(stack, config));
    service.setup_or_abort();

    let interval = Duration::from_millis(args.notify_interval_ms.max(1));
    let notifier = Arc::clone(&service);
    thread::Builder::new()
        .name("notify".to_string())
        .spawn(move || loop {
            thread::sleep(interval);
            notifier.notify();
        })
        .context("failed to spawn notify thread")?;

    let deadline = args
        .run_for_secs
        .map(|secs| Instant::now() + Duration::from_secs(secs));
    let mut client_pending = args.simulate_client;

    loop {
        if deadline.map_or(false, |deadline| Instant::now() >= deadline) {
            info!("run time elapsed, {} indications sent", service.notify_count());
            return Ok(());
        }

        match events.recv_timeout(Duration::from_millis(100)) {
            Ok(StackEvent::Gap(event)) => service.handle_gap_event(event),
            Ok(StackEvent::Gatts(gatts_if, event)) => service.handle_gatts_event(gatts_if, event),
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => {
                warn!("stack event channel closed");
                return Ok(());
            }
        }

        if client_pending
            && service.is_service_started()
            && service.link_state() == LinkState::Advertising
        {
            client_pending = false;
            simulate_client(&service)?;
        }
    }
}
