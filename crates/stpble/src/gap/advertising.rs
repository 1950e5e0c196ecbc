//! Advertising payloads and the advertising/connection lifecycle
//!
//! The stack needs two payloads configured (advertising data and scan
//! response) before advertising may start. Their completions arrive as
//! separate events in either order, so the controller keeps one pending flag
//! per payload and starts advertising only when both have cleared.

use crate::gap::constants::*;
use crate::gatt::constants::SERVICE_UUID;
use crate::uuid::Uuid;
use bitflags::bitflags;
use byteorder::{ByteOrder, LittleEndian};

/// Advertising payload configuration handed to the stack
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdvertisingData {
    /// Payload is the scan response rather than the advertising data
    pub set_scan_rsp: bool,
    pub include_name: bool,
    pub include_tx_power: bool,
    /// Preferred connection interval, 1.25 ms units; omitted when zero
    pub min_interval: u16,
    pub max_interval: u16,
    /// Omitted when zero
    pub appearance: u16,
    pub manufacturer_data: Vec<u8>,
    pub service_data: Vec<u8>,
    pub service_uuid: Option<Uuid>,
    /// Write the service UUID in its 16-bit form when it has one
    pub short_service_uuid: bool,
    pub flags: u8,
}

impl AdvertisingData {
    /// Advertising data of the peripheral
    pub fn primary() -> Self {
        Self {
            set_scan_rsp: false,
            include_name: true,
            include_tx_power: true,
            min_interval: ADV_CONN_INTERVAL_MIN,
            max_interval: ADV_CONN_INTERVAL_MAX,
            appearance: 0,
            manufacturer_data: Vec::new(),
            service_data: Vec::new(),
            service_uuid: Some(Uuid::from_u16(SERVICE_UUID)),
            short_service_uuid: false,
            flags: ADV_FLAG_GEN_DISC | ADV_FLAG_BREDR_NOT_SPT,
        }
    }

    /// Scan response of the peripheral. The 128-bit UUID leaves no room
    /// for the name in the primary payload, so the scan response uses the
    /// 16-bit alias and carries the complete name.
    pub fn scan_response() -> Self {
        Self {
            set_scan_rsp: true,
            short_service_uuid: true,
            ..Self::primary()
        }
    }

    /// Encodes the payload as legacy AD structures.
    ///
    /// The service UUID is written in its 128-bit form unless
    /// `short_service_uuid` is set and it has a 16-bit alias. The local name
    /// goes last and is shortened to whatever room is left; it is dropped when
    /// not even one byte fits. Flags are only carried by advertising data.
    pub fn encode(&self, name: &str, tx_power: i8) -> Vec<u8> {
        let mut out = Vec::with_capacity(ADV_DATA_MAX_LEN);

        if !self.set_scan_rsp && self.flags != 0 {
            push_ad(&mut out, ADV_TYPE_FLAGS, &[self.flags]);
        }
        if self.include_tx_power {
            push_ad(&mut out, ADV_TYPE_TX_POWER_LEVEL, &[tx_power as u8]);
        }
        if self.min_interval != 0 && self.max_interval != 0 {
            let mut range = [0u8; 4];
            LittleEndian::write_u16(&mut range[0..2], self.min_interval);
            LittleEndian::write_u16(&mut range[2..4], self.max_interval);
            push_ad(&mut out, ADV_TYPE_SLAVE_CONN_INTERVAL_RANGE, &range);
        }
        if self.appearance != 0 {
            push_ad(&mut out, ADV_TYPE_APPEARANCE, &self.appearance.to_le_bytes());
        }
        if let Some(uuid) = &self.service_uuid {
            if self.short_service_uuid && uuid.encoded_len() == 2 {
                push_ad(&mut out, ADV_TYPE_16BIT_SERVICE_UUID_COMPLETE, &uuid.to_le_vec());
            } else {
                push_ad(&mut out, ADV_TYPE_128BIT_SERVICE_UUID_COMPLETE, uuid.as_bytes_le());
            }
        }
        if !self.manufacturer_data.is_empty() {
            push_ad(&mut out, ADV_TYPE_MANUFACTURER_SPECIFIC, &self.manufacturer_data);
        }
        if !self.service_data.is_empty() {
            push_ad(&mut out, ADV_TYPE_SERVICE_DATA_16BIT, &self.service_data);
        }

        if self.include_name && !name.is_empty() {
            let room = ADV_DATA_MAX_LEN.saturating_sub(out.len() + 2);
            if name.len() <= room {
                push_ad(&mut out, ADV_TYPE_COMPLETE_LOCAL_NAME, name.as_bytes());
            } else if room > 0 {
                let mut cut = room;
                while !name.is_char_boundary(cut) {
                    cut -= 1;
                }
                if cut > 0 {
                    push_ad(&mut out, ADV_TYPE_SHORT_LOCAL_NAME, &name.as_bytes()[..cut]);
                }
            }
        }

        out.truncate(ADV_DATA_MAX_LEN);
        out
    }
}

fn push_ad(out: &mut Vec<u8>, ad_type: u8, data: &[u8]) {
    if out.len() + 2 + data.len() > ADV_DATA_MAX_LEN {
        return;
    }
    out.push(data.len() as u8 + 1);
    out.push(ad_type);
    out.extend_from_slice(data);
}

/// Splits an advertising payload into `(type, data)` pairs.
///
/// Stops at the first zero-length structure or at a structure that would run
/// past the end of the payload.
pub fn parse_ad_structures(data: &[u8]) -> Vec<(u8, Vec<u8>)> {
    let mut result = Vec::new();
    let mut i = 0;

    while i < data.len() {
        let length = data[i] as usize;
        if length == 0 || i + 1 + length > data.len() {
            break;
        }
        result.push((data[i + 1], data[i + 2..i + 1 + length].to_vec()));
        i += 1 + length;
    }

    result
}

bitflags! {
    /// Advertising payloads still waiting for their set-complete event
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct AdvConfigPending: u8 {
        const ADV = 1 << 0;
        const SCAN_RSP = 1 << 1;
    }
}

/// Lifecycle of the peripheral as seen from advertising and connections
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    Idle,
    Registering,
    ConfiguringAdvertisement,
    Advertising,
    Connected,
}

#[derive(Debug)]
pub struct AdvertisingController {
    state: LinkState,
    pending: AdvConfigPending,
}

impl Default for AdvertisingController {
    fn default() -> Self {
        Self::new()
    }
}

impl AdvertisingController {
    pub fn new() -> Self {
        Self {
            state: LinkState::Idle,
            pending: AdvConfigPending::empty(),
        }
    }

    pub fn state(&self) -> LinkState {
        self.state
    }

    pub fn pending(&self) -> AdvConfigPending {
        self.pending
    }

    /// App registration has been requested
    pub fn registering(&mut self) {
        self.state = LinkState::Registering;
    }

    /// Both payload configurations are about to be submitted
    pub fn begin_configuration(&mut self) {
        self.pending = AdvConfigPending::all();
        self.state = LinkState::ConfiguringAdvertisement;
    }

    /// Records a set-complete event. Returns true when this completion was
    /// the last one outstanding, i.e. advertising must be started now.
    pub fn payload_configured(&mut self, payload: AdvConfigPending) -> bool {
        if !self.pending.intersects(payload) {
            return false;
        }
        self.pending.remove(payload);
        if self.pending.is_empty() {
            self.state = LinkState::Advertising;
            true
        } else {
            false
        }
    }

    pub fn connected(&mut self) {
        self.state = LinkState::Connected;
    }

    /// The link dropped; advertising is restarted right away.
    pub fn disconnected(&mut self) {
        self.state = LinkState::Advertising;
    }

    pub fn advertising_stopped(&mut self) {
        if self.state == LinkState::Advertising {
            self.state = LinkState::Idle;
        }
    }
}
