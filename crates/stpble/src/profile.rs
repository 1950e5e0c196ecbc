//! State of the single GATT profile and its indication payload

use crate::gap::BdAddr;
use crate::gatt::{ClientConfig, ConnId, GattIf, INVALID_CONN_ID, NOTIFY_PAYLOAD_LEN};
use byteorder::{BigEndian, ByteOrder};

/// Interface and connection bookkeeping of the profile
#[derive(Debug, Default)]
pub struct ProfileDescriptor {
    gatts_if: Option<GattIf>,
    conn_id: Option<ConnId>,
    peer: Option<BdAddr>,
    client_config: ClientConfig,
}

impl ProfileDescriptor {
    pub fn gatts_if(&self) -> Option<GattIf> {
        self.gatts_if
    }

    pub fn conn_id(&self) -> Option<ConnId> {
        self.conn_id
    }

    pub fn peer(&self) -> Option<BdAddr> {
        self.peer
    }

    pub fn client_config(&self) -> ClientConfig {
        self.client_config
    }

    pub fn is_connected(&self) -> bool {
        self.conn_id.is_some()
    }

    /// Whether an event on `gatts_if` belongs to this profile: either the
    /// event is not bound to an interface or it is bound to ours.
    pub fn accepts(&self, gatts_if: GattIf) -> bool {
        gatts_if.is_none() || self.gatts_if == Some(gatts_if)
    }

    pub fn registered(&mut self, gatts_if: GattIf) {
        self.gatts_if = Some(gatts_if);
    }

    /// Records a new connection. Refuses the stack's "no connection" id.
    pub fn connect(&mut self, conn_id: ConnId, peer: BdAddr) -> bool {
        if conn_id == INVALID_CONN_ID {
            return false;
        }
        self.conn_id = Some(conn_id);
        self.peer = Some(peer);
        true
    }

    pub fn disconnect(&mut self) {
        self.conn_id = None;
        self.peer = None;
        self.client_config = ClientConfig::Disabled;
    }

    pub fn set_client_config(&mut self, config: ClientConfig) {
        self.client_config = config;
    }
}

/// Counter-carrying indication payload.
///
/// Bytes 0-1 hold the low 16 bits of the counter, big-endian. The rest of
/// the payload is reserved and stays zero.
#[derive(Debug)]
pub struct Notifier {
    count: u32,
    payload: [u8; NOTIFY_PAYLOAD_LEN],
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new()
    }
}

impl Notifier {
    pub fn new() -> Self {
        Self::starting_at(0)
    }

    pub fn starting_at(count: u32) -> Self {
        Self {
            count,
            payload: [0; NOTIFY_PAYLOAD_LEN],
        }
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    /// Bumps the counter and refreshes the payload. Returns the new count.
    pub fn advance(&mut self) -> u32 {
        self.count = self.count.wrapping_add(1);
        BigEndian::write_u16(&mut self.payload[0..2], self.count as u16);
        self.count
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }
}
