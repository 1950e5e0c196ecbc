use crate::gap::constants::*;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressType {
    Public,
    Random,
}

impl From<AddressType> for u8 {
    fn from(value: AddressType) -> Self {
        match value {
            AddressType::Public => PUBLIC_DEVICE_ADDRESS,
            AddressType::Random => RANDOM_DEVICE_ADDRESS,
        }
    }
}

/// Bluetooth device address, bytes in the order the stack reports them
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct BdAddr {
    pub bytes: [u8; 6],
}

impl BdAddr {
    pub const fn new(bytes: [u8; 6]) -> Self {
        Self { bytes }
    }

    pub fn from_slice(slice: &[u8]) -> Option<Self> {
        let bytes: [u8; 6] = slice.get(..6)?.try_into().ok()?;
        Some(Self { bytes })
    }

    /// Human readable device name: the product prefix followed by the six
    /// address bytes as upper-case hex, e.g. `STP-24A160112233`.
    pub fn device_name(&self) -> String {
        self.name_with_prefix(DEVICE_NAME_PREFIX)
    }

    pub fn name_with_prefix(&self, prefix: &str) -> String {
        format!("{}{}", prefix, hex::encode_upper(self.bytes))
    }
}

#[derive(Error, Debug, PartialEq)]
pub enum AddrParseError {
    #[error("expected 6 address bytes, got {0}")]
    InvalidLength(usize),
    #[error("invalid hex in address: {0}")]
    Hex(#[from] hex::FromHexError),
}

/// Parses `24:A1:60:0B:1C:FE` (or the same digits without separators) in
/// the byte order [`Display`](fmt::Display) prints.
impl FromStr for BdAddr {
    type Err = AddrParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits: String = s.chars().filter(|c| *c != ':' && *c != '-').collect();
        let bytes = hex::decode(digits)?;
        BdAddr::from_slice(&bytes)
            .filter(|_| bytes.len() == 6)
            .ok_or(AddrParseError::InvalidLength(bytes.len()))
    }
}

impl fmt::Display for BdAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02X}:{:02X}:{:02X}:{:02X}:{:02X}:{:02X}",
            self.bytes[0], self.bytes[1], self.bytes[2], self.bytes[3], self.bytes[4], self.bytes[5]
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdvType {
    /// Connectable undirected
    Ind,
    DirectInd,
    ScanInd,
    NonConnInd,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdvFilterPolicy {
    AllowScanAnyConnAny,
    AllowScanWlstConnAny,
    AllowScanAnyConnWlst,
    AllowScanWlstConnWlst,
}

/// Parameters of the advertising start request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdvParams {
    pub interval_min: u16,
    pub interval_max: u16,
    pub adv_type: AdvType,
    pub own_addr_type: AddressType,
    pub channel_map: u8,
    pub filter_policy: AdvFilterPolicy,
}

impl Default for AdvParams {
    fn default() -> Self {
        Self {
            interval_min: ADV_INTERVAL_MIN,
            interval_max: ADV_INTERVAL_MAX,
            adv_type: AdvType::Ind,
            own_addr_type: AddressType::Public,
            channel_map: ADV_CHANNEL_ALL,
            filter_policy: AdvFilterPolicy::AllowScanAnyConnAny,
        }
    }
}

/// Connection parameter update request sent to the central
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnParams {
    /// 1.25 ms units
    pub min_interval: u16,
    /// 1.25 ms units
    pub max_interval: u16,
    pub latency: u16,
    /// 10 ms units
    pub timeout: u16,
}

impl Default for ConnParams {
    fn default() -> Self {
        Self {
            min_interval: CONN_INTERVAL_MIN,
            max_interval: CONN_INTERVAL_MAX,
            latency: CONN_LATENCY,
            timeout: CONN_SUPERVISION_TIMEOUT,
        }
    }
}

/// Connection parameter update addressed to a peer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnUpdateRequest {
    pub peer: BdAddr,
    pub params: ConnParams,
}
