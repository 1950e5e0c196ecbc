// Address types
pub const PUBLIC_DEVICE_ADDRESS: u8 = 0x00;
pub const RANDOM_DEVICE_ADDRESS: u8 = 0x01;

// Advertising Data Types
pub const ADV_TYPE_FLAGS: u8 = 0x01;
pub const ADV_TYPE_16BIT_SERVICE_UUID_COMPLETE: u8 = 0x03;
pub const ADV_TYPE_128BIT_SERVICE_UUID_COMPLETE: u8 = 0x07;
pub const ADV_TYPE_SHORT_LOCAL_NAME: u8 = 0x08;
pub const ADV_TYPE_COMPLETE_LOCAL_NAME: u8 = 0x09;
pub const ADV_TYPE_TX_POWER_LEVEL: u8 = 0x0A;
pub const ADV_TYPE_SLAVE_CONN_INTERVAL_RANGE: u8 = 0x12;
pub const ADV_TYPE_SERVICE_DATA_16BIT: u8 = 0x16;
pub const ADV_TYPE_APPEARANCE: u8 = 0x19;
pub const ADV_TYPE_MANUFACTURER_SPECIFIC: u8 = 0xFF;

// Advertising flags
pub const ADV_FLAG_GEN_DISC: u8 = 0x02;
pub const ADV_FLAG_BREDR_NOT_SPT: u8 = 0x04;

/// Legacy advertising and scan response payloads are limited to 31 bytes.
pub const ADV_DATA_MAX_LEN: usize = 31;

// Preferred connection interval carried in the advertising payload
pub const ADV_CONN_INTERVAL_MIN: u16 = 0x0006; // 7.5 ms
pub const ADV_CONN_INTERVAL_MAX: u16 = 0x0010; // 20 ms

// Advertising interval, 0.625 ms units
pub const ADV_INTERVAL_MIN: u16 = 0x0020; // 20 ms
pub const ADV_INTERVAL_MAX: u16 = 0x0040; // 40 ms

// Advertising channel map
pub const ADV_CHANNEL_37: u8 = 0x01;
pub const ADV_CHANNEL_38: u8 = 0x02;
pub const ADV_CHANNEL_39: u8 = 0x04;
pub const ADV_CHANNEL_ALL: u8 = ADV_CHANNEL_37 | ADV_CHANNEL_38 | ADV_CHANNEL_39;

// Connection parameters requested right after a central connects
pub const CONN_INTERVAL_MIN: u16 = 0x0010; // 20 ms
pub const CONN_INTERVAL_MAX: u16 = 0x0020; // 40 ms
pub const CONN_LATENCY: u16 = 0x0000;
pub const CONN_SUPERVISION_TIMEOUT: u16 = 400; // 4 s, 10 ms units

/// Prefix of the device name derived from the hardware address.
pub const DEVICE_NAME_PREFIX: &str = "STP-";
