//! GATT constants

// GATT status codes reported by the stack and sent back to peers
pub const GATT_OK: u8 = 0x00;
pub const GATT_INVALID_HANDLE: u8 = 0x01;
pub const GATT_READ_NOT_PERMIT: u8 = 0x02;
pub const GATT_WRITE_NOT_PERMIT: u8 = 0x03;
pub const GATT_INVALID_PDU: u8 = 0x04;
pub const GATT_INSUF_AUTHENTICATION: u8 = 0x05;
pub const GATT_REQ_NOT_SUPPORTED: u8 = 0x06;
pub const GATT_INVALID_OFFSET: u8 = 0x07;
pub const GATT_INSUF_AUTHORIZATION: u8 = 0x08;
pub const GATT_PREPARE_Q_FULL: u8 = 0x09;
pub const GATT_NOT_FOUND: u8 = 0x0A;
pub const GATT_NOT_LONG: u8 = 0x0B;
pub const GATT_INSUF_KEY_SIZE: u8 = 0x0C;
pub const GATT_INVALID_ATTR_LEN: u8 = 0x0D;
pub const GATT_ERR_UNLIKELY: u8 = 0x0E;
pub const GATT_INSUF_ENCRYPTION: u8 = 0x0F;
pub const GATT_UNSUPPORT_GRP_TYPE: u8 = 0x10;
pub const GATT_INSUF_RESOURCE: u8 = 0x11;
pub const GATT_NO_RESOURCES: u8 = 0x80;
pub const GATT_INTERNAL_ERROR: u8 = 0x81;
pub const GATT_WRONG_STATE: u8 = 0x82;
pub const GATT_DB_FULL: u8 = 0x83;
pub const GATT_BUSY: u8 = 0x84;
pub const GATT_ERROR: u8 = 0x85;

// Attribute permission bits
pub const GATT_PERM_READ: u16 = 0x0001;
pub const GATT_PERM_READ_ENCRYPTED: u16 = 0x0002;
pub const GATT_PERM_READ_ENC_MITM: u16 = 0x0004;
pub const GATT_PERM_WRITE: u16 = 0x0010;
pub const GATT_PERM_WRITE_ENCRYPTED: u16 = 0x0020;
pub const GATT_PERM_WRITE_ENC_MITM: u16 = 0x0040;

// Characteristic property bits (value of a characteristic declaration)
pub const CHAR_PROP_BROADCAST: u8 = 0x01;
pub const CHAR_PROP_READ: u8 = 0x02;
pub const CHAR_PROP_WRITE_NR: u8 = 0x04;
pub const CHAR_PROP_WRITE: u8 = 0x08;
pub const CHAR_PROP_NOTIFY: u8 = 0x10;
pub const CHAR_PROP_INDICATE: u8 = 0x20;

// Declaration and descriptor types
pub const PRIMARY_SERVICE_UUID: u16 = 0x2800;
pub const CHARACTERISTIC_UUID: u16 = 0x2803;
pub const CLIENT_CHAR_CONFIG_UUID: u16 = 0x2902;

// Client Characteristic Configuration values
pub const CCCD_DISABLED: u16 = 0x0000;
pub const CCCD_NOTIFY: u16 = 0x0001;
pub const CCCD_INDICATE: u16 = 0x0002;

// Profile UUIDs
pub const SERVICE_UUID: u16 = 0x00FF;
pub const CHAR_UUID_A: u16 = 0xFF01;
pub const CHAR_UUID_B: u16 = 0xFF02;
pub const CHAR_UUID_C: u16 = 0xFF03;

/// Application id passed to the stack when registering the profile.
pub const APP_ID: u16 = 0x55;
/// Service instance id used for attribute-table creation.
pub const SVC_INST_ID: u8 = 0;

/// Maximum length of a characteristic value. Plain and prepared writes from
/// the client must stay below this.
pub const CHAR_VAL_LEN_MAX: u16 = 500;
/// Capacity of the prepared-write staging buffer.
pub const PREPARE_BUF_MAX_SIZE: usize = 1024;
/// Size of a characteristic declaration value (properties byte only).
pub const CHAR_DECLARATION_SIZE: u16 = 1;

pub const LOCAL_MTU: u16 = 500;

/// Length of the indication payload sent by the notifier.
pub const NOTIFY_PAYLOAD_LEN: usize = 200;
