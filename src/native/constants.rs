//! Native client constants.
//!
//! Type numbers and error codes follow Oracle's external data type table.

// Oracle data type numbers
pub const ORA_TYPE_NUM_VARCHAR: u8 = 1;
pub const ORA_TYPE_NUM_NUMBER: u8 = 2;
pub const ORA_TYPE_NUM_BINARY_INTEGER: u8 = 3;
pub const ORA_TYPE_NUM_LONG: u8 = 8;
pub const ORA_TYPE_NUM_ROWID: u8 = 11;
pub const ORA_TYPE_NUM_DATE: u8 = 12;
pub const ORA_TYPE_NUM_RAW: u8 = 23;
pub const ORA_TYPE_NUM_LONG_RAW: u8 = 24;
pub const ORA_TYPE_NUM_CHAR: u8 = 96;
pub const ORA_TYPE_NUM_BINARY_FLOAT: u8 = 100;
pub const ORA_TYPE_NUM_BINARY_DOUBLE: u8 = 101;
pub const ORA_TYPE_NUM_CURSOR: u8 = 102;
pub const ORA_TYPE_NUM_OBJECT: u8 = 109;
pub const ORA_TYPE_NUM_CLOB: u8 = 112;
pub const ORA_TYPE_NUM_BLOB: u8 = 113;
pub const ORA_TYPE_NUM_TIMESTAMP: u8 = 180;
pub const ORA_TYPE_NUM_TIMESTAMP_TZ: u8 = 181;

// Bind directions
pub const TNS_BIND_DIR_OUTPUT: u8 = 16;
pub const TNS_BIND_DIR_INPUT: u8 = 32;
pub const TNS_BIND_DIR_INPUT_OUTPUT: u8 = 48;

// Buffer sizes
pub const NUMBER_BUFFER_SIZE: usize = 22;
pub const DATE_BUFFER_SIZE: usize = 7;
pub const TIMESTAMP_BUFFER_SIZE: usize = 11;
pub const BINARY_FLOAT_BUFFER_SIZE: usize = 4;
pub const BINARY_DOUBLE_BUFFER_SIZE: usize = 8;
pub const CURSOR_BUFFER_SIZE: usize = 4;
pub const MAX_STRING_SIZE: usize = 32767;
pub const DEFAULT_STRING_SIZE: usize = 4000;

// Error codes
pub const ORA_ERR_INVALID_SQL: u32 = 900;
pub const ORA_ERR_TABLE_NOT_FOUND: u32 = 942;
pub const ORA_ERR_INCONSISTENT_DATA_TYPES: u32 = 932;
pub const ORA_ERR_MAX_OPEN_CURSORS: u32 = 1000;
pub const ORA_ERR_INVALID_CURSOR: u32 = 1001;
pub const ORA_ERR_NOT_ALL_VARIABLES_BOUND: u32 = 1008;
pub const ORA_ERR_NOT_CONNECTED: u32 = 3114;
pub const ORA_ERR_VALUE_ERROR: u32 = 6502;
pub const ORA_ERR_PLSQL_COMPILATION: u32 = 6550;
pub const ORA_ERR_NOT_EXECUTED: u32 = 24338;
