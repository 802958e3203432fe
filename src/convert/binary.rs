//! BINARY_FLOAT / BINARY_DOUBLE and REF CURSOR codecs.
//!
//! Floats use Oracle's byte-sortable IEEE layout: big-endian, with the sign
//! bit flipped for non-negative values and every bit inverted for negative
//! values.

use bytes::{BufMut, BytesMut};

use crate::error::{Error, Result};
use crate::native::constants::{
    BINARY_DOUBLE_BUFFER_SIZE, BINARY_FLOAT_BUFFER_SIZE, CURSOR_BUFFER_SIZE,
};

fn fixed<const N: usize>(data: &[u8], what: &str) -> Result<[u8; N]> {
    data.try_into().map_err(|_| {
        Error::type_conversion(format!(
            "{} value must be exactly {} bytes, got {}",
            what,
            N,
            data.len()
        ))
    })
}

pub fn decode_binary_double(data: &[u8]) -> Result<f64> {
    let bits = u64::from_be_bytes(fixed::<BINARY_DOUBLE_BUFFER_SIZE>(data, "BINARY_DOUBLE")?);
    let bits = if bits & (1 << 63) != 0 {
        bits ^ (1 << 63)
    } else {
        !bits
    };
    Ok(f64::from_bits(bits))
}

pub fn encode_binary_double(value: f64, buf: &mut BytesMut) {
    let bits = value.to_bits();
    let bits = if bits & (1 << 63) == 0 {
        bits | (1 << 63)
    } else {
        !bits
    };
    buf.put_u64(bits);
}

pub fn decode_binary_float(data: &[u8]) -> Result<f32> {
    let bits = u32::from_be_bytes(fixed::<BINARY_FLOAT_BUFFER_SIZE>(data, "BINARY_FLOAT")?);
    let bits = if bits & (1 << 31) != 0 {
        bits ^ (1 << 31)
    } else {
        !bits
    };
    Ok(f32::from_bits(bits))
}

pub fn encode_binary_float(value: f32, buf: &mut BytesMut) {
    let bits = value.to_bits();
    let bits = if bits & (1 << 31) == 0 {
        bits | (1 << 31)
    } else {
        !bits
    };
    buf.put_u32(bits);
}

/// Decode a REF CURSOR id.
pub fn decode_cursor_id(data: &[u8]) -> Result<u32> {
    Ok(u32::from_be_bytes(fixed::<CURSOR_BUFFER_SIZE>(data, "REF CURSOR")?))
}

pub fn encode_cursor_id(cursor_id: u32, buf: &mut BytesMut) {
    buf.put_u32(cursor_id);
}
