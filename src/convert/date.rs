//! Oracle DATE and TIMESTAMP codecs.
//!
//! DATE is 7 bytes:
//! - byte[0]: century + 100
//! - byte[1]: year (in century) + 100
//! - byte[2]: month (1-12)
//! - byte[3]: day (1-31)
//! - byte[4..7]: hour, minute, second, each + 1
//!
//! TIMESTAMP is the same 7 bytes followed by big-endian nanoseconds (u32).
//! A TIMESTAMP with no fractional second may be sent as 7 bytes.
//!
//! Both decode to a timezone-naive `NaiveDateTime`: neither type carries a
//! zone on the server.

use bytes::{BufMut, BytesMut};
use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, Timelike};

use crate::error::{Error, Result};
use crate::native::constants::{DATE_BUFFER_SIZE, TIMESTAMP_BUFFER_SIZE};

/// Earliest year a DATE can hold (4712 BC).
const MIN_YEAR: i32 = -4712;
/// Latest year a DATE can hold.
const MAX_YEAR: i32 = 9999;

/// Server years count 1 BC as -1 with no year 0; chrono counts 1 BC as 0.
fn is_valid_year(year: i32) -> bool {
    year != 0 && (MIN_YEAR..=MAX_YEAR).contains(&year)
}

fn decode_parts(data: &[u8], nanos: u32) -> Result<NaiveDateTime> {
    let century = data[0] as i32 - 100;
    let year_in_century = data[1] as i32 - 100;
    let server_year = century * 100 + year_in_century;
    if !is_valid_year(server_year) {
        return Err(Error::type_conversion(format!(
            "invalid DATE: year={}",
            server_year
        )));
    }
    let year = if server_year < 0 { server_year + 1 } else { server_year };

    let month = data[2] as u32;
    let day = data[3] as u32;
    let hour = data[4] as i32 - 1;
    let minute = data[5] as i32 - 1;
    let second = data[6] as i32 - 1;

    let date = NaiveDate::from_ymd_opt(year, month, day).ok_or_else(|| {
        Error::type_conversion(format!(
            "invalid DATE: year={}, month={}, day={}",
            year, month, day
        ))
    })?;
    let time = u32::try_from(hour)
        .ok()
        .zip(u32::try_from(minute).ok())
        .zip(u32::try_from(second).ok())
        .and_then(|((h, m), s)| NaiveTime::from_hms_nano_opt(h, m, s, nanos))
        .ok_or_else(|| {
            Error::type_conversion(format!(
                "invalid TIME: hour={}, minute={}, second={}, nanos={}",
                hour, minute, second, nanos
            ))
        })?;
    Ok(NaiveDateTime::new(date, time))
}

/// Decode an Oracle DATE from 7 bytes.
pub fn decode_date(data: &[u8]) -> Result<NaiveDateTime> {
    if data.len() != DATE_BUFFER_SIZE {
        return Err(Error::type_conversion(format!(
            "DATE value must be exactly {} bytes, got {}",
            DATE_BUFFER_SIZE,
            data.len()
        )));
    }
    decode_parts(data, 0)
}

/// Decode an Oracle TIMESTAMP from 7 or 11 bytes.
pub fn decode_timestamp(data: &[u8]) -> Result<NaiveDateTime> {
    match data.len() {
        DATE_BUFFER_SIZE => decode_parts(data, 0),
        TIMESTAMP_BUFFER_SIZE => {
            let nanos = u32::from_be_bytes([data[7], data[8], data[9], data[10]]);
            decode_parts(data, nanos)
        }
        n => Err(Error::type_conversion(format!(
            "TIMESTAMP value must be {} or {} bytes, got {}",
            DATE_BUFFER_SIZE, TIMESTAMP_BUFFER_SIZE, n
        ))),
    }
}

fn encode_parts(dt: &NaiveDateTime, buf: &mut BytesMut) -> Result<()> {
    let year = match dt.year() {
        y if y <= 0 => y - 1,
        y => y,
    };
    if !is_valid_year(year) {
        return Err(Error::type_conversion(format!(
            "year {} is outside the supported range 4712 BC..={}",
            dt.year(),
            MAX_YEAR
        )));
    }
    buf.put_u8((year / 100 + 100) as u8);
    buf.put_u8((year % 100 + 100) as u8);
    buf.put_u8(dt.month() as u8);
    buf.put_u8(dt.day() as u8);
    buf.put_u8(dt.hour() as u8 + 1);
    buf.put_u8(dt.minute() as u8 + 1);
    // Leap seconds are carried in the fraction by chrono; clamp to :59.
    buf.put_u8(dt.second().min(59) as u8 + 1);
    Ok(())
}

/// Encode a DATE, dropping any fractional second.
pub fn encode_date(dt: &NaiveDateTime, buf: &mut BytesMut) -> Result<()> {
    encode_parts(dt, buf)
}

/// Encode a TIMESTAMP; 7 bytes when the fraction is zero, 11 otherwise.
pub fn encode_timestamp(dt: &NaiveDateTime, buf: &mut BytesMut) -> Result<()> {
    encode_parts(dt, buf)?;
    let nanos = dt.nanosecond() % 1_000_000_000;
    if nanos != 0 {
        buf.put_u32(nanos);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn datetime(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32, nanos: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, mo, d)
            .unwrap()
            .and_hms_nano_opt(h, mi, s, nanos)
            .unwrap()
    }

    #[test]
    fn test_decode_date() {
        let data = [0x78, 0x7C, 0x0A, 0x15, 0x0D, 0x25, 0x06];
        assert_eq!(
            decode_date(&data).unwrap(),
            datetime(2024, 10, 21, 12, 36, 5, 0)
        );
    }

    #[test]
    fn test_decode_date_1999() {
        let data = [0x77, 0xC7, 0x06, 0x0F, 0x0D, 0x1F, 0x2E];
        assert_eq!(
            decode_date(&data).unwrap(),
            datetime(1999, 6, 15, 12, 30, 45, 0)
        );
    }

    #[test]
    fn test_date_round_trip_bytes() {
        let data = [0x78, 0x7C, 0x0C, 0x1F, 0x18, 0x3C, 0x3C];
        let mut buf = BytesMut::new();
        encode_date(&decode_date(&data).unwrap(), &mut buf).unwrap();
        assert_eq!(&buf[..], &data);
    }

    #[test]
    fn test_encode_date_drops_fraction() {
        let mut buf = BytesMut::new();
        encode_date(&datetime(2000, 1, 1, 0, 0, 0, 500), &mut buf).unwrap();
        assert_eq!(&buf[..], &[0x78, 0x64, 0x01, 0x01, 0x01, 0x01, 0x01]);
    }

    #[test]
    fn test_timestamp_round_trip_bytes() {
        let dt = datetime(2024, 2, 29, 23, 59, 59, 123_456_789);
        let mut buf = BytesMut::new();
        encode_timestamp(&dt, &mut buf).unwrap();
        assert_eq!(buf.len(), TIMESTAMP_BUFFER_SIZE);
        assert_eq!(&buf[7..], &123_456_789u32.to_be_bytes());
        assert_eq!(decode_timestamp(&buf).unwrap(), dt);

        let mut again = BytesMut::new();
        encode_timestamp(&decode_timestamp(&buf).unwrap(), &mut again).unwrap();
        assert_eq!(buf, again);
    }

    #[test]
    fn test_timestamp_without_fraction_is_short() {
        let dt = datetime(2024, 1, 15, 0, 0, 0, 0);
        let mut buf = BytesMut::new();
        encode_timestamp(&dt, &mut buf).unwrap();
        assert_eq!(buf.len(), DATE_BUFFER_SIZE);
        assert_eq!(decode_timestamp(&buf).unwrap(), dt);
    }

    #[test]
    fn test_decode_rejects_invalid() {
        assert!(decode_date(&[0x78, 0x7C, 0x0A]).is_err());
        assert!(decode_date(&[0x78, 0x7C, 0x0D, 0x0F, 0x01, 0x01, 0x01]).is_err());
        assert!(decode_date(&[0x78, 0x7C, 0x01, 0x20, 0x01, 0x01, 0x01]).is_err());
        assert!(decode_date(&[0x78, 0x7C, 0x01, 0x01, 0x00, 0x01, 0x01]).is_err());
        assert!(decode_timestamp(&[0x78, 0x7C, 0x01, 0x01, 0x01, 0x01, 0x01, 0x00]).is_err());
    }

    #[test]
    fn test_encode_rejects_out_of_range_year() {
        let mut buf = BytesMut::new();
        assert!(encode_date(&datetime(10000, 1, 1, 0, 0, 0, 0), &mut buf).is_err());
        // 4713 BC
        assert!(encode_date(&datetime(-4712, 12, 31, 0, 0, 0, 0), &mut buf).is_err());
        assert!(buf.is_empty());
        // There is no year 0 on the wire.
        assert!(decode_date(&[100, 100, 1, 1, 1, 1, 1]).is_err());
    }

    #[test]
    fn test_bc_date_round_trip_bytes() {
        // 4712 BC, the earliest DATE
        let data = [53, 88, 1, 1, 1, 1, 1];
        let dt = decode_date(&data).unwrap();
        assert_eq!(dt, datetime(-4711, 1, 1, 0, 0, 0, 0));

        let mut buf = BytesMut::new();
        encode_date(&dt, &mut buf).unwrap();
        assert_eq!(&buf[..], &data);

        // 1 BC is year 0 in chrono and -1 on the wire.
        let mut buf = BytesMut::new();
        encode_timestamp(&datetime(0, 12, 31, 23, 59, 59, 0), &mut buf).unwrap();
        assert_eq!(&buf[..], &[100, 99, 12, 31, 24, 60, 60]);
        assert_eq!(decode_timestamp(&buf).unwrap(), datetime(0, 12, 31, 23, 59, 59, 0));

        // 1 AD follows directly.
        let mut buf = BytesMut::new();
        encode_date(&datetime(1, 1, 1, 0, 0, 0, 0), &mut buf).unwrap();
        assert_eq!(&buf[..], &[100, 101, 1, 1, 1, 1, 1]);
    }
}
