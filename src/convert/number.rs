//! Oracle NUMBER codec.
//!
//! Oracle NUMBER is a variable-length format:
//! - first byte is the base-100 exponent, offset by 193, high bit set for
//!   positive values and all bits inverted for negative ones
//! - remaining bytes are base-100 mantissa digits, stored as `d + 1` for
//!   positive values and `101 - d` for negative ones
//! - negative values shorter than 20 mantissa bytes end with a 102 byte
//!
//! Zero is the single byte 0x80.

use bytes::{BufMut, BytesMut};

use crate::error::{Error, Result};

const ZERO: u8 = 0x80;
const NEGATIVE_TERMINATOR: u8 = 102;
const MAX_DIGITS: usize = 40;
const MAX_MANTISSA_PAIRS: usize = 20;
const NEGATIVE_INFINITY_TEXT: &str = "-1e126";

/// Decode Oracle NUMBER bytes into exact decimal text.
pub fn decode_number(bytes: &[u8]) -> Result<String> {
    let Some((&exp_byte, mut mantissa)) = bytes.split_first() else {
        return Err(Error::type_conversion("empty NUMBER value"));
    };

    let positive = exp_byte & 0x80 != 0;
    if mantissa.is_empty() {
        return Ok(if positive {
            "0".to_string()
        } else {
            NEGATIVE_INFINITY_TEXT.to_string()
        });
    }

    let exponent = if positive {
        exp_byte as i32 - 193
    } else {
        (!exp_byte) as i32 - 193
    };
    if !positive && mantissa.last() == Some(&NEGATIVE_TERMINATOR) {
        mantissa = &mantissa[..mantissa.len() - 1];
    }

    let mut digits: Vec<u8> = Vec::with_capacity(mantissa.len() * 2);
    for &byte in mantissa {
        let pair = if positive {
            byte as i32 - 1
        } else {
            101 - byte as i32
        };
        if !(0..=99).contains(&pair) {
            return Err(Error::type_conversion(format!(
                "invalid NUMBER mantissa byte {}",
                byte
            )));
        }
        digits.push((pair / 10) as u8);
        digits.push((pair % 10) as u8);
    }

    // Digits before the decimal point.
    let mut point = (exponent + 1) * 2;
    let leading = digits.iter().take_while(|&&d| d == 0).count();
    digits.drain(..leading);
    point -= leading as i32;
    while digits.last() == Some(&0) {
        digits.pop();
    }
    if digits.is_empty() {
        return Ok("0".to_string());
    }

    let mut text = String::with_capacity(digits.len() + 4);
    if !positive {
        text.push('-');
    }
    let len = digits.len() as i32;
    let push_digits = |text: &mut String, ds: &[u8]| {
        text.extend(ds.iter().map(|d| (b'0' + d) as char));
    };
    if point <= 0 {
        text.push_str("0.");
        text.extend(std::iter::repeat('0').take((-point) as usize));
        push_digits(&mut text, &digits);
    } else if point >= len {
        push_digits(&mut text, &digits);
        text.extend(std::iter::repeat('0').take((point - len) as usize));
    } else {
        let (int_part, frac_part) = digits.split_at(point as usize);
        push_digits(&mut text, int_part);
        text.push('.');
        push_digits(&mut text, frac_part);
    }
    Ok(text)
}

/// Parsed decimal: sign, significant digits and the position of the decimal
/// point relative to the first digit.
struct Decimal {
    negative: bool,
    digits: Vec<u8>,
    point: i32,
}

fn parse_decimal(text: &str) -> Result<Decimal> {
    let invalid = || Error::type_conversion(format!("invalid numeric text {:?}", text));
    let s = text.trim();
    let (negative, rest) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let (mantissa, exp) = match rest.find(['e', 'E']) {
        Some(pos) => {
            let exp: i32 = rest[pos + 1..].parse().map_err(|_| invalid())?;
            (&rest[..pos], exp)
        }
        None => (rest, 0),
    };

    let mut digits = Vec::with_capacity(mantissa.len());
    let mut point = None;
    for (i, c) in mantissa.char_indices() {
        match c {
            '0'..='9' => digits.push(c as u8 - b'0'),
            '.' if point.is_none() => point = Some(i as i32),
            _ => return Err(invalid()),
        }
    }
    if digits.is_empty() {
        return Err(invalid());
    }

    let leading = digits.iter().take_while(|&&d| d == 0).count();
    // Saturated positions fall outside NUMBER range and are rejected there.
    let point = point
        .unwrap_or(digits.len() as i32)
        .saturating_add(exp)
        .saturating_sub(leading as i32);
    digits.drain(..leading);
    while digits.last() == Some(&0) {
        digits.pop();
    }

    Ok(Decimal {
        negative,
        digits,
        point,
    })
}

/// Encode decimal text as Oracle NUMBER bytes.
pub fn encode_number(text: &str, buf: &mut BytesMut) -> Result<()> {
    if text.trim() == NEGATIVE_INFINITY_TEXT {
        buf.put_u8(0x00);
        return Ok(());
    }

    let Decimal {
        negative,
        mut digits,
        mut point,
    } = parse_decimal(text)?;

    if digits.is_empty() {
        buf.put_u8(ZERO);
        return Ok(());
    }
    if digits.len() > MAX_DIGITS {
        return Err(Error::type_conversion(format!(
            "{} has more than {} significant digits",
            text, MAX_DIGITS
        )));
    }
    if !(-129..=126).contains(&point) {
        return Err(Error::type_conversion(format!(
            "{} is out of NUMBER range",
            text
        )));
    }

    // Base-100 digits must start on an even position.
    if point.rem_euclid(2) == 1 {
        digits.insert(0, 0);
        point += 1;
    }
    if digits.len() % 2 == 1 {
        digits.push(0);
    }

    let exp_byte = (point / 2 + 192) as u8;
    buf.put_u8(if negative { !exp_byte } else { exp_byte });

    let pairs = digits.len() / 2;
    for pair in digits.chunks(2) {
        let value = pair[0] * 10 + pair[1];
        buf.put_u8(if negative { 101 - value } else { value + 1 });
    }
    if negative && pairs < MAX_MANTISSA_PAIRS {
        buf.put_u8(NEGATIVE_TERMINATOR);
    }
    Ok(())
}
