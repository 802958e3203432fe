//! PL/SQL call statement synthesis.
//!
//! Wraps a stored function or procedure call in an anonymous block and
//! numbers one placeholder per argument:
//!
//! ```text
//! begin :1 := Func(:2, keyarg1=>:3); end;
//! begin Proc(:1, keyarg1=>:2); end;
//! ```

use std::fmt::Write;

use crate::error::{Error, Result};

/// Check that a keyword argument name can follow `=>` in a call.
fn validate_keyword(name: &str, seen: &[&str]) -> Result<()> {
    let reason = if name.is_empty() {
        Some("name is empty")
    } else if name.starts_with(':') {
        Some("name would be read as a placeholder")
    } else if name.bytes().all(|b| b.is_ascii_digit()) {
        Some("numeric name collides with a positional placeholder")
    } else if name.as_bytes()[0].is_ascii_digit() {
        Some("name must not start with a digit")
    } else if !name
        .bytes()
        .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'$' || b == b'#')
    {
        Some("name contains characters outside [A-Za-z0-9_$#]")
    } else if seen.iter().any(|s| s.eq_ignore_ascii_case(name)) {
        Some("name is repeated")
    } else {
        None
    };
    match reason {
        Some(reason) => Err(Error::invalid_argument_name(name, reason)),
        None => Ok(()),
    }
}

/// Build the statement text for calling `name` and the ordered bind list.
///
/// The bind list holds the return slot (if any), then positional arguments,
/// then keyword arguments in slice order. Placeholder `:n` refers to the
/// n-th entry of that list.
pub fn build_call_statement<T, K>(
    name: &str,
    return_value: Option<T>,
    positional: &[T],
    named: &[(K, T)],
) -> Result<(String, Vec<T>)>
where
    T: Clone,
    K: AsRef<str>,
{
    let mut seen: Vec<&str> = Vec::with_capacity(named.len());
    for (keyword, _) in named {
        validate_keyword(keyword.as_ref(), &seen)?;
        seen.push(keyword.as_ref());
    }

    let mut binds = Vec::with_capacity(1 + positional.len() + named.len());
    let mut sql = String::from("begin ");
    if let Some(ret) = return_value {
        binds.push(ret);
        sql.push_str(":1 := ");
    }

    let mut args: Vec<String> = Vec::with_capacity(positional.len() + named.len());
    for value in positional {
        binds.push(value.clone());
        args.push(format!(":{}", binds.len()));
    }
    for (keyword, value) in named {
        binds.push(value.clone());
        args.push(format!("{}=>:{}", keyword.as_ref(), binds.len()));
    }

    // Writing into a String cannot fail.
    let _ = write!(sql, "{}({}); end;", name, args.join(", "));
    Ok((sql, binds))
}
