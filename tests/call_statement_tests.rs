//! Integration tests for stored procedure and function calls.

use std::sync::{Arc, Mutex};

use oracle_cursor::convert;
use oracle_cursor::native::constants::*;
use oracle_cursor::native::memory::{MemoryClient, Outcome, ResultSet};
use oracle_cursor::{
    build_call_statement, Bind, ColumnMetadata, Connection, Error, OracleValue, RefCursor, VarType,
};

fn decode(bind: &oracle_cursor::native::NativeBind) -> OracleValue {
    convert::decode_value(bind.ora_type_num, bind.input()).unwrap()
}

#[test]
fn test_call_statement_scenarios() {
    let no_kwargs: &[(&str, i32)] = &[];
    let (sql, binds) = build_call_statement("Func", Some(0), &[], no_kwargs).unwrap();
    assert_eq!(sql, "begin :1 := Func(); end;");
    assert_eq!(binds, vec![0]);

    let (sql, binds) = build_call_statement("Func", Some(0), &[1], &[("keyarg1", 2)]).unwrap();
    assert_eq!(sql, "begin :1 := Func(:2, keyarg1=>:3); end;");
    assert_eq!(binds, vec![0, 1, 2]);

    let (sql, binds) = build_call_statement("Proc", None, &[], &[("keyarg1", 1)]).unwrap();
    assert_eq!(sql, "begin Proc(keyarg1=>:1); end;");
    assert_eq!(binds, vec![1]);
}

#[test]
fn test_call_statement_keyword_order_follows_caller() {
    let named = [("zeta", 1), ("alpha", 2), ("mid", 3)];
    let (sql, binds) = build_call_statement("pkg.Proc", None, &[0], &named).unwrap();
    assert_eq!(sql, "begin pkg.Proc(:1, zeta=>:2, alpha=>:3, mid=>:4); end;");
    assert_eq!(binds, vec![0, 1, 2, 3]);
}

#[test]
fn test_call_statement_invalid_keyword() {
    for bad in ["", ":x", "1st", "a-b", "42"] {
        let result = build_call_statement("Proc", None::<i32>, &[], &[(bad, 1)]);
        assert!(
            matches!(result, Err(Error::InvalidArgumentName { .. })),
            "{:?} accepted",
            bad
        );
    }
    let result = build_call_statement("Proc", None::<i32>, &[], &[("a", 1), ("A", 2)]);
    assert!(matches!(result, Err(Error::InvalidArgumentName { .. })));
}

#[test]
fn test_call_func_round_trips_large_integer() {
    let client = MemoryClient::new();
    client.register_handler("begin :1 := echo(:2); end;", |binds| {
        let input = binds[1].input().map(|b| b.to_vec());
        binds[0].set_output(input.as_deref())?;
        Ok(Outcome::RowsAffected(1))
    });
    let conn = Connection::open(Arc::new(client));
    let mut cursor = conn.new_cursor();

    let value = cursor
        .call_func("echo", VarType::Number, &[Bind::from(1234567890123i64)], &[])
        .unwrap();
    assert_eq!(value, OracleValue::Integer(1234567890123));

    let value = cursor
        .call_func("echo", VarType::Number, &[Bind::from(None::<i64>)], &[])
        .unwrap();
    assert_eq!(value, OracleValue::Null);
}

#[test]
fn test_call_func_with_keyword_arguments() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let client = MemoryClient::new();
    let record = Arc::clone(&seen);
    client.register_handler(
        "begin :1 := greet(:2, title=>:3, punct=>:4); end;",
        move |binds| {
            let args: Vec<OracleValue> = binds[1..].iter().map(decode).collect();
            let text = format!("{} {}{}", args[1], args[0], args[2]);
            binds[0].set_output(Some(text.as_bytes()))?;
            record.lock().unwrap().push(args);
            Ok(Outcome::RowsAffected(1))
        },
    );
    let conn = Connection::open(Arc::new(client.clone()));
    let mut cursor = conn.new_cursor();

    let greeting = cursor
        .call_func(
            "greet",
            VarType::String,
            &[Bind::from("Smith")],
            &[("title", Bind::from("Dr.")), ("punct", Bind::from("!"))],
        )
        .unwrap();
    assert_eq!(greeting, OracleValue::String("Dr. Smith!".into()));
    assert_eq!(seen.lock().unwrap().len(), 1);
    assert_eq!(
        client.executed_statements(),
        vec!["begin :1 := greet(:2, title=>:3, punct=>:4); end;"]
    );
}

#[test]
fn test_call_proc_fills_out_variable() {
    let client = MemoryClient::new();
    client.register_handler("begin get_name(:1, :2); end;", |binds| {
        let name = match decode(&binds[0]) {
            OracleValue::Integer(7369) => "SMITH",
            _ => "UNKNOWN",
        };
        binds[1].set_output(Some(name.as_bytes()))?;
        Ok(Outcome::RowsAffected(1))
    });
    let conn = Connection::open(Arc::new(client));
    let mut cursor = conn.new_cursor();

    let out = cursor.new_var_typed(VarType::String, 20).unwrap();
    cursor
        .call_proc("get_name", &[Bind::from(7369), Bind::from(out)], &[])
        .unwrap();
    assert_eq!(cursor.var_value(out).unwrap(), OracleValue::String("SMITH".into()));

    cursor
        .call_proc("get_name", &[Bind::from(1), Bind::from(out)], &[])
        .unwrap();
    assert_eq!(cursor.var_value(out).unwrap(), OracleValue::String("UNKNOWN".into()));
}

#[test]
fn test_out_variable_too_small() {
    let client = MemoryClient::new();
    client.register_handler("begin get_name(:1); end;", |binds| {
        binds[0].set_output(Some(b"MILLER".as_slice()))?;
        Ok(Outcome::RowsAffected(1))
    });
    let conn = Connection::open(Arc::new(client));
    let mut cursor = conn.new_cursor();

    let out = cursor.new_var_typed(VarType::String, 3).unwrap();
    let err = cursor.call_proc("get_name", &[Bind::from(out)], &[]).unwrap_err();
    assert_eq!(err.oracle_code(), Some(ORA_ERR_VALUE_ERROR));
    assert!(cursor.bind_vars().is_empty());
    assert!(cursor.var(out).unwrap().is_null());
}

#[test]
fn test_fixed_char_output_truncated() {
    let client = MemoryClient::new();
    client.register_handler("begin get_code(:1); end;", |binds| {
        binds[0].set_output(Some(b"ABCDEF".as_slice()))?;
        Ok(Outcome::RowsAffected(1))
    });
    let conn = Connection::open(Arc::new(client));
    let mut cursor = conn.new_cursor();

    let out = cursor.new_var_typed(VarType::FixedChar, 4).unwrap();
    cursor.call_proc("get_code", &[Bind::from(out)], &[]).unwrap();
    assert_eq!(cursor.var_value(out).unwrap(), OracleValue::String("ABCD".into()));
}

#[test]
fn test_unknown_procedure() {
    let conn = Connection::open(Arc::new(MemoryClient::new()));
    let mut cursor = conn.new_cursor();
    match cursor.call_proc("no_such_proc", &[], &[]) {
        Err(Error::Execution { code, .. }) => assert_eq!(code, ORA_ERR_PLSQL_COMPILATION),
        other => panic!("Expected Execution error, got {:?}", other),
    }
}

#[test]
fn test_ref_cursor_from_function() {
    let client = MemoryClient::new();
    client.register_ref_cursor(
        42,
        ResultSet::new(vec![
            ColumnMetadata::new("DEPTNO", ORA_TYPE_NUM_NUMBER),
            ColumnMetadata::new("DNAME", ORA_TYPE_NUM_VARCHAR),
        ])
        .with_rows([
            vec![OracleValue::Integer(10), OracleValue::String("ACCOUNTING".into())],
            vec![OracleValue::Integer(20), OracleValue::String("RESEARCH".into())],
        ]),
    );
    client.register_handler("begin :1 := open_depts(); end;", |binds| {
        let id = convert::encode_value(ORA_TYPE_NUM_CURSOR, &OracleValue::Cursor(RefCursor::new(42)))
            .ok()
            .flatten()
            .unwrap_or_default();
        binds[0].set_output(Some(&id[..]))?;
        Ok(Outcome::RowsAffected(1))
    });
    let conn = Connection::open(Arc::new(client.clone()));
    let mut cursor = conn.new_cursor();

    let value = cursor.call_func("open_depts", VarType::Cursor, &[], &[]).unwrap();
    let ref_cursor = value.as_cursor().unwrap();
    assert_eq!(ref_cursor, RefCursor::new(42));

    let mut depts = cursor.open_ref_cursor(&ref_cursor).unwrap();
    assert_eq!(depts.describe().unwrap().len(), 2);
    let rows = depts.fetch_all().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[1].get_as::<String>(1).unwrap(), "RESEARCH");
    assert_eq!(client.open_cursors(), 2);

    depts.close().unwrap();
    assert_eq!(client.open_cursors(), 1);

    // A REF CURSOR can only be adopted once.
    let err = cursor.open_ref_cursor(&ref_cursor).unwrap_err();
    assert_eq!(err.oracle_code(), Some(ORA_ERR_INVALID_CURSOR));
}
