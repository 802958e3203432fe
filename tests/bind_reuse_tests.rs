//! Integration tests for bind validation and variable reuse across executes.

use std::sync::{Arc, Mutex};

use oracle_cursor::convert;
use oracle_cursor::native::memory::{MemoryClient, Outcome};
use oracle_cursor::native::NativeError;
use oracle_cursor::{Bind, Connection, Cursor, Error, OracleValue};

type Seen = Arc<Mutex<Vec<Vec<OracleValue>>>>;

const INSERT: &str = "INSERT INTO emp (empno, ename) VALUES (:1, :2)";
const UPDATE: &str = "UPDATE emp SET sal = :sal WHERE empno = :empno";

/// Client that records decoded bind values and rejects the value -1.
fn recording_client(statements: &[&str]) -> (MemoryClient, Seen) {
    let seen: Seen = Arc::new(Mutex::new(Vec::new()));
    let client = MemoryClient::new();
    for sql in statements {
        let record = Arc::clone(&seen);
        client.register_handler(sql, move |binds| {
            let values = binds
                .iter()
                .map(|b| convert::decode_value(b.ora_type_num, b.input()))
                .collect::<Result<Vec<_>, _>>()
                .map_err(|e| NativeError::new(932, e.to_string()))?;
            if values.contains(&OracleValue::Integer(-1)) {
                return Err(NativeError::new(1, "unique constraint (SCOTT.PK_EMP) violated"));
            }
            record.lock().unwrap().push(values);
            Ok(Outcome::RowsAffected(1))
        });
    }
    (client, seen)
}

fn cursor_for(client: &MemoryClient) -> Cursor {
    Connection::open(Arc::new(client.clone())).new_cursor()
}

fn int(v: i64) -> OracleValue {
    OracleValue::Integer(v)
}

fn text(s: &str) -> OracleValue {
    OracleValue::String(s.to_string())
}

#[test]
fn test_implicit_variables_reused_for_same_types() {
    let (client, seen) = recording_client(&[INSERT]);
    let mut cursor = cursor_for(&client);

    cursor.execute(INSERT, &[Bind::from(1), Bind::from("ab")], &[]).unwrap();
    let first = cursor.bind_vars().to_vec();
    cursor.execute(INSERT, &[Bind::from(2), Bind::from("abcdef")], &[]).unwrap();

    assert_eq!(cursor.bind_vars(), first.as_slice());
    assert_eq!(client.prepare_count(), 1);
    assert_eq!(
        *seen.lock().unwrap(),
        vec![vec![int(1), text("ab")], vec![int(2), text("abcdef")]]
    );
}

#[test]
fn test_type_change_replaces_implicit_variable() {
    let (client, seen) = recording_client(&[INSERT]);
    let mut cursor = cursor_for(&client);

    cursor.execute(INSERT, &[Bind::from(1), Bind::from("a")], &[]).unwrap();
    let first = cursor.bind_vars().to_vec();
    cursor.execute(INSERT, &[Bind::from(2.5), Bind::from("b")], &[]).unwrap();
    let second = cursor.bind_vars().to_vec();

    assert_ne!(first[0], second[0]);
    assert_eq!(first[1], second[1]);
    assert_eq!(seen.lock().unwrap()[1][0], OracleValue::Float(2.5));
}

#[test]
fn test_named_binds_follow_placeholder_order() {
    let (client, seen) = recording_client(&[UPDATE]);
    let mut cursor = cursor_for(&client);

    cursor
        .execute(UPDATE, &[], &[("empno", Bind::from(7369)), ("sal", Bind::from(800))])
        .unwrap();
    let first = cursor.bind_vars().to_vec();
    cursor
        .execute(UPDATE, &[], &[("SAL", Bind::from(900)), (":EMPNO", Bind::from(7499))])
        .unwrap();

    assert_eq!(cursor.bind_vars(), first.as_slice());
    assert_eq!(
        *seen.lock().unwrap(),
        vec![vec![int(800), int(7369)], vec![int(900), int(7499)]]
    );
}

#[test]
fn test_caller_variable_rebound_by_value_change() {
    let (client, seen) = recording_client(&[INSERT]);
    let mut cursor = cursor_for(&client);

    let empno = cursor.new_var(&int(1)).unwrap();
    cursor.execute(INSERT, &[Bind::from(empno), Bind::from("x")], &[]).unwrap();
    assert_eq!(cursor.bind_vars()[0], empno);

    cursor.set_var_value(empno, &int(2)).unwrap();
    cursor.execute(INSERT, &[Bind::from(&empno), Bind::from("y")], &[]).unwrap();

    let seen = seen.lock().unwrap();
    assert_eq!(seen[0][0], int(1));
    assert_eq!(seen[1][0], int(2));
}

#[test]
fn test_failed_execute_does_not_leak_binds() {
    let (client, seen) = recording_client(&[INSERT]);
    let mut cursor = cursor_for(&client);

    cursor.execute(INSERT, &[Bind::from(5), Bind::from("a")], &[]).unwrap();
    assert_eq!(cursor.bind_vars().len(), 2);

    match cursor.execute(INSERT, &[Bind::from(-1), Bind::from("b")], &[]) {
        Err(Error::Execution { code, .. }) => assert_eq!(code, 1),
        other => panic!("Expected Execution error, got {:?}", other),
    }
    assert!(cursor.bind_vars().is_empty());

    cursor.execute(INSERT, &[Bind::from(6), Bind::from("c")], &[]).unwrap();
    assert_eq!(cursor.bind_vars().len(), 2);
    assert_eq!(
        *seen.lock().unwrap(),
        vec![vec![int(5), text("a")], vec![int(6), text("c")]]
    );
    assert_eq!(client.prepare_count(), 1);
}

#[test]
fn test_released_implicit_variable_stays_released() {
    let sql = "UPDATE emp SET ename = :1";
    let (client, _seen) = recording_client(&[sql]);
    let mut cursor = cursor_for(&client);

    cursor.execute(sql, &[Bind::from(1)], &[]).unwrap();
    let released = cursor.bind_vars()[0];
    cursor.execute(sql, &[Bind::from("x")], &[]).unwrap();
    assert!(matches!(cursor.var_value(released), Err(Error::ClosedResource { .. })));

    // A new variable may take the freed slot; the old handle must not see it.
    let fresh = cursor.new_var(&OracleValue::Float(2.5)).unwrap();
    assert_ne!(fresh, released);
    assert_eq!(cursor.var_value(fresh).unwrap(), OracleValue::Float(2.5));
    assert!(matches!(cursor.var_value(released), Err(Error::ClosedResource { .. })));
    assert!(matches!(
        cursor.set_var_value(released, &int(3)),
        Err(Error::ClosedResource { .. })
    ));
    assert!(matches!(
        cursor.execute(sql, &[Bind::from(released)], &[]),
        Err(Error::ClosedResource { .. })
    ));
}

#[test]
fn test_null_binds() {
    let (client, seen) = recording_client(&[INSERT]);
    let mut cursor = cursor_for(&client);

    cursor
        .execute(INSERT, &[Bind::from(1), Bind::from(None::<String>)], &[])
        .unwrap();
    cursor
        .execute(INSERT, &[Bind::from(2), Bind::from(Some("late"))], &[])
        .unwrap();
    cursor
        .execute(INSERT, &[Bind::from(3), Bind::Value(OracleValue::Null)], &[])
        .unwrap();

    assert_eq!(
        *seen.lock().unwrap(),
        vec![
            vec![int(1), OracleValue::Null],
            vec![int(2), text("late")],
            vec![int(3), OracleValue::Null],
        ]
    );
}

#[test]
fn test_repeated_placeholder_in_sql_binds_each_occurrence() {
    let sql = "UPDATE emp SET mgr = :id WHERE empno = :id";
    let (client, seen) = recording_client(&[sql]);
    let mut cursor = cursor_for(&client);

    assert!(matches!(
        cursor.execute(sql, &[Bind::from(7839)], &[]),
        Err(Error::BindMismatch { .. })
    ));
    cursor.execute(sql, &[Bind::from(7839), Bind::from(7566)], &[]).unwrap();
    assert_eq!(cursor.bind_vars().len(), 2);
    cursor.execute(sql, &[], &[("id", Bind::from(7902))]).unwrap();
    assert_eq!(cursor.bind_vars().len(), 2);

    assert_eq!(
        *seen.lock().unwrap(),
        vec![vec![int(7839), int(7566)], vec![int(7902), int(7902)]]
    );
}

#[test]
fn test_repeated_placeholder_in_plsql_binds_once() {
    let sql = "begin :total := :total + :step; end;";
    let (client, seen) = recording_client(&[sql]);
    let mut cursor = cursor_for(&client);

    cursor.execute(sql, &[Bind::from(10), Bind::from(5)], &[]).unwrap();
    assert_eq!(cursor.bind_vars().len(), 2);
    assert_eq!(seen.lock().unwrap()[0], vec![int(10), int(5)]);
}

#[test]
fn test_quoted_placeholder_is_case_sensitive() {
    let sql = r#"UPDATE emp SET comm = :"Comm" WHERE empno = :empno"#;
    let (client, _seen) = recording_client(&[sql]);
    let mut cursor = cursor_for(&client);

    cursor
        .execute(sql, &[], &[("Comm", Bind::from(10)), ("empno", Bind::from(1))])
        .unwrap();
    assert!(matches!(
        cursor.execute(sql, &[], &[("COMM", Bind::from(10)), ("empno", Bind::from(1))]),
        Err(Error::BindMismatch { .. })
    ));
}

#[test]
fn test_bind_mismatches() {
    let (client, _seen) = recording_client(&[INSERT, UPDATE]);
    let mut cursor = cursor_for(&client);
    let mismatch = |r: oracle_cursor::Result<()>| matches!(r, Err(Error::BindMismatch { .. }));

    assert!(mismatch(cursor.execute(INSERT, &[Bind::from(1)], &[])));
    assert!(mismatch(cursor.execute(
        INSERT,
        &[Bind::from(1), Bind::from("a"), Bind::from("b")],
        &[]
    )));
    assert!(mismatch(cursor.execute(
        UPDATE,
        &[Bind::from(1)],
        &[("empno", Bind::from(1))]
    )));
    assert!(mismatch(cursor.execute(UPDATE, &[], &[("sal", Bind::from(1))])));
    assert!(mismatch(cursor.execute(
        UPDATE,
        &[],
        &[("sal", Bind::from(1)), ("empno", Bind::from(2)), ("bonus", Bind::from(3))]
    )));
    assert_eq!(client.prepare_count(), 0);
    assert_eq!(client.open_cursors(), 0);
}

#[test]
fn test_variable_of_closed_cursor_rejected_elsewhere() {
    let (client, _seen) = recording_client(&[INSERT]);
    let mut owner = cursor_for(&client);
    let mut other = cursor_for(&client);

    let var = owner.new_var(&int(1)).unwrap();
    owner.close().unwrap();
    assert!(matches!(
        other.execute(INSERT, &[Bind::from(var), Bind::from("a")], &[]),
        Err(Error::BindMismatch { .. })
    ));
}

#[test]
fn test_new_var_rejects_null() {
    let (client, _seen) = recording_client(&[]);
    let mut cursor = cursor_for(&client);
    assert!(matches!(
        cursor.new_var(&OracleValue::Null),
        Err(Error::UnsupportedType { .. })
    ));
}
