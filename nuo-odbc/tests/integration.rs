mod common;

use std::ptr::{null, null_mut};

use nuo_odbc::{
    handles::{AsHandle, State},
    remote::memory::{Column, MemoryDatabase, Script, Table, Value},
    sys::{Pointer, SqlReturn},
};

use common::{connect, cursor_to_string, environment, exec_direct, first_state};

fn players() -> Table {
    Table::new(vec![Column::new("NAME", 12), Column::new("NUMBER", 4)])
        .row(vec![Value::from("Gretzky"), Value::Int(99)])
        .row(vec![Value::from("Unknown"), Value::Null])
}

#[test]
fn query_through_every_handle() {
    let db = MemoryDatabase::new();
    db.require_credentials("dba", "goalie");
    db.script("SELECT name, number FROM players", Script::query(players()));
    let mut env = environment(&db);

    let conn = connect(&mut env, "DSN=Local");
    let (stmt, ret) = exec_direct(&mut env, conn, "SELECT name, number FROM players");
    assert_eq!(SqlReturn::SUCCESS, ret);

    let stmt = env.connection_mut(conn).unwrap().statement_mut(stmt).unwrap();
    assert_eq!("Gretzky,99\nUnknown,NULL", cursor_to_string(stmt));
    assert_eq!("test@localhost:48004", db.logins()[0].database);
}

#[test]
fn describe_columns_of_result_set() {
    let db = MemoryDatabase::new();
    db.script("SELECT name, number FROM players", Script::query(players()));
    let mut env = environment(&db);
    let conn = connect(&mut env, "DSN=Local");
    let (stmt, _) = exec_direct(&mut env, conn, "SELECT name, number FROM players");
    let stmt = env.connection_mut(conn).unwrap().statement_mut(stmt).unwrap();
    let mut name = [0u8; 32];
    let mut name_length = 0;

    let ret = unsafe {
        stmt.describe_col(
            2,
            name.as_mut_ptr(),
            name.len() as i16,
            &mut name_length,
            null_mut(),
            null_mut(),
            null_mut(),
            null_mut(),
        )
    };

    assert_eq!(SqlReturn::SUCCESS, ret);
    assert_eq!(b"NUMBER", &name[..name_length as usize]);
    assert_eq!(2, stmt.num_result_cols().unwrap());
}

#[test]
fn environment_ends_transactions_of_all_connections() {
    let db = MemoryDatabase::new();
    let mut env = environment(&db);
    let id = connect(&mut env, "DSN=Local");
    let conn = env.connection_mut(id).unwrap();
    // SQL_ATTR_AUTOCOMMIT off
    assert_eq!(SqlReturn::SUCCESS, unsafe {
        conn.set_connect_attr(102, 0 as Pointer, 0)
    });
    exec_direct(&mut env, id, "UPDATE players SET number = 66");

    let conn = env.connection_mut(id).unwrap();
    assert_eq!(SqlReturn::ERROR, conn.disconnect());
    assert_eq!(State::INVALID_STATE_TRANSACTION, first_state(conn));

    assert_eq!(SqlReturn::SUCCESS, env.end_tran(0));
    assert_eq!(1, db.commits());

    assert_eq!(SqlReturn::SUCCESS, env.connection_mut(id).unwrap().disconnect());
    assert_eq!(SqlReturn::SUCCESS, env.free_connection(id));
    assert_eq!(0, db.open_connections());
    assert!(!db.auto_commit());
}

#[test]
fn diagnostics_are_consumed_oldest_first() {
    let db = MemoryDatabase::new();
    let mut env = environment(&db);
    let id = env.alloc_connection();
    let conn = env.connection_mut(id).unwrap();
    let mut state = [0u8; 6];
    let mut native_error = 0;
    let mut message = [0u8; 256];
    let mut text_length = 0;

    assert_eq!(SqlReturn::ERROR, conn.disconnect());
    let ret = unsafe {
        conn.get_diag_rec(
            1,
            state.as_mut_ptr(),
            &mut native_error,
            message.as_mut_ptr(),
            message.len() as i16,
            &mut text_length,
        )
    };

    assert_eq!(SqlReturn::SUCCESS, ret);
    assert_eq!(b"08003\0", &state);
    assert_eq!(0, native_error);
    assert_eq!(
        "Connection not open",
        String::from_utf8_lossy(&message[..text_length as usize])
    );
    let ret = unsafe {
        conn.get_diag_rec(
            1,
            state.as_mut_ptr(),
            &mut native_error,
            message.as_mut_ptr(),
            message.len() as i16,
            &mut text_length,
        )
    };
    assert_eq!(SqlReturn::NO_DATA, ret);
}

#[test]
fn database_product_name() {
    let db = MemoryDatabase::new();
    let mut env = environment(&db);
    let id = connect(&mut env, "DSN=Local");
    let conn = env.connection_mut(id).unwrap();
    let mut name = [0u8; 32];
    let mut length = 0;

    // SQL_DBMS_NAME
    let ret = unsafe { conn.get_info(17, name.as_mut_ptr() as Pointer, 32, &mut length) };

    assert_eq!(SqlReturn::SUCCESS, ret);
    assert_eq!(b"NuoDB", &name[..length as usize]);
}

#[test]
fn tables_of_the_catalog() {
    let db = MemoryDatabase::new();
    db.create_table("HOCKEY", "PLAYERS", vec![Column::new("NAME", 12)]);
    let mut env = environment(&db);
    let id = connect(&mut env, "DSN=Local");
    let conn = env.connection_mut(id).unwrap();
    let stmt_id = conn.alloc_statement().unwrap();
    let stmt = conn.statement_mut(stmt_id).unwrap();

    let ret = unsafe { stmt.tables(null(), 0, null(), 0, null(), 0, null(), 0) };

    assert_eq!(SqlReturn::SUCCESS, ret);
    assert_eq!("NULL,HOCKEY,PLAYERS,TABLE,NULL", cursor_to_string(stmt));
}

#[test]
fn freed_statements_release_their_cursor() {
    let db = MemoryDatabase::new();
    db.script("SELECT name, number FROM players", Script::query(players()));
    let mut env = environment(&db);
    let id = connect(&mut env, "DSN=Local");
    let (stmt, _) = exec_direct(&mut env, id, "SELECT name, number FROM players");
    let conn = env.connection_mut(id).unwrap();

    assert_eq!(SqlReturn::SUCCESS, conn.free_statement(stmt));

    assert!(conn.statement_mut(stmt).is_none());
    assert_eq!(SqlReturn::INVALID_HANDLE, conn.free_statement(stmt));
    assert_eq!(SqlReturn::SUCCESS, conn.disconnect());
}
