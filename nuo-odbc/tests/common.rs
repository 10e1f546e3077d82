use std::{ptr::null_mut, sync::Arc};

use nuo_odbc::{
    ConnectionId, Environment, MemoryDsnStore, Statement, StatementId,
    handles::{AsHandle, State},
    remote::memory::MemoryDatabase,
    sys::{Len, Pointer, SqlReturn},
};

const SQL_C_CHAR: i16 = 1;

pub fn init() {
    // Set environment to something like:
    // RUST_LOG=nuo_odbc=debug cargo test
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Data sources known to the tests: `Local` points to the database `test` on localhost.
pub fn dsn_store() -> MemoryDsnStore {
    MemoryDsnStore::new()
        .with("Local", "Database", "test")
        .with("Local", "ServerName", "localhost")
        .with("Local", "Port", "48004")
        .with("Local", "User", "dba")
        .with("Local", "Password", "goalie")
}

pub fn environment(db: &MemoryDatabase) -> Environment {
    init();
    Environment::new(Arc::new(db.clone()), Arc::new(dsn_store()))
}

/// Allocates a connection and opens it with `SQLDriverConnect`.
pub fn connect(env: &mut Environment, connection_string: &str) -> ConnectionId {
    let id = env.alloc_connection();
    let conn = env.connection_mut(id).unwrap();
    let ret = unsafe {
        conn.driver_connect(
            null_mut(),
            connection_string.as_ptr(),
            connection_string.len() as i16,
            null_mut(),
            0,
            null_mut(),
            0,
        )
    };
    assert_eq!(SqlReturn::SUCCESS, ret);
    id
}

/// Allocates a statement on connection `id` and executes `sql` on it.
pub fn exec_direct(env: &mut Environment, id: ConnectionId, sql: &str) -> (StatementId, SqlReturn) {
    let conn = env.connection_mut(id).unwrap();
    let stmt_id = conn.alloc_statement().unwrap();
    let stmt = conn.statement_mut(stmt_id).unwrap();
    let ret = unsafe { stmt.exec_direct(sql.as_ptr(), sql.len() as i32) };
    (stmt_id, ret)
}

/// Fetches every row of the current result set, the columns rendered as text and joined by
/// commas. `NULL` is rendered as `NULL`.
pub fn cursor_to_string(stmt: &mut Statement) -> String {
    let columns = stmt.num_result_cols().unwrap() as u16;
    let mut rows = Vec::new();
    while stmt.fetch() == SqlReturn::SUCCESS {
        let row: Vec<String> = (1..=columns).map(|column| get_text(stmt, column)).collect();
        rows.push(row.join(","));
    }
    rows.join("\n")
}

pub fn get_text(stmt: &mut Statement, column: u16) -> String {
    let mut buffer = [0u8; 256];
    let mut indicator: Len = 0;
    let ret = unsafe {
        stmt.get_data(
            column,
            SQL_C_CHAR,
            buffer.as_mut_ptr() as Pointer,
            buffer.len() as Len,
            &mut indicator,
        )
    };
    assert_eq!(SqlReturn::SUCCESS, ret);
    if indicator < 0 {
        "NULL".to_owned()
    } else {
        String::from_utf8_lossy(&buffer[..indicator as usize]).into_owned()
    }
}

pub fn first_state(handle: &impl AsHandle) -> State {
    handle.error_queue().get(1).unwrap().state
}
