//! Test for logging is isolated in its own module to avoid messing with the global settings of
//! other, non-logging related tests.
use std::sync::Arc;

use log::Level;
use nuo_odbc::{
    Environment, MemoryDsnStore,
    remote::{
        RemoteError, codes,
        memory::{MemoryDatabase, Script},
    },
    sys::SqlReturn,
};

#[test]
fn emit_a_warning_for_each_error_posted() {
    // Given a statement which fails in the database
    let db = MemoryDatabase::new();
    db.script(
        "DROP TABLE players",
        Script::failure(RemoteError::new(codes::NO_SUCH_TABLE, "can't find table PLAYERS")),
    );
    let store = MemoryDsnStore::new().with("Local", "Database", "test");
    let mut env = Environment::new(Arc::new(db), Arc::new(store));
    let id = env.alloc_connection();
    let conn = env.connection_mut(id).unwrap();
    let text = "DSN=Local";
    unsafe {
        conn.driver_connect(
            std::ptr::null_mut(),
            text.as_ptr(),
            text.len() as i16,
            std::ptr::null_mut(),
            0,
            std::ptr::null_mut(),
            0,
        )
    };
    let stmt_id = conn.alloc_statement().unwrap();
    let stmt = conn.statement_mut(stmt_id).unwrap();

    testing_logger::setup();

    // When executing it
    let sql = "DROP TABLE players";
    let ret = unsafe { stmt.exec_direct(sql.as_ptr(), sql.len() as i32) };

    // The error is logged as a warning, before the application asks for it
    assert_eq!(SqlReturn::ERROR, ret);
    testing_logger::validate(|captured_logs| {
        let warnings: Vec<_> = captured_logs
            .iter()
            .filter(|log| log.level == Level::Warn)
            .collect();
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].body.contains("42S02"));
        assert!(warnings[0].body.contains("can't find table PLAYERS"));
    });
}
