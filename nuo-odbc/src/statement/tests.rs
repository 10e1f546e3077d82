use std::{
    mem::size_of,
    ptr::{addr_of_mut, null, null_mut},
    sync::Arc,
};

use odbc_sys::{DATA_AT_EXEC, Len, NTS, NULL_DATA, Pointer, SqlReturn, len_data_at_exec};

use crate::{
    bindings::DataAtExec,
    connection::Session,
    handles::{AsHandle, State},
    remote::{
        Driver, Properties, RemoteError, codes,
        memory::{Column, MemoryDatabase, Script, Table, Value},
    },
};

use super::Statement;

const SQL_C_CHAR: i16 = 1;
const SQL_C_SLONG: i16 = -16;
const SQL_VARCHAR: i16 = 12;
const SQL_INTEGER: i16 = 4;
const SQL_PARAM_INPUT: i16 = 1;
const SQL_PARAM_OUTPUT: i16 = 4;

fn statement_with(db: &MemoryDatabase, auto_commit: bool) -> Statement {
    let remote = db.connect("test", &Properties::new()).unwrap();
    Statement::new(Arc::new(Session::new(remote, auto_commit)))
}

fn statement(db: &MemoryDatabase) -> Statement {
    statement_with(db, true)
}

fn exec(stmt: &mut Statement, sql: &str) -> SqlReturn {
    unsafe { stmt.exec_direct(sql.as_ptr(), sql.len() as i32) }
}

fn first_state(stmt: &Statement) -> State {
    stmt.error_queue().get(1).unwrap().state
}

fn names() -> Table {
    Table::new(vec![Column::new("NAME", 12)])
        .row(vec![Value::from("alpha")])
        .row(vec![Value::from("beta")])
        .row(vec![Value::from("gamma")])
}

/// Reads a character column of the current row with a single call to `SQLGetData`.
fn get_text(stmt: &mut Statement, column: u16) -> String {
    let mut buffer = [0u8; 64];
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
    String::from_utf8_lossy(&buffer[..indicator as usize]).into_owned()
}

fn get_int(stmt: &mut Statement, column: u16) -> i32 {
    let mut value = 0i32;
    let mut indicator: Len = 0;
    let ret = unsafe {
        stmt.get_data(
            column,
            SQL_C_SLONG,
            (&mut value as *mut i32).cast(),
            0,
            &mut indicator,
        )
    };
    assert_eq!(SqlReturn::SUCCESS, ret);
    value
}

#[test]
fn bound_columns_receive_each_row() {
    let db = MemoryDatabase::new();
    db.script("SELECT name FROM t", Script::query(names()));
    let mut stmt = statement(&db);
    let mut buffer = [0u8; 16];
    let mut indicator: Len = 0;

    assert_eq!(SqlReturn::SUCCESS, exec(&mut stmt, "SELECT name FROM t"));
    let ret = unsafe {
        stmt.bind_col(
            1,
            SQL_C_CHAR,
            buffer.as_mut_ptr() as Pointer,
            buffer.len() as Len,
            &mut indicator,
        )
    };
    assert_eq!(SqlReturn::SUCCESS, ret);

    let mut fetched = Vec::new();
    while stmt.fetch() == SqlReturn::SUCCESS {
        fetched.push(String::from_utf8_lossy(&buffer[..indicator as usize]).into_owned());
    }

    assert_eq!(vec!["alpha", "beta", "gamma"], fetched);
    assert_eq!(SqlReturn::NO_DATA, stmt.fetch());
}

#[test]
fn get_data_in_chunks() {
    let db = MemoryDatabase::new();
    db.script(
        "SELECT greeting",
        Script::query(Table::new(vec![Column::new("GREETING", 12)]).row(vec![Value::from("hello")])),
    );
    let mut stmt = statement(&db);
    exec(&mut stmt, "SELECT greeting");
    assert_eq!(SqlReturn::SUCCESS, stmt.fetch());
    let mut buffer = [b'x'; 2];
    let mut indicator: Len = 0;
    let get_data = |stmt: &mut Statement, buffer: &mut [u8; 2], indicator: &mut Len| unsafe {
        stmt.get_data(1, SQL_C_CHAR, buffer.as_mut_ptr() as Pointer, 2, indicator)
    };

    let ret = get_data(&mut stmt, &mut buffer, &mut indicator);

    assert_eq!(SqlReturn::SUCCESS_WITH_INFO, ret);
    assert_eq!(b"h\0", &buffer);
    assert_eq!(5, indicator);
    assert_eq!(State::STRING_DATA_RIGHT_TRUNCATION, first_state(&stmt));

    let mut rest = Vec::new();
    let mut available = Vec::new();
    while get_data(&mut stmt, &mut buffer, &mut indicator) != SqlReturn::NO_DATA {
        rest.push(buffer[0]);
        available.push(indicator);
    }
    assert_eq!(b"ello", rest.as_slice());
    assert_eq!(vec![4, 3, 2, 1], available);
}

#[test]
fn null_values() {
    let db = MemoryDatabase::new();
    db.script(
        "SELECT nothing",
        Script::query(Table::new(vec![Column::new("NOTHING", 12)]).row(vec![Value::Null])),
    );
    let mut stmt = statement(&db);
    exec(&mut stmt, "SELECT nothing");
    stmt.fetch();
    let mut buffer = [0u8; 8];
    let mut indicator: Len = 0;

    let ret = unsafe {
        stmt.get_data(1, SQL_C_CHAR, buffer.as_mut_ptr() as Pointer, 8, &mut indicator)
    };
    assert_eq!(SqlReturn::SUCCESS, ret);
    assert_eq!(NULL_DATA, indicator);

    exec(&mut stmt, "SELECT nothing");
    stmt.fetch();
    let ret =
        unsafe { stmt.get_data(1, SQL_C_CHAR, buffer.as_mut_ptr() as Pointer, 8, null_mut()) };
    assert_eq!(SqlReturn::ERROR, ret);
    assert_eq!(
        State::INDICATOR_VARIABLE_REQUIRED_BUT_NOT_SUPPLIED,
        first_state(&stmt)
    );
}

#[test]
fn bound_parameters_are_sent_on_execute() {
    let db = MemoryDatabase::new();
    let sql = "INSERT INTO t VALUES (?, ?)";
    let mut stmt = statement(&db);
    let text = b"abc\0";
    let mut nts: Len = NTS;
    let mut number = 7i32;
    let number: *mut i32 = &mut number;

    unsafe {
        assert_eq!(SqlReturn::SUCCESS, stmt.prepare(sql.as_ptr(), sql.len() as i32));
        stmt.bind_parameter(
            1,
            SQL_PARAM_INPUT,
            SQL_C_CHAR,
            SQL_VARCHAR,
            0,
            0,
            text.as_ptr() as Pointer,
            0,
            &mut nts,
        );
        stmt.bind_parameter(
            2,
            SQL_PARAM_INPUT,
            SQL_C_SLONG,
            SQL_INTEGER,
            0,
            0,
            number.cast(),
            0,
            null_mut(),
        );
    }
    assert_eq!(SqlReturn::SUCCESS, stmt.execute());
    unsafe { *number = 8 };
    assert_eq!(SqlReturn::SUCCESS, stmt.execute());

    let executions = db.executions();
    assert_eq!(2, executions.len());
    assert_eq!(Some(&Value::from("abc")), executions[0].parameters.get(&1));
    assert_eq!(Some(&Value::Int(7)), executions[0].parameters.get(&2));
    assert_eq!(Some(&Value::Int(8)), executions[1].parameters.get(&2));
    assert_eq!(sql, stmt.sql());
}

/// Binds parameter 1 of `sql` as data at execution and executes. `token` is handed back by
/// `SQLParamData`.
fn execute_data_at_exec(stmt: &mut Statement, sql: &str, indicator: &mut Len, token: usize) {
    unsafe {
        stmt.prepare(sql.as_ptr(), sql.len() as i32);
        stmt.bind_parameter(
            1,
            SQL_PARAM_INPUT,
            SQL_C_CHAR,
            SQL_VARCHAR,
            0,
            0,
            token as Pointer,
            0,
            indicator,
        );
    }
    assert_eq!(SqlReturn::NEED_DATA, stmt.execute());
}

#[test]
fn data_at_execution_is_assembled_from_chunks() {
    let db = MemoryDatabase::new();
    let mut stmt = statement(&db);
    let mut indicator = DATA_AT_EXEC;
    execute_data_at_exec(&mut stmt, "INSERT INTO t VALUES (?)", &mut indicator, 42);
    let mut token: Pointer = null_mut();

    unsafe {
        assert_eq!(SqlReturn::NEED_DATA, stmt.param_data(&mut token));
        assert_eq!(42, token as usize);
        assert_eq!(SqlReturn::SUCCESS, stmt.put_data(b"ab".as_ptr() as Pointer, 2));
        assert_eq!(SqlReturn::SUCCESS, stmt.put_data(b"cd".as_ptr() as Pointer, 2));
        assert_eq!(SqlReturn::SUCCESS, stmt.param_data(&mut token));
    }

    let executions = db.executions();
    assert_eq!(1, executions.len());
    assert_eq!(Some(&Value::from("abcd")), executions[0].parameters.get(&1));
}

#[test]
fn data_at_execution_without_data_is_null() {
    let db = MemoryDatabase::new();
    let mut stmt = statement(&db);
    let mut indicator = DATA_AT_EXEC;
    execute_data_at_exec(&mut stmt, "INSERT INTO t VALUES (?)", &mut indicator, 1);
    let mut token: Pointer = null_mut();

    unsafe {
        assert_eq!(SqlReturn::NEED_DATA, stmt.param_data(&mut token));
        assert_eq!(SqlReturn::SUCCESS, stmt.param_data(&mut token));
    }

    assert_eq!(Some(&Value::Null), db.executions()[0].parameters.get(&1));
}

#[test]
fn data_beyond_announced_length_is_truncated() {
    let db = MemoryDatabase::new();
    let mut stmt = statement(&db);
    let mut indicator = len_data_at_exec(3);
    execute_data_at_exec(&mut stmt, "INSERT INTO t VALUES (?)", &mut indicator, 1);
    let mut token: Pointer = null_mut();

    unsafe {
        stmt.param_data(&mut token);
        let ret = stmt.put_data(b"abcdef".as_ptr() as Pointer, 6);
        assert_eq!(SqlReturn::SUCCESS_WITH_INFO, ret);
        assert_eq!(State::STRING_DATA_RIGHT_TRUNCATION, first_state(&stmt));
        assert_eq!(SqlReturn::SUCCESS, stmt.param_data(&mut token));
    }

    assert_eq!(Some(&Value::from("abc")), db.executions()[0].parameters.get(&1));
}

#[test]
fn terminated_chunk_completes_announced_length() {
    let db = MemoryDatabase::new();
    let mut stmt = statement(&db);
    let mut indicator = len_data_at_exec(10);
    execute_data_at_exec(&mut stmt, "INSERT INTO t VALUES (?)", &mut indicator, 1);
    let mut token: Pointer = null_mut();

    unsafe {
        stmt.param_data(&mut token);
        let ret = stmt.put_data(b"abc\0".as_ptr() as Pointer, NTS);
        assert_eq!(SqlReturn::SUCCESS, ret);
    }

    let slot = stmt.parameters.get(1).unwrap();
    assert_eq!(Some(DataAtExec::Remaining(0)), slot.data_at_exec);
    assert_eq!(SqlReturn::SUCCESS, unsafe { stmt.param_data(&mut token) });
    assert_eq!(Some(&Value::from("abc")), db.executions()[0].parameters.get(&1));
}

#[test]
fn put_data_before_param_data() {
    let db = MemoryDatabase::new();
    let mut stmt = statement(&db);
    let mut indicator = DATA_AT_EXEC;
    execute_data_at_exec(&mut stmt, "INSERT INTO t VALUES (?)", &mut indicator, 1);

    let ret = unsafe { stmt.put_data(b"ab".as_ptr() as Pointer, 2) };

    assert_eq!(SqlReturn::ERROR, ret);
    assert_eq!(State::FUNCTION_SEQUENCE_ERROR, first_state(&stmt));
    assert!(db.executions().is_empty());
}

#[test]
fn max_rows_caps_the_result_set() {
    let db = MemoryDatabase::new();
    db.script("SELECT name FROM t", Script::query(names()));
    let mut stmt = statement(&db);

    unsafe { stmt.set_stmt_attr(1, 2 as Pointer, 0) };
    exec(&mut stmt, "SELECT name FROM t");

    assert_eq!(SqlReturn::SUCCESS, stmt.fetch());
    assert_eq!(SqlReturn::SUCCESS, stmt.fetch());
    assert_eq!(SqlReturn::NO_DATA, stmt.fetch());
}

#[test]
fn rowset_with_status_array() {
    let db = MemoryDatabase::new();
    db.script(
        "SELECT id FROM t",
        Script::query(
            Table::new(vec![Column::new("ID", 4)])
                .row(vec![Value::Int(1)])
                .row(vec![Value::Int(2)]),
        ),
    );
    let mut stmt = statement(&db);
    let mut ids = [0i32; 3];
    let mut indicators: [Len; 3] = [0; 3];
    let mut status = [9u16; 3];
    let mut fetched = 0usize;

    unsafe {
        stmt.set_stmt_attr(27, 3 as Pointer, 0);
        stmt.set_stmt_attr(26, (&mut fetched as *mut usize).cast(), 0);
        stmt.set_stmt_attr(25, status.as_mut_ptr() as Pointer, 0);
        exec(&mut stmt, "SELECT id FROM t");
        stmt.bind_col(1, SQL_C_SLONG, ids.as_mut_ptr() as Pointer, 4, indicators.as_mut_ptr());
    }

    assert_eq!(SqlReturn::SUCCESS, stmt.fetch());
    assert_eq!(2, fetched);
    assert_eq!([1, 2, 0], ids);
    assert_eq!([4, 4, 0], indicators);
    assert_eq!([0, 0, 3], status);
    assert_eq!(SqlReturn::NO_DATA, stmt.fetch());
}

#[test]
fn row_wise_binding_fills_one_struct_per_row() {
    #[repr(C)]
    #[derive(Clone, Copy)]
    struct Player {
        name: [u8; 8],
        name_indicator: Len,
        number: i32,
        number_indicator: Len,
    }

    let db = MemoryDatabase::new();
    db.script(
        "SELECT name, number FROM players",
        Script::query(
            Table::new(vec![Column::new("NAME", 12), Column::new("NUMBER", 4)])
                .row(vec![Value::from("Orr"), Value::Int(4)])
                .row(vec![Value::from("Gretzky"), Value::Int(99)])
                .row(vec![Value::from("Howe"), Value::Int(9)]),
        ),
    );
    let mut stmt = statement(&db);
    let empty = Player {
        name: [0; 8],
        name_indicator: 0,
        number: 0,
        number_indicator: 0,
    };
    let mut players = [empty; 2];
    let first = players.as_mut_ptr();
    let mut fetched = 0usize;

    unsafe {
        // SQL_ATTR_ROW_BIND_TYPE
        stmt.set_stmt_attr(5, size_of::<Player>() as Pointer, 0);
        stmt.set_stmt_attr(27, 2 as Pointer, 0);
        stmt.set_stmt_attr(26, (&mut fetched as *mut usize).cast(), 0);
        exec(&mut stmt, "SELECT name, number FROM players");
        stmt.bind_col(
            1,
            SQL_C_CHAR,
            addr_of_mut!((*first).name) as Pointer,
            8,
            addr_of_mut!((*first).name_indicator),
        );
        stmt.bind_col(
            2,
            SQL_C_SLONG,
            addr_of_mut!((*first).number) as Pointer,
            4,
            addr_of_mut!((*first).number_indicator),
        );
    }

    assert_eq!(SqlReturn::SUCCESS, stmt.fetch());
    assert_eq!(2, fetched);
    assert_eq!(b"Orr\0", &players[0].name[..4]);
    assert_eq!(3, players[0].name_indicator);
    assert_eq!(4, players[0].number);
    assert_eq!(4, players[0].number_indicator);
    assert_eq!(b"Gretzky\0", &players[1].name);
    assert_eq!(7, players[1].name_indicator);
    assert_eq!(99, players[1].number);
    assert_eq!(4, players[1].number_indicator);

    assert_eq!(SqlReturn::SUCCESS, stmt.fetch());
    assert_eq!(1, fetched);
    assert_eq!(b"Howe\0", &players[0].name[..5]);
    assert_eq!(9, players[0].number);
    assert_eq!(99, players[1].number);
}

#[test]
fn count_parameters_and_columns() {
    let db = MemoryDatabase::new();
    db.script("SELECT name FROM t", Script::query(names()));
    let mut stmt = statement(&db);
    let sql = "INSERT INTO t VALUES (?, ?, ?)";
    let mut count = -1;

    let ret = unsafe {
        stmt.prepare(sql.as_ptr(), sql.len() as i32);
        stmt.num_params(&mut count)
    };

    assert_eq!(SqlReturn::SUCCESS, ret);
    assert_eq!(3, count);
    assert_eq!(0, stmt.num_result_cols().unwrap());
    exec(&mut stmt, "SELECT name FROM t");
    assert_eq!(1, stmt.num_result_cols().unwrap());
}

#[test]
fn row_count_is_reported_once() {
    let db = MemoryDatabase::new();
    db.script("DELETE FROM t", Script::update(3));
    let mut stmt = statement(&db);
    let mut count: Len = 0;

    unsafe {
        stmt.row_count(&mut count);
        assert_eq!(0, count);
        exec(&mut stmt, "DELETE FROM t");
        stmt.row_count(&mut count);
        assert_eq!(3, count);
        stmt.row_count(&mut count);
        assert_eq!(-1, count);
    }
}

#[test]
fn output_parameters_of_procedure_calls() {
    let db = MemoryDatabase::new();
    let sql = "{call answer(?)}";
    db.script(
        sql,
        Script {
            out_values: vec![Value::Int(42)],
            ..Script::default()
        },
    );
    let mut stmt = statement(&db);
    let mut answer = 0i32;
    let mut indicator: Len = 0;

    unsafe {
        stmt.prepare(sql.as_ptr(), sql.len() as i32);
        stmt.bind_parameter(
            1,
            SQL_PARAM_OUTPUT,
            SQL_C_SLONG,
            SQL_INTEGER,
            0,
            0,
            (&mut answer as *mut i32).cast(),
            4,
            &mut indicator,
        );
    }

    assert_eq!(SqlReturn::SUCCESS, stmt.execute());
    assert_eq!(42, answer);
    assert_eq!(4, indicator);
}

#[test]
fn generated_keys_are_the_first_result_set() {
    let db = MemoryDatabase::new();
    db.script(
        "INSERT INTO t (name) VALUES ('x')",
        Script {
            update_count: 1,
            generated_keys: Some(Table::new(vec![Column::new("ID", 4)]).row(vec![Value::Int(17)])),
            ..Script::default()
        },
    );
    let mut stmt = statement(&db);

    exec(&mut stmt, "INSERT INTO t (name) VALUES ('x')");

    assert_eq!(SqlReturn::SUCCESS, stmt.more_results());
    assert_eq!(SqlReturn::SUCCESS, stmt.fetch());
    assert_eq!(17, get_int(&mut stmt, 1));
    assert_eq!(SqlReturn::NO_DATA, stmt.more_results());
}

#[test]
fn more_results_moves_to_the_next_result_set() {
    let db = MemoryDatabase::new();
    let second = Table::new(vec![Column::new("N", 4)]).row(vec![Value::Int(5)]);
    db.script(
        "SELECT name FROM t; SELECT n FROM u",
        Script {
            more_results: vec![second],
            ..Script::query(names())
        },
    );
    let mut stmt = statement(&db);

    exec(&mut stmt, "SELECT name FROM t; SELECT n FROM u");
    stmt.fetch();
    assert_eq!("alpha", get_text(&mut stmt, 1));

    assert_eq!(SqlReturn::SUCCESS, stmt.more_results());
    assert_eq!(SqlReturn::SUCCESS, stmt.fetch());
    assert_eq!(5, get_int(&mut stmt, 1));
    assert_eq!(SqlReturn::NO_DATA, stmt.more_results());
    assert_eq!(SqlReturn::ERROR, stmt.fetch());
    assert_eq!(State::INVALID_CURSOR_STATE, first_state(&stmt));
}

#[test]
fn cancel_fails_the_next_fetch() {
    let db = MemoryDatabase::new();
    db.script("SELECT name FROM t", Script::query(names()));
    let mut stmt = statement(&db);
    exec(&mut stmt, "SELECT name FROM t");

    assert_eq!(SqlReturn::SUCCESS, stmt.cancel());

    assert_eq!(SqlReturn::ERROR, stmt.fetch());
    assert_eq!(State::OPERATION_CANCELED, first_state(&stmt));
    assert_eq!(SqlReturn::ERROR, stmt.fetch());
    assert_eq!(State::INVALID_CURSOR_STATE, first_state(&stmt));
}

#[test]
fn scrolling_is_not_supported() {
    let db = MemoryDatabase::new();
    db.script("SELECT name FROM t", Script::query(names()));
    let mut stmt = statement(&db);
    exec(&mut stmt, "SELECT name FROM t");

    // SQL_FETCH_FIRST
    assert_eq!(SqlReturn::ERROR, stmt.fetch_scroll(2, 0));
    assert_eq!(State::FETCH_TYPE_OUT_OF_RANGE, first_state(&stmt));

    assert_eq!(SqlReturn::SUCCESS, stmt.fetch_scroll(1, 0));
    assert_eq!("alpha", get_text(&mut stmt, 1));
}

#[test]
fn close_cursor() {
    let db = MemoryDatabase::new();
    db.script("SELECT name FROM t", Script::query(names()));
    let mut stmt = statement(&db);

    assert_eq!(SqlReturn::ERROR, stmt.close_cursor());
    assert_eq!(State::INVALID_CURSOR_STATE, first_state(&stmt));

    exec(&mut stmt, "SELECT name FROM t");
    assert_eq!(SqlReturn::SUCCESS, stmt.close_cursor());
    assert_eq!(SqlReturn::ERROR, stmt.fetch());
    assert_eq!(State::INVALID_CURSOR_STATE, first_state(&stmt));
}

#[test]
fn free_stmt_options() {
    let db = MemoryDatabase::new();
    db.script("SELECT name FROM t", Script::query(names()));
    let mut stmt = statement(&db);
    exec(&mut stmt, "SELECT name FROM t");

    assert_eq!(SqlReturn::SUCCESS, stmt.free_stmt(0));
    assert_eq!(SqlReturn::ERROR, stmt.fetch());
    assert_eq!(SqlReturn::SUCCESS, stmt.free_stmt(2));
    assert_eq!(SqlReturn::SUCCESS, stmt.free_stmt(3));
    // SQL_DROP is up to the connection
    assert_eq!(SqlReturn::ERROR, stmt.free_stmt(1));
    assert_eq!(State::INVALID_ATTRIBUTE_OPTION_IDENTIFIER, first_state(&stmt));
}

#[test]
fn bind_col_checks_column_number() {
    let db = MemoryDatabase::new();
    db.script("SELECT name FROM t", Script::query(names()));
    let mut stmt = statement(&db);
    let mut buffer = [0u8; 8];

    exec(&mut stmt, "SELECT name FROM t");
    let ret = unsafe {
        stmt.bind_col(2, SQL_C_CHAR, buffer.as_mut_ptr() as Pointer, 8, null_mut())
    };

    assert_eq!(SqlReturn::ERROR, ret);
    assert_eq!(State::INVALID_DESCRIPTOR_INDEX, first_state(&stmt));
}

#[test]
fn execute_without_prepare() {
    let db = MemoryDatabase::new();
    let mut stmt = statement(&db);

    assert_eq!(SqlReturn::ERROR, stmt.execute());
    assert_eq!(State::FUNCTION_SEQUENCE_ERROR, first_state(&stmt));
}

#[test]
fn remote_errors_carry_their_code() {
    let db = MemoryDatabase::new();
    db.script(
        "SELECT * FROM missing",
        Script::failure(RemoteError::new(codes::NO_SUCH_TABLE, "can't find table MISSING")),
    );
    let mut stmt = statement(&db);

    assert_eq!(SqlReturn::ERROR, exec(&mut stmt, "SELECT * FROM missing"));

    let record = stmt.error_queue().get(1).unwrap();
    assert_eq!(State(*b"42S02"), record.state);
    assert_eq!(codes::NO_SUCH_TABLE, record.native_error);
    assert_eq!("can't find table MISSING", record.message);
}

#[test]
fn unsupported_cursor_type_is_substituted() {
    let db = MemoryDatabase::new();
    let mut stmt = statement(&db);
    let mut cursor_type = 99usize;

    // SQL_CURSOR_STATIC
    let ret = unsafe { stmt.set_stmt_attr(6, 3 as Pointer, 0) };
    assert_eq!(SqlReturn::SUCCESS_WITH_INFO, ret);
    assert_eq!(State::OPTION_VALUE_CHANGED, first_state(&stmt));

    let ret =
        unsafe { stmt.get_stmt_attr(6, (&mut cursor_type as *mut usize).cast(), 0, null_mut()) };
    assert_eq!(SqlReturn::SUCCESS, ret);
    assert_eq!(0, cursor_type);

    let ret = unsafe { stmt.set_stmt_attr(4711, null_mut(), 0) };
    assert_eq!(SqlReturn::ERROR, ret);
    assert_eq!(State::OPTIONAL_FEATURE_NOT_IMPLEMENTED, first_state(&stmt));
}

#[test]
fn executing_outside_auto_commit_leaves_transaction_pending() {
    let db = MemoryDatabase::new();
    let mut stmt = statement_with(&db, false);

    assert!(!stmt.session.is_transaction_pending());
    exec(&mut stmt, "UPDATE t SET a = 1");

    assert!(stmt.session.is_transaction_pending());
}

#[test]
fn tables_of_the_catalog() {
    let db = MemoryDatabase::new();
    db.create_table("USER", "T1", vec![Column::new("A", 4)]);
    db.create_table("USER", "T2", vec![Column::new("B", 12)]);
    let mut stmt = statement(&db);

    let ret = unsafe { stmt.tables(null(), 0, null(), 0, null(), 0, null(), 0) };
    assert_eq!(SqlReturn::SUCCESS, ret);

    let mut tables = Vec::new();
    while stmt.fetch() == SqlReturn::SUCCESS {
        tables.push(get_text(&mut stmt, 3));
    }
    assert_eq!(vec!["T1", "T2"], tables);
    assert_eq!("SQLTables", stmt.sql());
}
