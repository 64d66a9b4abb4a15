#![cfg(feature = "sqlite")]

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use chrono::NaiveDateTime;
use sql_template::prelude::*;
use tempfile::tempdir;

#[derive(Debug, Clone, PartialEq)]
struct User {
    id: i64,
    account: String,
    password: String,
    email: String,
}

fn user_mapper(row: &DbRow, _row_num: usize) -> Result<User, MappingError> {
    Ok(User {
        id: row.get_i64("id")?,
        account: row.get_text("account")?,
        password: row.get_text("password")?,
        email: row.get_text("email")?,
    })
}

const SCHEMA: &str = "CREATE TABLE users (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    account TEXT NOT NULL,
    password TEXT NOT NULL,
    email TEXT NOT NULL
);";

const INSERT: &str = "insert into users (account, password, email) values (?, ?, ?)";

fn memory_template() -> SqlTemplate<SingleConnectionDataSource> {
    let ds = SingleConnectionDataSource::open(&SqliteOptions::default()).expect("open :memory:");
    ds.execute_batch(SCHEMA).expect("schema");
    SqlTemplate::new(ds)
}

fn insert(template: &SqlTemplate<SingleConnectionDataSource>, account: &str) -> u64 {
    template
        .insert(
            INSERT,
            &[account.into(), "pw1".into(), format!("{account}@x.com").into()],
        )
        .expect("insert")
}

#[test]
fn insert_reports_one_affected_row() {
    let template = memory_template();
    assert_eq!(insert(&template, "alice"), 1);
}

#[test]
fn query_for_object_maps_the_single_row() {
    let template = memory_template();
    insert(&template, "alice");

    let user = template
        .query_for_object(
            "select id, account, password, email from users where id = ?",
            user_mapper,
            &[1_i64.into()],
        )
        .unwrap();

    assert_eq!(
        user,
        User {
            id: 1,
            account: "alice".into(),
            password: "pw1".into(),
            email: "alice@x.com".into(),
        }
    );
}

#[test]
fn query_for_object_on_missing_row_is_empty_result() {
    let template = memory_template();

    let err = template
        .query_for_object(
            "select id, account, password, email from users where id = ?",
            user_mapper,
            &[1_i64.into()],
        )
        .unwrap_err();

    assert!(err.is_empty_result());
}

#[test]
fn query_for_object_on_duplicate_rows_is_size_exceeded() {
    let template = memory_template();
    insert(&template, "alice");
    insert(&template, "alice");

    let err = template
        .query_for_object(
            "select id, account, password, email from users where account = ?",
            user_mapper,
            &["alice".into()],
        )
        .unwrap_err();

    assert!(matches!(err, SqlTemplateError::ResultSizeExceeded { size: 2 }));
}

#[test]
fn update_then_query_all_in_insert_order() {
    let template = memory_template();
    insert(&template, "alice");
    insert(&template, "bob");

    let updated = template
        .update(
            "update users set password = ?, email = ? where account = ?",
            &["pw2".into(), "bob@y.com".into(), "bob".into()],
        )
        .unwrap();
    assert_eq!(updated, 1);

    let all = template
        .query(
            "select id, account, password, email from users order by id",
            user_mapper,
            &[],
        )
        .unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!(all[1].password, "pw2");
    assert_eq!(all[1].email, "bob@y.com");
}

#[test]
fn bad_sql_is_a_prepare_failure() {
    let template = memory_template();

    let err = template
        .query("select nope from missing_table", user_mapper, &[])
        .unwrap_err();

    assert_eq!(err.phase(), Some(Phase::Prepare));
}

#[test]
fn wrong_argument_count_is_a_bind_failure() {
    let template = memory_template();

    let err = template.execute(INSERT, &["alice".into()]).unwrap_err();

    assert_eq!(err.phase(), Some(Phase::Bind));
}

#[test]
fn constraint_violation_is_an_execute_failure() {
    let template = memory_template();

    let err = template
        .execute(INSERT, &["alice".into(), RowValues::Null, "a@x.com".into()])
        .unwrap_err();

    assert_eq!(err.phase(), Some(Phase::Execute));
}

#[test]
fn mixed_value_kinds_round_trip_through_storage() {
    let ds = SingleConnectionDataSource::open(&SqliteOptions::default()).unwrap();
    ds.execute_batch("CREATE TABLE kinds (f REAL, b INTEGER, ts TEXT, doc TEXT, bytes BLOB, n TEXT);")
        .unwrap();
    let template = SqlTemplate::new(ds);
    let ts = NaiveDateTime::parse_from_str("2024-05-06 07:08:09", "%Y-%m-%d %H:%M:%S").unwrap();

    template
        .execute(
            "insert into kinds values (?, ?, ?, ?, ?, ?)",
            &[
                1.5_f64.into(),
                true.into(),
                ts.into(),
                serde_json::json!({"k": "v"}).into(),
                vec![1_u8, 2, 3].into(),
                Option::<String>::None.into(),
            ],
        )
        .unwrap();

    let row = template
        .query_for_object(
            "select f, b, ts, doc, bytes, n from kinds",
            |row: &DbRow, _: usize| -> Result<DbRow, MappingError> { Ok(row.clone()) },
            &[],
        )
        .unwrap();

    assert_eq!(row.get_f64("f").unwrap(), 1.5);
    assert!(row.get_bool("b").unwrap());
    assert_eq!(row.get("ts").and_then(RowValues::as_timestamp), Some(ts));
    let doc: serde_json::Value = serde_json::from_str(&row.get_text("doc").unwrap()).unwrap();
    assert_eq!(doc["k"], "v");
    assert_eq!(row.get("bytes").and_then(RowValues::as_blob), Some(&[1_u8, 2, 3][..]));
    assert_eq!(row.get_optional_text("n").unwrap(), None);
}

#[test]
fn file_data_source_opens_a_connection_per_call() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("users.db");
    let opts = SqliteOptions::builder(path.to_string_lossy().into_owned())
        .wal(true)
        .busy_timeout(Duration::from_secs(5))
        .finish();
    opts.open().unwrap().execute_batch(SCHEMA).unwrap();
    let template = Arc::new(SqlTemplate::new(SqliteDataSource::new(opts)));

    thread::scope(|scope| {
        for worker in 0..4 {
            let template = Arc::clone(&template);
            scope.spawn(move || {
                for i in 0..10 {
                    let account = format!("user-{worker}-{i}");
                    template
                        .execute(INSERT, &[account.into(), "pw".into(), "e@x.com".into()])
                        .unwrap();
                }
            });
        }
    });

    let count = template
        .query_for_object(
            "select count(*) as cnt from users",
            |row: &DbRow, _: usize| row.get_i64("cnt"),
            &[],
        )
        .unwrap();
    assert_eq!(count, 40);
}

#[test]
fn unopenable_database_is_a_connection_error() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("missing").join("nested.db");
    let template = SqlTemplate::new(
        SqliteOptions::builder(path.to_string_lossy().into_owned())
            .read_only(true)
            .build(),
    );

    let err = template
        .query(
            "select 1",
            |_: &DbRow, _: usize| -> Result<(), MappingError> { Ok(()) },
            &[],
        )
        .unwrap_err();

    assert!(matches!(err, SqlTemplateError::ConnectionError(_)));
}

#[test]
fn failing_returning_insert_is_an_execute_failure() {
    let template = memory_template();

    let err = template
        .query(
            "insert into users (account, password, email) values (?, ?, ?) returning id",
            |row: &DbRow, _: usize| row.get_i64("id"),
            &["alice".into(), RowValues::Null, "a@x.com".into()],
        )
        .unwrap_err();

    assert_eq!(err.phase(), Some(Phase::Execute));
}

#[test]
fn returning_insert_yields_the_first_row() {
    let template = memory_template();
    insert(&template, "alice");

    let id = template
        .query_for_object(
            "insert into users (account, password, email) values (?, ?, ?) returning id",
            |row: &DbRow, _: usize| row.get_i64("id"),
            &["bob".into(), "pw".into(), "b@x.com".into()],
        )
        .unwrap();

    assert_eq!(id, 2);
}

#[test]
fn shared_connection_survives_a_panicking_mapper() {
    let template = memory_template();
    insert(&template, "alice");

    let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        template.query(
            "select id, account, password, email from users",
            |_: &DbRow, _: usize| -> Result<User, MappingError> { panic!("mapper blew up") },
            &[],
        )
    }));
    assert!(outcome.is_err());

    let all = template
        .query("select id, account, password, email from users", user_mapper, &[])
        .unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(insert(&template, "bob"), 1);
}
