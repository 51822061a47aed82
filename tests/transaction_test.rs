use std::sync::Arc;
use std::thread;

use relic::record::{Column, CompareOp, DataType, Predicate, Record, Value};
use relic::{Command, Database, Projection, RelicError, TxnStatus};

fn setup() -> Database {
    let db = Database::new();
    db.execute(&Command::CreateTable {
        name: "students".into(),
        columns: vec![
            Column::new("id", DataType::Number).primary_key(),
            Column::new("name", DataType::Text),
            Column::new("age", DataType::Number),
        ],
    })
    .unwrap();
    for (id, name, age) in [(1, "Alice", 20), (2, "Bob", 21)] {
        db.execute(&insert(id, name, age)).unwrap();
    }
    db
}

fn insert(id: i32, name: &str, age: i32) -> Command {
    Command::Insert {
        table: "students".into(),
        key: None,
        record: Record::new().with("id", id).with("name", name).with("age", age),
    }
}

fn select_all() -> Command {
    Command::Select {
        table: "students".into(),
        columns: Projection::All,
        predicate: None,
    }
}

#[test]
fn test_rollback_restores_exactly() {
    let db = setup();
    let before = db.execute(&select_all()).unwrap().into_rows();

    db.begin("tx1").unwrap();
    db.execute_in("tx1", &insert(3, "Carol", 19)).unwrap();
    db.execute_in(
        "tx1",
        &Command::Update {
            table: "students".into(),
            assignments: vec![("age".into(), Value::Number(99.0))],
            predicate: None,
        },
    )
    .unwrap();
    db.execute_in(
        "tx1",
        &Command::Delete {
            table: "students".into(),
            predicate: Some(Predicate::simple("id", CompareOp::Eq, 2)),
        },
    )
    .unwrap();
    db.rollback("tx1").unwrap();

    let mut after = db.execute(&select_all()).unwrap().into_rows();
    assert_eq!(after.len(), before.len());
    for row in before {
        let pos = after.iter().position(|r| *r == row);
        assert!(pos.is_some(), "record {:?} not restored", row);
        after.remove(pos.unwrap());
    }
}

#[test]
fn test_commit_is_terminal() {
    let db = setup();
    db.begin("tx1").unwrap();
    db.execute_in("tx1", &insert(3, "Carol", 19)).unwrap();
    db.commit("tx1").unwrap();

    assert!(matches!(
        db.execute_in("tx1", &insert(4, "Dave", 22)).unwrap_err(),
        RelicError::TxnNotActive { .. }
    ));
    assert!(matches!(
        db.commit("tx1").unwrap_err(),
        RelicError::TxnNotActive { .. }
    ));
    assert!(matches!(
        db.rollback("tx1").unwrap_err(),
        RelicError::TxnNotActive { .. }
    ));

    // The committed insert survives.
    assert_eq!(db.execute(&select_all()).unwrap().row_count(), 3);
}

#[test]
fn test_begin_with_tracked_id_fails() {
    let db = setup();
    db.begin("tx1").unwrap();
    assert_eq!(
        db.begin("tx1").unwrap_err(),
        RelicError::TxnAlreadyExists("tx1".into())
    );

    db.rollback("tx1").unwrap();
    assert!(db.begin("tx1").is_err());

    db.forget("tx1").unwrap();
    db.begin("tx1").unwrap();
}

#[test]
fn test_failed_execute_leaves_transaction_active() {
    let db = setup();
    db.begin("tx1").unwrap();

    let err = db.execute_in("tx1", &insert(1, "Eve", 22)).unwrap_err();
    assert!(matches!(err, RelicError::DuplicateKey { .. }));

    // Still active: further work and an explicit commit succeed.
    db.execute_in("tx1", &insert(3, "Carol", 19)).unwrap();
    db.commit("tx1").unwrap();
    assert_eq!(db.execute(&select_all()).unwrap().row_count(), 3);
}

#[test]
fn test_operation_log_includes_failures() {
    let db = setup();
    db.begin("tx1").unwrap();
    db.execute_in("tx1", &insert(3, "Carol", 19)).unwrap();
    let _ = db.execute_in("tx1", &insert(3, "Carol", 19)).unwrap_err();

    let summaries = db.transactions();
    assert_eq!(summaries.len(), 1);
    assert_eq!(summaries[0].id, "tx1");
    assert_eq!(summaries[0].status, TxnStatus::Active);
    assert_eq!(summaries[0].operations, 2);
    assert_eq!(summaries[0].locks, vec!["students".to_string()]);
}

#[test]
fn test_unknown_transaction_is_not_found() {
    let db = setup();
    assert_eq!(
        db.execute_in("nope", &select_all()).unwrap_err(),
        RelicError::TxnNotFound("nope".into())
    );
    assert_eq!(
        db.commit("nope").unwrap_err(),
        RelicError::TxnNotFound("nope".into())
    );
}

#[test]
fn test_terminate_all_aborts_without_restoring() {
    let db = setup();
    db.begin("tx1").unwrap();
    db.begin("tx2").unwrap();
    db.execute_in("tx1", &insert(3, "Carol", 19)).unwrap();
    db.commit("tx2").unwrap();

    assert_eq!(db.terminate_all(), 1);
    assert_eq!(db.terminate_all(), 0);

    let summaries = db.transactions();
    let tx1 = summaries.iter().find(|s| s.id == "tx1").unwrap();
    assert_eq!(tx1.status, TxnStatus::Aborted);
    assert!(tx1.locks.is_empty());

    // Aborted, not rolled back: Carol stays.
    assert_eq!(db.execute(&select_all()).unwrap().row_count(), 3);
}

#[test]
fn test_reads_inside_transaction_see_own_writes() {
    let db = setup();
    db.begin("tx1").unwrap();
    db.execute_in("tx1", &insert(3, "Carol", 19)).unwrap();

    let rows = db.execute_in("tx1", &select_all()).unwrap().into_rows();
    assert_eq!(rows.len(), 3);
    db.rollback("tx1").unwrap();
}

#[test]
fn test_write_racing_rollback_never_survives() {
    const ITERATIONS: usize = 50;

    let db = Arc::new(setup());
    for _ in 0..ITERATIONS {
        db.begin("txr").unwrap();

        let db2 = Arc::clone(&db);
        let writer = thread::spawn(move || db2.execute_in("txr", &insert(7, "Grace", 30)));
        let rolled_back = db.rollback("txr");

        // Whichever side wins the race, the insert must not outlive the
        // rollback: either it landed first and the checkpoint restore
        // discarded it, or the terminated transaction rejected it.
        let result = writer.join().unwrap();
        assert!(rolled_back.is_ok());
        assert!(
            result.is_ok() || matches!(result, Err(RelicError::TxnNotActive { .. })),
            "unexpected outcome: {:?}",
            result
        );
        assert_eq!(db.execute(&select_all()).unwrap().row_count(), 2);

        db.forget("txr").unwrap();
    }
    assert_eq!(db.lock_stats().total_locks, 0);
    assert_eq!(db.lock_stats().waiting, 0);
}

#[test]
fn test_whole_database_checkpoint_discards_unrelated_tables() {
    // Documented semantic weakness: the checkpoint is database-wide,
    // so rolling back tx1 also discards a table created after begin.
    let db = setup();
    db.begin("tx1").unwrap();

    db.execute(&Command::CreateTable {
        name: "other".into(),
        columns: vec![Column::new("id", DataType::Number).primary_key()],
    })
    .unwrap();

    db.rollback("tx1").unwrap();
    let err = db
        .execute(&Command::Select {
            table: "other".into(),
            columns: Projection::All,
            predicate: None,
        })
        .unwrap_err();
    assert_eq!(err, RelicError::TableNotFound("other".into()));
}
