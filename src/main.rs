use relic::record::{Column, CompareOp, DataType, Predicate, Record, Value};
use relic::{Command, Database, Projection};

fn main() {
    println!("Relic - an embeddable transactional record store");
    println!("================================================\n");

    let db = Database::new();

    // Create a table with a primary key
    db.execute(&Command::CreateTable {
        name: "students".into(),
        columns: vec![
            Column::new("id", DataType::Number).primary_key(),
            Column::new("name", DataType::Text),
            Column::new("age", DataType::Number),
        ],
    })
    .expect("Failed to create table");
    println!("Created table: students");

    // Insert a few records
    for (id, name, age) in [(1, "Alice", 20), (2, "Bob", 21), (3, "Carol", 19)] {
        db.execute(&Command::Insert {
            table: "students".into(),
            key: None,
            record: Record::new().with("id", id).with("name", name).with("age", age),
        })
        .expect("Failed to insert");
    }
    println!("Inserted 3 students");

    // A duplicate primary key is rejected
    let err = db
        .execute(&Command::Insert {
            table: "students".into(),
            key: None,
            record: Record::new().with("id", 1).with("name", "Eve").with("age", 22),
        })
        .unwrap_err();
    println!("Duplicate insert rejected: {}", err);

    // Select with a predicate
    let (output, elapsed) = db
        .execute_timed(&Command::Select {
            table: "students".into(),
            columns: Projection::columns(&["name", "age"]),
            predicate: Some(Predicate::simple("age", CompareOp::Ge, 20)),
        })
        .expect("Failed to select");
    println!(
        "\nStudents aged 20+ ({} rows, {:?}):",
        output.row_count(),
        elapsed
    );
    for row in output.into_rows() {
        println!("  {:?} is {:?}", row.get("name"), row.get("age"));
    }

    // Secondary index on age
    db.execute(&Command::CreateIndex {
        table: "students".into(),
        columns: vec!["age".into()],
    })
    .expect("Failed to create index");
    println!("\nIndex on students(age): {:#?}", db.indexes());

    // Transaction with rollback
    db.begin("tx1").expect("Failed to begin");
    db.execute_in(
        "tx1",
        &Command::Update {
            table: "students".into(),
            assignments: vec![("age".into(), Value::Number(30.0))],
            predicate: Some(Predicate::simple("id", CompareOp::Eq, 1)),
        },
    )
    .expect("Failed to update in transaction");
    db.rollback("tx1").expect("Failed to rollback");
    println!("Rolled back tx1; Alice's age is unchanged");

    // Join against a second table
    db.execute(&Command::CreateTable {
        name: "enrollments".into(),
        columns: vec![
            Column::new("student_id", DataType::Number),
            Column::new("course", DataType::Text),
        ],
    })
    .expect("Failed to create table");
    for (key, student_id, course) in [("e1", 1, "math"), ("e2", 2, "physics")] {
        db.execute(&Command::Insert {
            table: "enrollments".into(),
            key: Some(key.into()),
            record: Record::new().with("student_id", student_id).with("course", course),
        })
        .expect("Failed to insert");
    }

    let rows = db
        .execute(&Command::Join {
            left: "students".into(),
            right: "enrollments".into(),
            left_column: "id".into(),
            right_column: "student_id".into(),
            columns: vec!["students.name".into(), "enrollments.course".into()],
        })
        .expect("Failed to join")
        .into_rows();
    println!("\nEnrollments:");
    for row in rows {
        println!(
            "  {:?} takes {:?}",
            row.get("students.name"),
            row.get("enrollments.course")
        );
    }

    println!("\nLock stats: {:?}", db.lock_stats());
    println!("Transactions: {:?}", db.transactions());
}
