use crate::common::{RelicError, Result};
use crate::record::Record;
use crate::storage::Table;

/// Nested-loop equality join over two tables.
///
/// Every record pair whose join-column values are loosely equal
/// (numeric/string cross-type coercion, so `1` joins `"1"`) emits one
/// merged record. O(n*m); no index is consulted even when one exists
/// on a join column.
///
/// Projection policy: with an empty column list every column from both
/// sides is included, prefixed `table.column`. Otherwise each entry is
/// either `table.column` (picked from the named side only) or a bare
/// `column` (included, prefixed, from whichever side(s) carry it).
pub fn nested_loop_join(
    left: &Table,
    right: &Table,
    left_column: &str,
    right_column: &str,
    columns: &[String],
) -> Result<Vec<Record>> {
    if !left.has_column(left_column) {
        return Err(RelicError::ColumnNotFound {
            table: left.name().to_string(),
            column: left_column.to_lowercase(),
        });
    }
    if !right.has_column(right_column) {
        return Err(RelicError::ColumnNotFound {
            table: right.name().to_string(),
            column: right_column.to_lowercase(),
        });
    }

    let mut results = Vec::new();
    for left_record in left.records().values() {
        let left_value = match left_record.get(left_column) {
            Some(v) => v,
            None => continue,
        };
        for right_record in right.records().values() {
            let right_value = match right_record.get(right_column) {
                Some(v) => v,
                None => continue,
            };
            if left_value.loosely_eq(right_value) {
                results.push(merge(
                    left, left_record, right, right_record, columns,
                ));
            }
        }
    }
    Ok(results)
}

fn merge(
    left: &Table,
    left_record: &Record,
    right: &Table,
    right_record: &Record,
    columns: &[String],
) -> Record {
    let mut merged = Record::new();

    if columns.is_empty() {
        for (column, value) in left_record.iter() {
            merged.set(&format!("{}.{}", left.name(), column), value.clone());
        }
        for (column, value) in right_record.iter() {
            merged.set(&format!("{}.{}", right.name(), column), value.clone());
        }
        return merged;
    }

    for entry in columns {
        match entry.split_once('.') {
            Some((table, column)) => {
                let table = table.to_lowercase();
                let (side, record) = if table == left.name() {
                    (left, left_record)
                } else if table == right.name() {
                    (right, right_record)
                } else {
                    continue;
                };
                if let Some(value) = record.get(column) {
                    merged.set(&format!("{}.{}", side.name(), column.to_lowercase()), value.clone());
                }
            }
            None => {
                if let Some(value) = left_record.get(entry) {
                    merged.set(
                        &format!("{}.{}", left.name(), entry.to_lowercase()),
                        value.clone(),
                    );
                }
                if let Some(value) = right_record.get(entry) {
                    merged.set(
                        &format!("{}.{}", right.name(), entry.to_lowercase()),
                        value.clone(),
                    );
                }
            }
        }
    }
    merged
}
