//! SQL text builders.
//!
//! Every builder takes identifiers as `&'static str`, which only ever come
//! from a table's compiled-in column descriptors. Values never appear in the
//! generated text; they are bound as numbered parameters (`?1`, `?2`, ...).

use crate::storage::Column;

/// Builds `?1, ?2, ..., ?n`.
#[must_use]
pub fn placeholders(count: usize) -> String {
    (1..=count)
        .map(|i| format!("?{i}"))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Builds `c1 = excluded.c1, c2 = excluded.c2, ...`.
#[must_use]
pub fn excluded_assignments(columns: &[&'static str]) -> String {
    columns
        .iter()
        .map(|c| format!("{c} = excluded.{c}"))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Builds a parameterized `INSERT`, optionally with an upsert clause.
///
/// With `conflict_column` set, the statement updates every listed column from
/// `excluded` when a row with the same conflict key exists. The statement
/// returns the `rowid` of the inserted or updated row.
///
/// # Examples
///
/// ```
/// use randomness::storage::sqlite::build_insert;
///
/// assert_eq!(
///     build_insert("sessions", &["id", "track_count"], None),
///     "INSERT INTO sessions (id, track_count) VALUES (?1, ?2) RETURNING rowid"
/// );
/// assert_eq!(
///     build_insert("sessions", &["id", "track_count"], Some("id")),
///     "INSERT INTO sessions (id, track_count) VALUES (?1, ?2) \
///      ON CONFLICT(id) DO UPDATE SET id = excluded.id, track_count = excluded.track_count \
///      RETURNING rowid"
/// );
/// ```
#[must_use]
pub fn build_insert(
    table: &'static str,
    columns: &[&'static str],
    conflict_column: Option<&'static str>,
) -> String {
    let mut sql = format!(
        "INSERT INTO {table} ({}) VALUES ({})",
        columns.join(", "),
        placeholders(columns.len())
    );
    if let Some(conflict) = conflict_column {
        sql.push_str(&format!(
            " ON CONFLICT({conflict}) DO UPDATE SET {}",
            excluded_assignments(columns)
        ));
    }
    sql.push_str(" RETURNING rowid");
    sql
}

/// Builds a plain positional `INSERT` used for multi-row batches.
#[must_use]
pub fn build_batch_insert(table: &'static str, columns: &[&'static str]) -> String {
    format!(
        "INSERT INTO {table} ({}) VALUES ({})",
        columns.join(", "),
        placeholders(columns.len())
    )
}

/// Builds the identity lookup used by `set_id`.
#[must_use]
pub fn build_exists_by_id(table: &'static str) -> String {
    format!("SELECT 1 FROM {table} WHERE id = ?1 LIMIT 1")
}

/// Builds an idempotent `CREATE TABLE` from column descriptors.
///
/// The `id` column becomes the primary key.
#[must_use]
pub fn build_create_table(table: &'static str, columns: &[Column]) -> String {
    let definitions = columns
        .iter()
        .map(|c| {
            if c.name == "id" {
                format!("{} {} PRIMARY KEY", c.name, c.sql_type.as_sql())
            } else {
                format!("{} {}", c.name, c.sql_type.as_sql())
            }
        })
        .collect::<Vec<_>>()
        .join(", ");
    format!("CREATE TABLE IF NOT EXISTS {table} ({definitions})")
}

/// Builds `DROP TABLE IF EXISTS`.
#[must_use]
pub fn build_drop_table(table: &'static str) -> String {
    format!("DROP TABLE IF EXISTS {table}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholders() {
        assert_eq!(placeholders(0), "");
        assert_eq!(placeholders(1), "?1");
        assert_eq!(placeholders(3), "?1, ?2, ?3");
    }

    #[test]
    fn test_upsert_covers_every_column() {
        let sql = build_insert("t", &["id", "a", "b"], Some("id"));
        assert!(sql.contains("ON CONFLICT(id) DO UPDATE SET"));
        assert!(sql.contains("id = excluded.id"));
        assert!(sql.contains("a = excluded.a"));
        assert!(sql.contains("b = excluded.b"));
    }

    #[test]
    fn test_batch_insert_has_no_returning() {
        assert_eq!(
            build_batch_insert("t", &["a", "b"]),
            "INSERT INTO t (a, b) VALUES (?1, ?2)"
        );
    }

    #[test]
    fn test_create_table_from_columns() {
        use crate::storage::SqlType;

        let columns = [
            Column::conflict_key("id", SqlType::Text),
            Column::new("score", SqlType::Real),
        ];
        assert_eq!(
            build_create_table("scores", &columns),
            "CREATE TABLE IF NOT EXISTS scores (id TEXT PRIMARY KEY, score REAL)"
        );
    }

    #[test]
    fn test_lookup_and_drop() {
        assert_eq!(
            build_exists_by_id("sessions"),
            "SELECT 1 FROM sessions WHERE id = ?1 LIMIT 1"
        );
        assert_eq!(build_drop_table("sessions"), "DROP TABLE IF EXISTS sessions");
    }
}
