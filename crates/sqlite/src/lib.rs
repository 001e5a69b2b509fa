//! `SQLite` query runner for criteria queries.
//!
//! A lightweight runner over `rusqlite`, suited to development and tests.
//!
//! ```ignore
//! let runner = SqliteRunner::connect()?;
//! runner.execute_batch("CREATE TABLE dogs (id INTEGER PRIMARY KEY, name TEXT)")?;
//!
//! let dogs = EasyCriteriaQuery::<Dog>::new()
//!     .r#where(Dog::NAME.like("r%"))
//!     .get_result_list(&runner)?;
//! ```

#![allow(clippy::significant_drop_tightening)]

use std::sync::Arc;

use anyhow::{Context, Result};
use easy_criteria::{DataType, Field, Query, QueryBuilder, QueryRunner, Row};
use fromenv::FromEnv;
use rusqlite::types::ValueRef;
use rusqlite::{Connection, params_from_iter};
use tracing::instrument;

/// Options used to connect to the `SQLite` database.
///
/// Loaded from environment variables by [`ConnectOptions::load`].
#[allow(missing_docs)]
#[derive(Debug, Clone, FromEnv)]
pub struct ConnectOptions {
    /// Database path or URI.
    #[env(from = "SQL_DATABASE", default = "file::memory:?cache=shared")]
    pub database: String,
}

impl ConnectOptions {
    /// Loads options from the environment, falling back to defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if an environment variable cannot be parsed.
    pub fn load() -> Result<Self> {
        Self::from_env().finalize().context("issue loading connection options")
    }
}

/// Runs criteria queries against a single `SQLite` connection.
///
/// Clones share the connection; executions are serialized by its lock.
#[derive(Debug, Clone)]
pub struct SqliteRunner {
    // rusqlite::Connection isn't `Sync`
    conn: Arc<parking_lot::Mutex<Connection>>,
}

impl SqliteRunner {
    /// Connects using options loaded from the environment.
    ///
    /// # Errors
    ///
    /// Returns an error if the options cannot be loaded or the database cannot
    /// be opened.
    pub fn connect() -> Result<Self> {
        Self::connect_with(ConnectOptions::load()?)
    }

    /// Connects using `options`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened.
    #[instrument]
    pub fn connect_with(options: ConnectOptions) -> Result<Self> {
        tracing::debug!("initializing SQLite connection to: {}", options.database);

        let conn = Connection::open(&options.database).context("failed to open SQLite database")?;

        Ok(Self {
            conn: Arc::new(parking_lot::Mutex::new(conn)),
        })
    }

    /// Runs one or more parameterless statements, such as schema or fixtures.
    ///
    /// # Errors
    ///
    /// Returns an error if any statement fails.
    pub fn execute_batch(&self, sql: &str) -> Result<()> {
        tracing::debug!("executing batch: {}", sql);
        self.conn.lock().execute_batch(sql).context("failed to execute batch")
    }

    /// Runs a single statement with positional parameters, returning the number
    /// of rows affected.
    ///
    /// # Errors
    ///
    /// Returns an error if the statement cannot be prepared or executed.
    pub fn execute(&self, sql: &str, params: &[DataType]) -> Result<usize> {
        tracing::debug!("executing statement: {}", sql);

        let conn = self.conn.lock();
        let mut stmt = conn.prepare(sql).context("failed to prepare statement")?;
        let values =
            params.iter().map(datatype_to_rusqlite_value).collect::<Result<Vec<_>>>()?;

        stmt.execute(params_from_iter(values.iter())).context("failed to execute statement")
    }
}

impl QueryRunner for SqliteRunner {
    fn query_builder(&self) -> QueryBuilder {
        QueryBuilder::positional()
    }

    #[instrument(skip_all, fields(sql = %query.sql))]
    fn fetch(&self, query: &Query) -> Result<Vec<Row>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(&query.sql).context("failed to prepare statement")?;

        let values =
            query.params.iter().map(datatype_to_rusqlite_value).collect::<Result<Vec<_>>>()?;
        let column_names: Vec<String> =
            stmt.column_names().iter().map(ToString::to_string).collect();

        let mut rows =
            stmt.query(params_from_iter(values.iter())).context("failed to execute query")?;

        let mut result_rows = Vec::new();
        while let Some(row) = rows.next().context("failed to fetch row")? {
            let mut fields = Vec::with_capacity(column_names.len());
            for (i, name) in column_names.iter().enumerate() {
                let value = row.get_ref(i).context("failed to get column value")?;
                fields.push(Field {
                    name: name.clone(),
                    value: rusqlite_value_to_datatype(value)?,
                });
            }

            result_rows.push(Row {
                index: result_rows.len().to_string(),
                fields,
            });
        }

        tracing::debug!(rows = result_rows.len(), "query returned");
        Ok(result_rows)
    }
}

fn datatype_to_rusqlite_value(dt: &DataType) -> Result<rusqlite::types::Value> {
    use rusqlite::types::Value;

    let value = match dt {
        DataType::Boolean(Some(b)) => Value::Integer(i64::from(*b)),
        DataType::Int32(Some(i)) => Value::Integer(i64::from(*i)),
        DataType::Int64(Some(i)) => Value::Integer(*i),
        DataType::Uint32(Some(u)) => Value::Integer(i64::from(*u)),
        DataType::Uint64(Some(u)) => {
            let i = i64::try_from(*u).context("unsigned value exceeds SQLite integer range")?;
            Value::Integer(i)
        }
        DataType::Float(Some(f)) => Value::Real(f64::from(*f)),
        DataType::Double(Some(f)) => Value::Real(*f),
        DataType::Str(Some(s))
        | DataType::Date(Some(s))
        | DataType::Time(Some(s))
        | DataType::Timestamp(Some(s)) => Value::Text(s.clone()),
        DataType::Binary(Some(b)) => Value::Blob(b.clone()),
        // all `None` variants
        _ => Value::Null,
    };
    Ok(value)
}

fn rusqlite_value_to_datatype(value: ValueRef) -> Result<DataType> {
    match value {
        ValueRef::Null => Ok(DataType::Str(None)),
        ValueRef::Integer(i) => Ok(DataType::Int64(Some(i))),
        ValueRef::Real(f) => Ok(DataType::Double(Some(f))),
        ValueRef::Text(t) => {
            let s = std::str::from_utf8(t).context("invalid UTF-8 in text value")?;
            Ok(DataType::Str(Some(s.to_string())))
        }
        ValueRef::Blob(b) => Ok(DataType::Binary(Some(b.to_vec()))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn memory() -> SqliteRunner {
        SqliteRunner::connect_with(ConnectOptions {
            database: ":memory:".to_string(),
        })
        .expect("connect")
    }

    #[test]
    fn fetch_reads_typed_columns() {
        let runner = memory();
        runner
            .execute_batch("CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT, score REAL)")
            .expect("create table");

        let affected = runner
            .execute(
                "INSERT INTO users (name, score) VALUES (?, ?)",
                &[DataType::Str(Some("Alice".to_string())), DataType::Float(Some(1.5))],
            )
            .expect("insert");
        assert_eq!(affected, 1);
        runner
            .execute(
                "INSERT INTO users (name, score) VALUES (?, ?)",
                &[DataType::Str(None), DataType::Double(None)],
            )
            .expect("insert nulls");

        let rows = runner
            .fetch(&Query {
                sql: "SELECT id, name, score FROM users ORDER BY id".to_string(),
                params: vec![],
            })
            .expect("query");

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].get("id"), Some(&DataType::Int64(Some(1))));
        assert_eq!(rows[0].get("name"), Some(&DataType::Str(Some("Alice".to_string()))));
        assert_eq!(rows[0].get("score"), Some(&DataType::Double(Some(1.5))));
        assert!(rows[1].get("name").is_some_and(DataType::is_null));
        assert_eq!(rows[1].index, "1");
    }

    #[test]
    fn bad_sql_carries_context() {
        let err = memory()
            .fetch(&Query {
                sql: "SELECT * FROM missing".to_string(),
                params: vec![],
            })
            .unwrap_err();
        assert_eq!(err.to_string(), "failed to prepare statement");
    }

    #[test]
    fn oversized_unsigned_is_rejected() {
        let err = datatype_to_rusqlite_value(&DataType::Uint64(Some(u64::MAX))).unwrap_err();
        assert_eq!(err.to_string(), "unsigned value exceeds SQLite integer range");

        let max = i64::MAX.unsigned_abs();
        let value = datatype_to_rusqlite_value(&DataType::Uint64(Some(max))).expect("in range");
        assert_eq!(value, rusqlite::types::Value::Integer(i64::MAX));
    }

    #[test]
    fn default_options() {
        let options = ConnectOptions::load().expect("load");
        assert!(!options.database.is_empty());
    }
}
