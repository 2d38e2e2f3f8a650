//! SQLite implementation of the data access primitive.

use std::{
    path::Path,
    sync::{Arc, Mutex, MutexGuard},
};

use clearmarkup_config::config::DbConfig;
use rusqlite::{params_from_iter, Connection};
use tracing::{debug, warn};

use crate::{
    error::{DbError, Result},
    expr::{quote_identifier, where_clause},
    query::{
        clause::{LimitSpec, OrderSpec},
        conditions::Conditions,
    },
    traits::Primitive,
    value::{Row, Value},
};

/// A SQLite database behind a shared connection.
///
/// Table names get the configured prefix. When logging is enabled every
/// statement is kept, with its parameters inlined, and can be read back
/// with [`log`](SqliteDatabase::log).
pub struct SqliteDatabase {
    conn: Arc<Mutex<Connection>>,
    prefix: String,
    logging: bool,
    queries: Mutex<Vec<String>>,
}

impl SqliteDatabase {
    /// Opens (or creates) a database file in WAL mode.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path.as_ref())?;
        conn.execute_batch("PRAGMA journal_mode = WAL;")?;
        debug!(path = %path.as_ref().display(), "opened sqlite database");
        Self::init(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    /// Opens the database described by the `[db]` config section.
    pub fn from_config(config: &DbConfig) -> Result<Self> {
        if !config.db_type().eq_ignore_ascii_case("sqlite") {
            return Err(DbError::UnsupportedDriver(config.db_type().to_string()));
        }

        let db = match config.database.as_deref() {
            None | Some(":memory:") => Self::open_in_memory()?,
            Some(path) => Self::open(path)?,
        };

        Ok(db
            .with_prefix(config.prefix())
            .with_logging(config.logging()))
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            prefix: String::new(),
            logging: false,
            queries: Mutex::new(Vec::new()),
        })
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn with_logging(mut self, logging: bool) -> Self {
        self.logging = logging;
        self
    }

    /// Shared handle to the underlying connection.
    pub fn connection(&self) -> Arc<Mutex<Connection>> {
        Arc::clone(&self.conn)
    }

    /// Runs raw SQL statements, e.g. schema setup.
    pub fn execute_batch(&self, sql: &str) -> Result<()> {
        self.record(sql, &[]);
        self.lock()?.execute_batch(sql)?;
        Ok(())
    }

    /// Statements run so far, oldest first. Empty unless logging is enabled.
    pub fn log(&self) -> Vec<String> {
        self.queries
            .lock()
            .map(|queries| queries.clone())
            .unwrap_or_default()
    }

    /// The most recent statement, if logging is enabled.
    pub fn last(&self) -> Option<String> {
        self.queries
            .lock()
            .ok()
            .and_then(|queries| queries.last().cloned())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| DbError::PoisonError)
    }

    fn table(&self, name: &str) -> String {
        quote_identifier(&format!("{}{}", self.prefix, name))
    }

    fn record(&self, sql: &str, params: &[Value]) {
        debug!(sql, params = params.len(), "executing statement");
        if !self.logging {
            return;
        }
        if let Ok(mut queries) = self.queries.lock() {
            queries.push(inline_params(sql, params));
        }
    }

    fn query(&self, sql: &str, params: &[Value]) -> Result<Vec<Row>> {
        self.record(sql, params);
        let conn = self.lock()?;
        let mut stmt = conn.prepare(sql)?;
        let names = stmt
            .column_names()
            .into_iter()
            .map(String::from)
            .collect::<Vec<_>>();

        let rows = stmt
            .query_map(params_from_iter(params.iter()), |row| {
                names
                    .iter()
                    .enumerate()
                    .map(|(idx, name)| -> rusqlite::Result<(String, Value)> {
                        Ok((name.clone(), row.get(idx)?))
                    })
                    .collect::<rusqlite::Result<Row>>()
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    fn execute(&self, sql: &str, params: &[Value]) -> Result<usize> {
        self.record(sql, params);
        let conn = self.lock()?;
        Ok(conn.execute(sql, params_from_iter(params.iter()))?)
    }

    fn scalar(&self, sql: &str, params: &[Value]) -> Result<i64> {
        self.record(sql, params);
        let conn = self.lock()?;
        Ok(conn.query_row(sql, params_from_iter(params.iter()), |row| row.get(0))?)
    }

    fn select_sql(
        &self,
        table: &str,
        columns: Option<&[String]>,
        conditions: &Conditions,
        order: Option<&OrderSpec>,
        limit: Option<&LimitSpec>,
        params: &mut Vec<Value>,
    ) -> Result<String> {
        let columns = match columns {
            Some(columns) if !columns.is_empty() => columns
                .iter()
                .map(|c| quote_identifier(c))
                .collect::<Vec<_>>()
                .join(", "),
            _ => "*".to_string(),
        };

        let mut sql = format!("SELECT {} FROM {}", columns, self.table(table));
        sql.push_str(&where_clause(conditions, params)?);

        if let Some(order) = order.filter(|o| !o.is_empty()) {
            let clauses = order
                .clauses()
                .iter()
                .map(|c| format!("{} {}", quote_identifier(&c.column), c.direction))
                .collect::<Vec<_>>()
                .join(", ");
            sql.push_str(&format!(" ORDER BY {}", clauses));
        }

        if let Some(limit) = limit {
            sql.push_str(&format!(" LIMIT {}", limit.count()));
            if let Some(offset) = limit.offset() {
                sql.push_str(&format!(" OFFSET {}", offset));
            }
        }

        Ok(sql)
    }
}

/// Splits an update key into its column and arithmetic operator.
fn assignment(key: &str) -> Result<(&str, Option<&'static str>)> {
    let Some(stripped) = key.strip_suffix(']') else {
        return Ok((key, None));
    };
    let Some(pos) = stripped.rfind('[') else {
        return Ok((key, None));
    };
    let op = match &stripped[pos + 1..] {
        "+" => "+",
        "-" => "-",
        "*" => "*",
        "/" => "/",
        other => {
            return Err(DbError::invalid_condition(
                key,
                format!("unknown update operator `[{other}]`"),
            ))
        }
    };
    Ok((&stripped[..pos], Some(op)))
}

fn inline_params(sql: &str, params: &[Value]) -> String {
    let mut params = params.iter();
    let mut out = String::with_capacity(sql.len());
    for ch in sql.chars() {
        if ch == '?' {
            match params.next() {
                Some(Value::Text(text)) => {
                    out.push('\'');
                    out.push_str(&text.replace('\'', "''"));
                    out.push('\'');
                    continue;
                }
                Some(value) => {
                    out.push_str(&value.to_string());
                    continue;
                }
                None => {}
            }
        }
        out.push(ch);
    }
    out
}

impl Primitive for SqliteDatabase {
    fn select(
        &self,
        table: &str,
        columns: Option<&[String]>,
        conditions: &Conditions,
        order: Option<&OrderSpec>,
        limit: Option<&LimitSpec>,
    ) -> Result<Vec<Row>> {
        let mut params = Vec::new();
        let sql = self.select_sql(table, columns, conditions, order, limit, &mut params)?;
        self.query(&sql, &params)
    }

    fn get(
        &self,
        table: &str,
        columns: Option<&[String]>,
        conditions: &Conditions,
        order: Option<&OrderSpec>,
    ) -> Result<Option<Row>> {
        let mut params = Vec::new();
        let limit = LimitSpec::Count(1);
        let sql = self.select_sql(table, columns, conditions, order, Some(&limit), &mut params)?;
        Ok(self.query(&sql, &params)?.into_iter().next())
    }

    fn has(&self, table: &str, conditions: &Conditions) -> Result<bool> {
        let mut params = Vec::new();
        let sql = format!(
            "SELECT EXISTS(SELECT 1 FROM {}{})",
            self.table(table),
            where_clause(conditions, &mut params)?
        );
        Ok(self.scalar(&sql, &params)? != 0)
    }

    fn count(&self, table: &str, conditions: &Conditions) -> Result<u64> {
        let mut params = Vec::new();
        let sql = format!(
            "SELECT COUNT(*) FROM {}{}",
            self.table(table),
            where_clause(conditions, &mut params)?
        );
        Ok(self.scalar(&sql, &params)? as u64)
    }

    fn insert(&self, table: &str, data: &Row) -> Result<i64> {
        let sql = if data.is_empty() {
            format!("INSERT INTO {} DEFAULT VALUES", self.table(table))
        } else {
            let columns = data
                .names()
                .map(quote_identifier)
                .collect::<Vec<_>>()
                .join(", ");
            let placeholders = vec!["?"; data.len()].join(", ");
            format!(
                "INSERT INTO {} ({}) VALUES ({})",
                self.table(table),
                columns,
                placeholders
            )
        };
        let params = data.iter().map(|(_, v)| v.clone()).collect::<Vec<_>>();

        self.record(&sql, &params);
        let conn = self.lock()?;
        conn.execute(&sql, params_from_iter(params.iter()))?;
        Ok(conn.last_insert_rowid())
    }

    fn update(&self, table: &str, data: &Row, conditions: &Conditions) -> Result<usize> {
        if data.is_empty() {
            return Err(DbError::EmptyUpdate(table.to_string()));
        }

        let mut params = Vec::with_capacity(data.len());
        let mut sets = Vec::with_capacity(data.len());
        for (key, value) in data.iter() {
            let (column, op) = assignment(key)?;
            let column = quote_identifier(column);
            match op {
                Some(op) => sets.push(format!("{column} = {column} {op} ?")),
                None => sets.push(format!("{column} = ?")),
            }
            params.push(value.clone());
        }

        let sql = format!(
            "UPDATE {} SET {}{}",
            self.table(table),
            sets.join(", "),
            where_clause(conditions, &mut params)?
        );
        self.execute(&sql, &params)
    }

    fn delete(&self, table: &str, conditions: &Conditions) -> Result<usize> {
        let mut params = Vec::new();
        let sql = format!(
            "DELETE FROM {}{}",
            self.table(table),
            where_clause(conditions, &mut params)?
        );
        self.execute(&sql, &params)
    }

    fn action<T, F>(&self, callback: F) -> Result<T>
    where
        F: FnOnce(&Self) -> Result<T>,
    {
        self.execute_batch("BEGIN")?;
        match callback(self) {
            Ok(value) => {
                self.execute_batch("COMMIT")?;
                Ok(value)
            }
            Err(err) => {
                debug!("rolling back transaction: {}", err);
                if let Err(rollback) = self.execute_batch("ROLLBACK") {
                    warn!("failed to roll back transaction: {}", rollback);
                }
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{query::clause::Direction, Db, Fetched, Projection};

    const SCHEMA: &str = "
        CREATE TABLE cm_users (
            id INTEGER PRIMARY KEY,
            email TEXT NOT NULL,
            status TEXT,
            score INTEGER DEFAULT 0
        );
        CREATE TABLE cm_teams (
            id INTEGER PRIMARY KEY,
            region TEXT,
            owner_id INTEGER
        );
    ";

    fn database() -> SqliteDatabase {
        let db = SqliteDatabase::open_in_memory()
            .unwrap()
            .with_prefix("cm_")
            .with_logging(true);
        db.execute_batch(SCHEMA).unwrap();

        for (email, status) in [
            ("ada@example.com", "active"),
            ("bob@example.com", "banned"),
            ("cyd@example.com", "active"),
            ("dee@example.com", "active"),
        ] {
            db.insert("users", &Row::new().with("email", email).with("status", status))
                .unwrap();
        }
        for (region, owner) in [("EU", Some(1)), ("EU", Some(2)), ("EU", None), ("US", Some(3))] {
            db.insert("teams", &Row::new().with("region", region).with("owner_id", owner))
                .unwrap();
        }
        db
    }

    #[test]
    fn test_select_with_relation() {
        let sqlite = database();
        let mut db = Db::new(&sqlite);

        let rows = db
            .table("users")
            .filter(("status", "active"))
            .rel("teams", ("region", "EU"), "owner_id")
            .order_by(("id", Direction::Desc))
            .select(["id", "email"])
            .unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("email"), Some(&Value::from("ada@example.com")));
        assert_eq!(
            sqlite.last().as_deref(),
            Some(
                "SELECT \"id\", \"email\" FROM \"cm_users\" WHERE (\"status\" = 'active' \
                 AND \"id\" IN (1, 2)) ORDER BY \"id\" DESC"
            )
        );
    }

    #[test]
    fn test_empty_relation_on_real_tables() {
        let sqlite = database();
        let mut db = Db::new(&sqlite);
        let count = db
            .table("users")
            .rel("teams", ("region", "APAC"), "owner_id")
            .count()
            .unwrap();
        assert_eq!(count, 0);
        assert!(sqlite.log().iter().all(|q| !q.contains("FROM \"cm_users\"")));
    }

    #[test]
    fn test_count_has_and_get() {
        let sqlite = database();
        let mut db = Db::new(&sqlite);

        assert_eq!(db.table("users").count().unwrap(), 4);
        assert!(db.table("users").filter(("status", "banned")).has().unwrap());
        assert!(!db.table("users").filter(("status", "gone")).has().unwrap());

        let email = db
            .table("users")
            .filter(("id[>]", 2))
            .order_by("id")
            .get(Projection::single("email", Some("truncate:3")))
            .unwrap();
        assert_eq!(email, Some(Fetched::Scalar(Value::from("cyd..."))));
    }

    #[test]
    fn test_limit_with_offset() {
        let sqlite = database();
        let mut db = Db::new(&sqlite);
        let rows = db
            .table("users")
            .order_by("id")
            .limit((1u64, 2u64))
            .select("id")
            .unwrap();
        let ids = rows
            .iter()
            .filter_map(|r| r.get("id").and_then(Value::as_i64))
            .collect::<Vec<_>>();
        assert_eq!(ids, vec![2, 3]);
    }

    #[test]
    fn test_update_with_arithmetic_and_delete() {
        let sqlite = database();
        let mut db = Db::new(&sqlite);

        let changed = db
            .table("users")
            .filter(("status", "active"))
            .update(&Row::new().with("score[+]", 5))
            .unwrap();
        assert_eq!(changed, 3);

        let score = db.table("users").filter(("id", 1)).get("score").unwrap();
        assert_eq!(score, Some(Fetched::Scalar(Value::Integer(5))));

        let deleted = db
            .table("users")
            .filter(("email[~]", "example.com"))
            .delete()
            .unwrap();
        assert_eq!(deleted, 4);
        assert!(matches!(
            db.table("users").update(&Row::new()),
            Err(DbError::EmptyUpdate(_))
        ));
    }

    #[test]
    fn test_update_assignment_operators() {
        let sqlite = database();
        let mut db = Db::new(&sqlite);

        let steps = [("score[+]", 10), ("score[-]", 4), ("score[*]", 3), ("score[/]", 2)];
        for (key, value) in steps {
            db.table("users")
                .filter(("id", 1))
                .update(&Row::new().with(key, value))
                .unwrap();
        }
        assert_eq!(
            sqlite.last().as_deref(),
            Some("UPDATE \"cm_users\" SET \"score\" = \"score\" / 2 WHERE \"id\" = 1")
        );

        let score = db.table("users").filter(("id", 1)).get("score").unwrap();
        assert_eq!(score, Some(Fetched::Scalar(Value::Integer(9))));

        assert!(matches!(
            db.table("users").update(&Row::new().with("score[%]", 2)),
            Err(DbError::InvalidCondition { .. })
        ));
    }

    #[test]
    fn test_action_keeps_callback_error_when_rollback_fails() {
        let sqlite = database();
        let result: Result<()> = sqlite.action(|p| {
            p.execute_batch("COMMIT")?;
            Err(DbError::MissingTable)
        });
        assert!(matches!(result, Err(DbError::MissingTable)));
    }

    #[test]
    fn test_action_rolls_back_on_error() {
        let sqlite = database();
        let db = Db::new(&sqlite);

        let result: Result<()> = db.transaction(|p| {
            p.delete("users", &Conditions::new())?;
            Err(DbError::MissingTable)
        });
        assert!(result.is_err());
        assert_eq!(sqlite.count("users", &Conditions::new()).unwrap(), 4);

        let id = db
            .transaction(|p| p.insert("users", &Row::new().with("email", "eve@example.com")))
            .unwrap();
        assert_eq!(id, 5);
        assert_eq!(
            db.id_from_selector("users", "email", "eve@example.com").unwrap(),
            Some(Value::Integer(5))
        );
    }

    #[test]
    fn test_from_config() {
        let config = DbConfig {
            db_type: Some("mysql".into()),
            ..Default::default()
        };
        assert!(matches!(
            SqliteDatabase::from_config(&config),
            Err(DbError::UnsupportedDriver(_))
        ));

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.db");
        let config = DbConfig {
            database: Some(path.to_string_lossy().into_owned()),
            prefix: Some("cm_".into()),
            ..Default::default()
        };
        let sqlite = SqliteDatabase::from_config(&config).unwrap();
        sqlite.execute_batch(SCHEMA).unwrap();
        assert_eq!(sqlite.count("users", &Conditions::new()).unwrap(), 0);
        assert!(sqlite.log().is_empty());
        assert!(path.exists());
    }

    #[test]
    fn test_inline_params() {
        assert_eq!(
            inline_params(
                "SELECT * FROM t WHERE a = ? AND b = ?",
                &["it's".into(), Value::Integer(3)]
            ),
            "SELECT * FROM t WHERE a = 'it''s' AND b = 3"
        );
    }
}
