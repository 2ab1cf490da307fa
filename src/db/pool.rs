//! Explicitly owned database pool handle.
//!
//! [`Database`] wraps a `mysql::Pool` built from [`DbConfig`] and is cheap
//! to clone; inject it wherever database operations run instead of keeping
//! module-level global state. Connections are scoped per logical operation
//! by the pool, so release is guaranteed on both success and failure paths.
//!
//! Query text uses literal `?` positional placeholders - the same token the
//! driver understands, so no translation pass is needed.

use crate::config::DbConfig;
use crate::error::DbError;
use crate::route::CallArgs;
use mysql::prelude::Queryable;
use mysql::{Opts, OptsBuilder, Params, Pool, PoolConstraints, PoolOpts, Row, TxOpts};
use serde_json::Value;
use tracing::{debug, info};

#[derive(Debug, Clone)]
pub struct Database {
    pool: Pool,
}

impl Database {
    /// Create the connection pool.
    pub fn connect(cfg: &DbConfig) -> Result<Self, DbError> {
        info!(
            host = %cfg.host,
            port = cfg.port,
            db = %cfg.db,
            minsize = cfg.minsize,
            maxsize = cfg.maxsize,
            "Creating db connection pool"
        );
        let constraints = PoolConstraints::new(cfg.minsize, cfg.maxsize).ok_or(
            DbError::PoolSize {
                min: cfg.minsize,
                max: cfg.maxsize,
            },
        )?;
        let mut init = vec![format!("SET NAMES {}", cfg.charset)];
        if !cfg.autocommit {
            init.push("SET autocommit=0".to_string());
        }
        let opts: Opts = OptsBuilder::new()
            .ip_or_hostname(Some(cfg.host.clone()))
            .tcp_port(cfg.port)
            .user(Some(cfg.user.clone()))
            .pass(Some(cfg.password.clone()))
            .db_name(Some(cfg.db.clone()))
            .init(init)
            .pool_opts(PoolOpts::default().with_constraints(constraints))
            .into();
        let pool = Pool::new(opts)?;
        info!("Connection pool created");
        Ok(Self { pool })
    }

    /// Execute a `select`, returning rows as JSON maps keyed by column name.
    ///
    /// `size` caps the number of rows fetched, when given.
    pub fn select(
        &self,
        sql: &str,
        args: &[Value],
        size: Option<usize>,
    ) -> Result<Vec<CallArgs>, DbError> {
        debug!(sql = %sql, "SQL");
        let mut conn = self.pool.get_conn()?;
        let result = conn.exec_iter(sql, to_params(args))?;
        let mut rows = Vec::new();
        for row in result {
            if size.is_some_and(|s| rows.len() >= s) {
                break;
            }
            rows.push(row_to_map(row?));
        }
        debug!(rows = rows.len(), "Rows returned");
        Ok(rows)
    }

    /// Execute an `insert`/`update`/`delete`, returning the affected row
    /// count.
    ///
    /// With `autocommit` off the statement runs inside an explicit
    /// transaction: failure rolls back and re-raises, success commits.
    pub fn execute(&self, sql: &str, args: &[Value], autocommit: bool) -> Result<u64, DbError> {
        debug!(sql = %sql, autocommit, "SQL");
        let mut conn = self.pool.get_conn()?;
        if autocommit {
            let result = conn.exec_iter(sql, to_params(args))?;
            return Ok(result.affected_rows());
        }
        let mut tx = conn.start_transaction(TxOpts::default())?;
        let affected = match tx.exec_iter(sql, to_params(args)) {
            Ok(result) => result.affected_rows(),
            Err(e) => {
                tx.rollback()?;
                return Err(e.into());
            }
        };
        tx.commit()?;
        Ok(affected)
    }
}

fn to_params(args: &[Value]) -> Params {
    if args.is_empty() {
        return Params::Empty;
    }
    Params::Positional(args.iter().map(json_to_sql).collect())
}

/// JSON argument -> driver value.
fn json_to_sql(value: &Value) -> mysql::Value {
    match value {
        Value::Null => mysql::Value::NULL,
        Value::Bool(b) => mysql::Value::Int(i64::from(*b)),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                mysql::Value::Int(i)
            } else if let Some(u) = n.as_u64() {
                mysql::Value::UInt(u)
            } else {
                mysql::Value::Double(n.as_f64().unwrap_or_default())
            }
        }
        Value::String(s) => mysql::Value::Bytes(s.clone().into_bytes()),
        other => mysql::Value::Bytes(other.to_string().into_bytes()),
    }
}

/// Driver value -> JSON.
fn sql_to_json(value: mysql::Value) -> Value {
    match value {
        mysql::Value::NULL => Value::Null,
        mysql::Value::Bytes(bytes) => Value::String(String::from_utf8_lossy(&bytes).into_owned()),
        mysql::Value::Int(i) => Value::from(i),
        mysql::Value::UInt(u) => Value::from(u),
        mysql::Value::Float(f) => Value::from(f64::from(f)),
        mysql::Value::Double(d) => Value::from(d),
        mysql::Value::Date(y, mo, d, h, mi, s, _us) => Value::String(format!(
            "{y:04}-{mo:02}-{d:02} {h:02}:{mi:02}:{s:02}"
        )),
        mysql::Value::Time(neg, days, h, m, s, _us) => {
            let sign = if neg { "-" } else { "" };
            let hours = u32::from(h) + days * 24;
            Value::String(format!("{sign}{hours:02}:{m:02}:{s:02}"))
        }
    }
}

fn row_to_map(row: Row) -> CallArgs {
    let columns = row.columns();
    let mut map = CallArgs::new();
    for (i, value) in row.unwrap().into_iter().enumerate() {
        let name = columns
            .get(i)
            .map(|c| c.name_str().into_owned())
            .unwrap_or_else(|| i.to_string());
        map.insert(name, sql_to_json(value));
    }
    map
}
