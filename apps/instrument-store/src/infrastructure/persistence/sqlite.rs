//! SQLite store through SQLx.
//!
//! SQLite admits a single writer. Write transactions are therefore gated by
//! an in-process async lock taken before `BEGIN`, and stock decrements are a
//! single conditional `UPDATE`, so no two orders can both pass the stock
//! check for the same units. Read transactions skip the gate; with WAL they
//! see the last committed state without blocking the writer.
//!
//! Decimals are stored as TEXT to keep exact values, and timestamps as
//! fixed-width RFC 3339 TEXT so that `ORDER BY recorded_at` is chronological.

use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteConnection, SqliteJournalMode, SqlitePoolOptions, SqliteRow,
};
use sqlx::{Row, Sqlite, SqlitePool, Transaction};
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, info};

use crate::application::ports::{Store, StoreError, StoreTx};
use crate::config::PersistenceConfig;
use crate::domain::catalog::{Category, Instrument, InstrumentDraft, PriceEntry};
use crate::domain::identity::{PasswordDigest, Role, User};
use crate::domain::ordering::{Order, OrderLine, OrderStatus, StatusEvent};
use crate::domain::shared::{
    CategoryId, InstrumentId, Money, OrderId, Quantity, Timestamp, UserId,
};

const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS categories (
        id   TEXT PRIMARY KEY,
        name TEXT NOT NULL UNIQUE
    )",
    "CREATE TABLE IF NOT EXISTS instruments (
        id          TEXT PRIMARY KEY,
        code        TEXT NOT NULL UNIQUE,
        name        TEXT NOT NULL,
        brand       TEXT NOT NULL,
        stock       INTEGER NOT NULL CHECK (stock >= 0),
        description TEXT NOT NULL DEFAULT '',
        image       TEXT NOT NULL DEFAULT '',
        category_id TEXT NOT NULL REFERENCES categories(id)
    )",
    "CREATE TABLE IF NOT EXISTS price_entries (
        sequence      INTEGER PRIMARY KEY AUTOINCREMENT,
        instrument_id TEXT NOT NULL REFERENCES instruments(id) ON DELETE CASCADE,
        price         TEXT NOT NULL,
        recorded_at   TEXT NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS price_entries_recency
        ON price_entries (instrument_id, recorded_at, sequence)",
    "CREATE TABLE IF NOT EXISTS roles (
        name TEXT PRIMARY KEY
    )",
    "CREATE TABLE IF NOT EXISTS users (
        id              TEXT PRIMARY KEY,
        first_name      TEXT NOT NULL,
        last_name       TEXT NOT NULL,
        email           TEXT NOT NULL UNIQUE,
        password_digest TEXT NOT NULL,
        role            TEXT NOT NULL REFERENCES roles(name)
    )",
    "CREATE TABLE IF NOT EXISTS orders (
        id         TEXT PRIMARY KEY,
        user_id    TEXT NOT NULL REFERENCES users(id),
        created_at TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS order_lines (
        order_id      TEXT NOT NULL REFERENCES orders(id) ON DELETE CASCADE,
        position      INTEGER NOT NULL,
        instrument_id TEXT NOT NULL REFERENCES instruments(id),
        quantity      INTEGER NOT NULL CHECK (quantity > 0),
        unit_price    TEXT NOT NULL,
        PRIMARY KEY (order_id, position)
    )",
    "CREATE INDEX IF NOT EXISTS order_lines_instrument ON order_lines (instrument_id)",
    "CREATE TABLE IF NOT EXISTS status_events (
        sequence    INTEGER PRIMARY KEY AUTOINCREMENT,
        order_id    TEXT NOT NULL REFERENCES orders(id) ON DELETE CASCADE,
        status      TEXT NOT NULL,
        recorded_at TEXT NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS status_events_order ON status_events (order_id)",
];

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db)
                if db.is_unique_violation()
                    || db.is_foreign_key_violation()
                    || db.is_check_violation() =>
            {
                Self::Constraint {
                    message: db.message().to_string(),
                }
            }
            _ => Self::Backend {
                message: err.to_string(),
            },
        }
    }
}

/// SQLite implementation of [`Store`].
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
    writer: Arc<Mutex<()>>,
}

impl SqliteStore {
    /// Open (creating if needed) the database and apply the schema.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid or the database cannot be
    /// opened or migrated.
    pub async fn connect(config: &PersistenceConfig) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str(&config.url)?
            .create_if_missing(true)
            .foreign_keys(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_millis(config.busy_timeout_ms));

        if let Some(parent) = Path::new(options.get_filename()).parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|e| StoreError::Backend {
                        message: format!("cannot create {}: {e}", parent.display()),
                    })?;
            }
        }

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .connect_with(options)
            .await?;

        let store = Self::with_pool(pool);
        store.migrate().await?;

        info!(
            url = %config.url,
            max_connections = config.max_connections,
            "SQLite store ready"
        );
        Ok(store)
    }

    /// Wrap an existing pool. The schema is not applied.
    #[must_use]
    pub fn with_pool(pool: SqlitePool) -> Self {
        Self {
            pool,
            writer: Arc::new(Mutex::new(())),
        }
    }

    /// Apply the schema; every statement is idempotent.
    ///
    /// # Errors
    ///
    /// Returns an error if any statement fails.
    pub async fn migrate(&self) -> Result<(), StoreError> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        debug!(statements = SCHEMA.len(), "schema applied");
        Ok(())
    }

    /// Close the pool, waiting for checked-out connections.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

/// Transaction over a [`SqliteStore`].
pub struct SqliteTx {
    tx: Transaction<'static, Sqlite>,
    _writer: Option<OwnedMutexGuard<()>>,
}

#[async_trait]
impl Store for SqliteStore {
    type Tx = SqliteTx;

    async fn begin(&self) -> Result<Self::Tx, StoreError> {
        let writer = Arc::clone(&self.writer).lock_owned().await;
        let tx = self.pool.begin().await?;
        Ok(SqliteTx {
            tx,
            _writer: Some(writer),
        })
    }

    async fn read(&self) -> Result<Self::Tx, StoreError> {
        let tx = self.pool.begin().await?;
        Ok(SqliteTx { tx, _writer: None })
    }
}

fn corrupt(what: &str, err: impl std::fmt::Display) -> StoreError {
    StoreError::Corrupt {
        message: format!("{what}: {err}"),
    }
}

fn parse_timestamp(raw: &str) -> Result<Timestamp, StoreError> {
    Timestamp::parse(raw).map_err(|e| corrupt("timestamp", e))
}

fn parse_money(raw: &str) -> Result<Money, StoreError> {
    Decimal::from_str(raw)
        .map(Money::new)
        .map_err(|e| corrupt("decimal", e))
}

fn parse_count(raw: i64) -> Result<u32, StoreError> {
    u32::try_from(raw).map_err(|e| corrupt("count", e))
}

fn instrument_from_row(row: &SqliteRow) -> Result<Instrument, StoreError> {
    let fields = InstrumentDraft {
        code: row.try_get("code")?,
        name: row.try_get("name")?,
        brand: row.try_get("brand")?,
        stock: parse_count(row.try_get("stock")?)?,
        description: row.try_get("description")?,
        image: row.try_get("image")?,
        category_id: CategoryId::new(row.try_get::<String, _>("category_id")?),
    };
    Ok(Instrument::reconstitute(
        InstrumentId::new(row.try_get::<String, _>("id")?),
        fields,
    ))
}

fn price_from_row(row: &SqliteRow) -> Result<PriceEntry, StoreError> {
    Ok(PriceEntry::new(
        InstrumentId::new(row.try_get::<String, _>("instrument_id")?),
        parse_money(&row.try_get::<String, _>("price")?)?,
        parse_timestamp(&row.try_get::<String, _>("recorded_at")?)?,
        row.try_get("sequence")?,
    ))
}

fn category_from_row(row: &SqliteRow) -> Result<Category, StoreError> {
    Ok(Category::reconstitute(
        CategoryId::new(row.try_get::<String, _>("id")?),
        row.try_get("name")?,
    ))
}

fn user_from_row(row: &SqliteRow) -> Result<User, StoreError> {
    let role = row
        .try_get::<String, _>("role")?
        .parse::<Role>()
        .map_err(|e| corrupt("role", e))?;
    Ok(User::reconstitute(
        UserId::new(row.try_get::<String, _>("id")?),
        row.try_get("first_name")?,
        row.try_get("last_name")?,
        row.try_get("email")?,
        PasswordDigest::from_stored(row.try_get("password_digest")?),
        role,
    ))
}

const INSTRUMENT_COLUMNS: &str =
    "id, code, name, brand, stock, description, image, category_id";
const USER_COLUMNS: &str = "id, first_name, last_name, email, password_digest, role";

async fn load_order(
    conn: &mut SqliteConnection,
    header: &SqliteRow,
) -> Result<Order, StoreError> {
    let id: String = header.try_get("id")?;

    let lines = sqlx::query(
        "SELECT instrument_id, quantity, unit_price FROM order_lines
         WHERE order_id = ?1 ORDER BY position",
    )
    .bind(&id)
    .fetch_all(&mut *conn)
    .await?
    .iter()
    .map(|row| -> Result<OrderLine, StoreError> {
        let quantity = Quantity::new(row.try_get("quantity")?).map_err(|e| corrupt("quantity", e))?;
        Ok(OrderLine::new(
            InstrumentId::new(row.try_get::<String, _>("instrument_id")?),
            quantity,
            parse_money(&row.try_get::<String, _>("unit_price")?)?,
        ))
    })
    .collect::<Result<Vec<_>, StoreError>>()?;

    let history = sqlx::query(
        "SELECT status, recorded_at, sequence FROM status_events
         WHERE order_id = ?1 ORDER BY sequence",
    )
    .bind(&id)
    .fetch_all(&mut *conn)
    .await?
    .iter()
    .map(|row| -> Result<StatusEvent, StoreError> {
        let status =
            OrderStatus::new(row.try_get::<String, _>("status")?).map_err(|e| corrupt("status", e))?;
        Ok(StatusEvent::new(
            status,
            parse_timestamp(&row.try_get::<String, _>("recorded_at")?)?,
            row.try_get("sequence")?,
        ))
    })
    .collect::<Result<Vec<_>, StoreError>>()?;

    Ok(Order::reconstitute(
        OrderId::new(id),
        UserId::new(header.try_get::<String, _>("user_id")?),
        parse_timestamp(&header.try_get::<String, _>("created_at")?)?,
        lines,
        history,
    ))
}

#[async_trait]
impl StoreTx for SqliteTx {
    async fn instrument(&mut self, id: &InstrumentId) -> Result<Option<Instrument>, StoreError> {
        let sql = format!("SELECT {INSTRUMENT_COLUMNS} FROM instruments WHERE id = ?1");
        sqlx::query(&sql)
            .bind(id.as_str())
            .fetch_optional(&mut *self.tx)
            .await?
            .as_ref()
            .map(instrument_from_row)
            .transpose()
    }

    async fn instrument_by_code(&mut self, code: &str) -> Result<Option<Instrument>, StoreError> {
        let sql = format!("SELECT {INSTRUMENT_COLUMNS} FROM instruments WHERE code = ?1");
        sqlx::query(&sql)
            .bind(code)
            .fetch_optional(&mut *self.tx)
            .await?
            .as_ref()
            .map(instrument_from_row)
            .transpose()
    }

    async fn instruments(
        &mut self,
        category: Option<&CategoryId>,
    ) -> Result<Vec<Instrument>, StoreError> {
        let sql = format!(
            "SELECT {INSTRUMENT_COLUMNS} FROM instruments
             WHERE ?1 IS NULL OR category_id = ?1
             ORDER BY name, id"
        );
        sqlx::query(&sql)
            .bind(category.map(CategoryId::as_str))
            .fetch_all(&mut *self.tx)
            .await?
            .iter()
            .map(instrument_from_row)
            .collect()
    }

    async fn insert_instrument(&mut self, instrument: &Instrument) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO instruments (id, code, name, brand, stock, description, image, category_id)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        )
        .bind(instrument.id().as_str())
        .bind(instrument.code())
        .bind(instrument.name())
        .bind(instrument.brand())
        .bind(i64::from(instrument.stock()))
        .bind(instrument.description())
        .bind(instrument.image())
        .bind(instrument.category_id().as_str())
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn update_instrument(&mut self, instrument: &Instrument) -> Result<(), StoreError> {
        sqlx::query(
            "UPDATE instruments
             SET code = ?2, name = ?3, brand = ?4, stock = ?5,
                 description = ?6, image = ?7, category_id = ?8
             WHERE id = ?1",
        )
        .bind(instrument.id().as_str())
        .bind(instrument.code())
        .bind(instrument.name())
        .bind(instrument.brand())
        .bind(i64::from(instrument.stock()))
        .bind(instrument.description())
        .bind(instrument.image())
        .bind(instrument.category_id().as_str())
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn delete_instrument(&mut self, id: &InstrumentId) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM instruments WHERE id = ?1")
            .bind(id.as_str())
            .execute(&mut *self.tx)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn instrument_is_ordered(&mut self, id: &InstrumentId) -> Result<bool, StoreError> {
        let row = sqlx::query(
            "SELECT EXISTS (SELECT 1 FROM order_lines WHERE instrument_id = ?1) AS ordered",
        )
        .bind(id.as_str())
        .fetch_one(&mut *self.tx)
        .await?;
        Ok(row.try_get::<i64, _>("ordered")? != 0)
    }

    async fn try_decrement_stock(
        &mut self,
        id: &InstrumentId,
        quantity: Quantity,
    ) -> Result<Option<u32>, StoreError> {
        sqlx::query(
            "UPDATE instruments SET stock = stock - ?2
             WHERE id = ?1 AND stock >= ?2
             RETURNING stock",
        )
        .bind(id.as_str())
        .bind(i64::from(quantity.get()))
        .fetch_optional(&mut *self.tx)
        .await?
        .map(|row| parse_count(row.try_get("stock")?))
        .transpose()
    }

    async fn increment_stock(
        &mut self,
        id: &InstrumentId,
        quantity: Quantity,
    ) -> Result<Option<u32>, StoreError> {
        sqlx::query(
            "UPDATE instruments SET stock = stock + ?2
             WHERE id = ?1 AND stock + ?2 <= 4294967295
             RETURNING stock",
        )
        .bind(id.as_str())
        .bind(i64::from(quantity.get()))
        .fetch_optional(&mut *self.tx)
        .await?
        .map(|row| parse_count(row.try_get("stock")?))
        .transpose()
    }

    async fn append_price(
        &mut self,
        id: &InstrumentId,
        price: Money,
        recorded_at: Timestamp,
    ) -> Result<PriceEntry, StoreError> {
        let row = sqlx::query(
            "INSERT INTO price_entries (instrument_id, price, recorded_at)
             VALUES (?1, ?2, ?3)
             RETURNING sequence",
        )
        .bind(id.as_str())
        .bind(price.amount().to_string())
        .bind(recorded_at.to_storage())
        .fetch_one(&mut *self.tx)
        .await?;
        Ok(PriceEntry::new(
            id.clone(),
            price,
            recorded_at,
            row.try_get("sequence")?,
        ))
    }

    async fn latest_price(&mut self, id: &InstrumentId) -> Result<Option<PriceEntry>, StoreError> {
        sqlx::query(
            "SELECT instrument_id, price, recorded_at, sequence FROM price_entries
             WHERE instrument_id = ?1
             ORDER BY recorded_at DESC, sequence DESC
             LIMIT 1",
        )
        .bind(id.as_str())
        .fetch_optional(&mut *self.tx)
        .await?
        .as_ref()
        .map(price_from_row)
        .transpose()
    }

    async fn price_history(&mut self, id: &InstrumentId) -> Result<Vec<PriceEntry>, StoreError> {
        sqlx::query(
            "SELECT instrument_id, price, recorded_at, sequence FROM price_entries
             WHERE instrument_id = ?1
             ORDER BY recorded_at DESC, sequence DESC",
        )
        .bind(id.as_str())
        .fetch_all(&mut *self.tx)
        .await?
        .iter()
        .map(price_from_row)
        .collect()
    }

    async fn categories(&mut self) -> Result<Vec<Category>, StoreError> {
        sqlx::query("SELECT id, name FROM categories ORDER BY name")
            .fetch_all(&mut *self.tx)
            .await?
            .iter()
            .map(category_from_row)
            .collect()
    }

    async fn category(&mut self, id: &CategoryId) -> Result<Option<Category>, StoreError> {
        sqlx::query("SELECT id, name FROM categories WHERE id = ?1")
            .bind(id.as_str())
            .fetch_optional(&mut *self.tx)
            .await?
            .as_ref()
            .map(category_from_row)
            .transpose()
    }

    async fn category_by_name(&mut self, name: &str) -> Result<Option<Category>, StoreError> {
        sqlx::query("SELECT id, name FROM categories WHERE name = ?1")
            .bind(name)
            .fetch_optional(&mut *self.tx)
            .await?
            .as_ref()
            .map(category_from_row)
            .transpose()
    }

    async fn insert_category(&mut self, category: &Category) -> Result<(), StoreError> {
        sqlx::query("INSERT INTO categories (id, name) VALUES (?1, ?2)")
            .bind(category.id().as_str())
            .bind(category.name())
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }

    async fn update_category(&mut self, category: &Category) -> Result<(), StoreError> {
        sqlx::query("UPDATE categories SET name = ?2 WHERE id = ?1")
            .bind(category.id().as_str())
            .bind(category.name())
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }

    async fn delete_category(&mut self, id: &CategoryId) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM categories WHERE id = ?1")
            .bind(id.as_str())
            .execute(&mut *self.tx)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn category_in_use(&mut self, id: &CategoryId) -> Result<bool, StoreError> {
        let row = sqlx::query(
            "SELECT EXISTS (SELECT 1 FROM instruments WHERE category_id = ?1) AS in_use",
        )
        .bind(id.as_str())
        .fetch_one(&mut *self.tx)
        .await?;
        Ok(row.try_get::<i64, _>("in_use")? != 0)
    }

    async fn roles(&mut self) -> Result<Vec<Role>, StoreError> {
        sqlx::query("SELECT name FROM roles ORDER BY rowid")
            .fetch_all(&mut *self.tx)
            .await?
            .iter()
            .map(|row| -> Result<Role, StoreError> {
                row.try_get::<String, _>("name")?
                    .parse::<Role>()
                    .map_err(|e| corrupt("role", e))
            })
            .collect()
    }

    async fn insert_role(&mut self, role: Role) -> Result<(), StoreError> {
        sqlx::query("INSERT INTO roles (name) VALUES (?1)")
            .bind(role.name())
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }

    async fn users(&mut self) -> Result<Vec<User>, StoreError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users ORDER BY email");
        sqlx::query(&sql)
            .fetch_all(&mut *self.tx)
            .await?
            .iter()
            .map(user_from_row)
            .collect()
    }

    async fn user(&mut self, id: &UserId) -> Result<Option<User>, StoreError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1");
        sqlx::query(&sql)
            .bind(id.as_str())
            .fetch_optional(&mut *self.tx)
            .await?
            .as_ref()
            .map(user_from_row)
            .transpose()
    }

    async fn user_by_email(&mut self, email: &str) -> Result<Option<User>, StoreError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?1");
        sqlx::query(&sql)
            .bind(email)
            .fetch_optional(&mut *self.tx)
            .await?
            .as_ref()
            .map(user_from_row)
            .transpose()
    }

    async fn insert_user(&mut self, user: &User) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO users (id, first_name, last_name, email, password_digest, role)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )
        .bind(user.id().as_str())
        .bind(user.first_name())
        .bind(user.last_name())
        .bind(user.email())
        .bind(user.password().as_str())
        .bind(user.role().name())
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn update_user(&mut self, user: &User) -> Result<(), StoreError> {
        sqlx::query(
            "UPDATE users
             SET first_name = ?2, last_name = ?3, email = ?4, password_digest = ?5, role = ?6
             WHERE id = ?1",
        )
        .bind(user.id().as_str())
        .bind(user.first_name())
        .bind(user.last_name())
        .bind(user.email())
        .bind(user.password().as_str())
        .bind(user.role().name())
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn delete_user(&mut self, id: &UserId) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?1")
            .bind(id.as_str())
            .execute(&mut *self.tx)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn user_has_orders(&mut self, id: &UserId) -> Result<bool, StoreError> {
        let row = sqlx::query("SELECT EXISTS (SELECT 1 FROM orders WHERE user_id = ?1) AS owns")
            .bind(id.as_str())
            .fetch_one(&mut *self.tx)
            .await?;
        Ok(row.try_get::<i64, _>("owns")? != 0)
    }

    async fn insert_order(&mut self, order: &Order) -> Result<(), StoreError> {
        sqlx::query("INSERT INTO orders (id, user_id, created_at) VALUES (?1, ?2, ?3)")
            .bind(order.id().as_str())
            .bind(order.user_id().as_str())
            .bind(order.created_at().to_storage())
            .execute(&mut *self.tx)
            .await?;

        for (position, line) in order.lines().iter().enumerate() {
            sqlx::query(
                "INSERT INTO order_lines (order_id, position, instrument_id, quantity, unit_price)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )
            .bind(order.id().as_str())
            .bind(i64::try_from(position).map_err(|e| corrupt("position", e))?)
            .bind(line.instrument_id().as_str())
            .bind(i64::from(line.quantity().get()))
            .bind(line.unit_price().amount().to_string())
            .execute(&mut *self.tx)
            .await?;
        }
        Ok(())
    }

    async fn append_status(
        &mut self,
        id: &OrderId,
        status: &OrderStatus,
        recorded_at: Timestamp,
    ) -> Result<StatusEvent, StoreError> {
        let row = sqlx::query(
            "INSERT INTO status_events (order_id, status, recorded_at)
             VALUES (?1, ?2, ?3)
             RETURNING sequence",
        )
        .bind(id.as_str())
        .bind(status.as_str())
        .bind(recorded_at.to_storage())
        .fetch_one(&mut *self.tx)
        .await?;
        Ok(StatusEvent::new(
            status.clone(),
            recorded_at,
            row.try_get("sequence")?,
        ))
    }

    async fn order(&mut self, id: &OrderId) -> Result<Option<Order>, StoreError> {
        let header = sqlx::query("SELECT id, user_id, created_at FROM orders WHERE id = ?1")
            .bind(id.as_str())
            .fetch_optional(&mut *self.tx)
            .await?;
        match header {
            Some(header) => Ok(Some(load_order(&mut self.tx, &header).await?)),
            None => Ok(None),
        }
    }

    async fn orders(&mut self, user: Option<&UserId>) -> Result<Vec<Order>, StoreError> {
        let headers = sqlx::query(
            "SELECT id, user_id, created_at FROM orders
             WHERE ?1 IS NULL OR user_id = ?1
             ORDER BY created_at DESC, id DESC",
        )
        .bind(user.map(UserId::as_str))
        .fetch_all(&mut *self.tx)
        .await?;

        let mut orders = Vec::with_capacity(headers.len());
        for header in &headers {
            orders.push(load_order(&mut self.tx, header).await?);
        }
        Ok(orders)
    }

    async fn delete_order(&mut self, id: &OrderId) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM orders WHERE id = ?1")
            .bind(id.as_str())
            .execute(&mut *self.tx)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn commit(self) -> Result<(), StoreError> {
        self.tx.commit().await?;
        Ok(())
    }
}
