//! SQLite backend for the ownership registry.

use async_trait::async_trait;
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::params;

use super::{RegistryState, StorageBackend};
use crate::core::error::{AppError, AppResult};

pub type DbPool = Pool<SqliteConnectionManager>;
pub type DbConnection = PooledConnection<SqliteConnectionManager>;

/// Relational backend. The three mappings plus the block-list live in
/// normal tables; `save` rewrites them in a single transaction so readers
/// never observe a half-written registry.
pub struct SqliteStore {
    pool: DbPool,
}

impl SqliteStore {
    /// Open (or create) the database at `database_path` and ensure the
    /// schema exists.
    pub fn open(database_path: &str) -> AppResult<Self> {
        let manager = SqliteConnectionManager::file(database_path);
        let pool = Pool::builder().max_size(10).build(manager)?;

        let conn = pool.get()?;
        init_schema(&conn)?;

        Ok(Self { pool })
    }

    /// Backend over an existing pool, for tests and embedding.
    pub fn from_pool(pool: DbPool) -> AppResult<Self> {
        let conn = pool.get()?;
        init_schema(&conn)?;
        Ok(Self { pool })
    }

    fn connection(&self) -> AppResult<DbConnection> {
        self.pool.get().map_err(AppError::from)
    }
}

fn init_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS addresses (
             email    TEXT PRIMARY KEY,
             owner_id INTEGER NOT NULL,
             position INTEGER NOT NULL
         );
         CREATE TABLE IF NOT EXISTS owners (
             owner_id   INTEGER PRIMARY KEY,
             last_email TEXT NOT NULL
         );
         CREATE TABLE IF NOT EXISTS blocked_owners (
             owner_id INTEGER PRIMARY KEY
         );",
    )
}

#[async_trait]
impl StorageBackend for SqliteStore {
    async fn load(&self) -> AppResult<RegistryState> {
        let conn = match self.connection() {
            Ok(conn) => conn,
            Err(e) => {
                log::warn!("Failed to open registry database: {}. Starting empty.", e);
                return Ok(RegistryState::default());
            }
        };

        match read_state(&conn) {
            Ok(state) => Ok(state),
            Err(e) => {
                log::warn!("Failed to read registry tables: {}. Starting empty.", e);
                Ok(RegistryState::default())
            }
        }
    }

    async fn save(&self, state: &RegistryState) -> AppResult<()> {
        let mut conn = self.connection()?;
        let tx = conn.transaction()?;

        tx.execute("DELETE FROM addresses", [])?;
        tx.execute("DELETE FROM owners", [])?;
        tx.execute("DELETE FROM blocked_owners", [])?;

        {
            let mut stmt = tx.prepare("INSERT INTO addresses (email, owner_id, position) VALUES (?1, ?2, ?3)")?;
            for (owner, addresses) in &state.addresses_of {
                for (position, email) in addresses.iter().enumerate() {
                    stmt.execute(params![email, owner, position as i64])?;
                }
            }

            let mut stmt = tx.prepare("INSERT INTO owners (owner_id, last_email) VALUES (?1, ?2)")?;
            for (owner, last_email) in &state.last_address_of {
                stmt.execute(params![owner, last_email])?;
            }

            let mut stmt = tx.prepare("INSERT INTO blocked_owners (owner_id) VALUES (?1)")?;
            for owner in &state.blocked {
                stmt.execute(params![owner])?;
            }
        }

        tx.commit()?;
        Ok(())
    }

    fn strict_writes(&self) -> bool {
        true
    }

    fn describe(&self) -> &'static str {
        "sqlite"
    }
}

fn read_state(conn: &rusqlite::Connection) -> Result<RegistryState, rusqlite::Error> {
    let mut state = RegistryState::default();

    let mut stmt = conn.prepare("SELECT email, owner_id FROM addresses ORDER BY owner_id, position")?;
    let rows = stmt.query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)))?;
    for row in rows {
        let (email, owner) = row?;
        state.owner_of.insert(email.clone(), owner);
        state.addresses_of.entry(owner).or_default().push(email);
    }

    let mut stmt = conn.prepare("SELECT owner_id, last_email FROM owners")?;
    let rows = stmt.query_map([], |row| Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?)))?;
    for row in rows {
        let (owner, last_email) = row?;
        state.last_address_of.insert(owner, last_email);
    }

    let mut stmt = conn.prepare("SELECT owner_id FROM blocked_owners")?;
    let rows = stmt.query_map([], |row| row.get::<_, i64>(0))?;
    for row in rows {
        state.blocked.insert(row?);
    }

    Ok(state)
}
