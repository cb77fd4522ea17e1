//! User Storage
//! Mission: Persist user accounts with SQLite behind a repository contract

use anyhow::{Context, Result};
use rusqlite::{params, Connection, Row};
use tracing::info;

use crate::auth::models::{PageQuery, User};

/// Find/Create/Update/Delete contract for user records, keyed by id and by
/// email. The auth subsystem depends on this trait only; SQLite below is one
/// implementation.
pub trait UserRepository: Send + Sync {
    fn find_all(&self, query: &PageQuery) -> Result<Vec<User>>;
    fn find_by_id(&self, id: &str) -> Result<Option<User>>;
    fn find_by_email(&self, email: &str) -> Result<Option<User>>;
    fn create(&self, user: &User) -> Result<()>;
    fn update(&self, user: &User) -> Result<()>;
    /// Returns false when no such user existed.
    fn delete(&self, id: &str) -> Result<bool>;
}

/// Clamp a page/size pair to the bounded paging contract: size in [1, 100]
/// defaulting to 50 when non-positive, page defaulting to 1 when
/// non-positive. Returns (offset, limit).
pub fn paginate(page: Option<i64>, size: Option<i64>) -> (i64, i64) {
    let size = match size.unwrap_or(0) {
        s if s > 100 => 100,
        s if s <= 0 => 50,
        s => s,
    };

    let page = match page.unwrap_or(0) {
        p if p <= 0 => 1,
        p => p,
    };

    ((page - 1) * size, size)
}

/// User storage with SQLite backend
pub struct SqliteUserStore {
    db_path: String,
}

impl SqliteUserStore {
    /// Create a new user store and initialize the schema.
    pub fn new(db_path: &str) -> Result<Self> {
        let store = Self {
            db_path: db_path.to_string(),
        };
        store.init_db()?;
        Ok(store)
    }

    fn init_db(&self) -> Result<()> {
        let conn = Connection::open(&self.db_path)?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                email TEXT UNIQUE NOT NULL,
                name TEXT NOT NULL,
                password_hash TEXT NOT NULL,
                roles TEXT NOT NULL,
                created_at TEXT NOT NULL
            )",
            [],
        )?;

        info!("💾 User store ready at: {}", self.db_path);
        Ok(())
    }

    fn open(&self) -> Result<Connection> {
        Connection::open(&self.db_path).context("Failed to open user database")
    }
}

fn row_to_user(row: &Row<'_>) -> rusqlite::Result<User> {
    let roles_json: String = row.get(4)?;
    Ok(User {
        id: row.get(0)?,
        email: row.get(1)?,
        name: row.get(2)?,
        password_hash: row.get(3)?,
        // Unreadable roles content degrades to an empty role set
        roles: serde_json::from_str(&roles_json).unwrap_or_default(),
        created_at: row.get(5)?,
    })
}

const USER_COLUMNS: &str = "id, email, name, password_hash, roles, created_at";

impl UserRepository for SqliteUserStore {
    fn find_all(&self, query: &PageQuery) -> Result<Vec<User>> {
        let (offset, limit) = paginate(query.page, query.size);
        let conn = self.open()?;

        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM users ORDER BY created_at LIMIT ?1 OFFSET ?2",
            USER_COLUMNS
        ))?;

        let users = stmt
            .query_map(params![limit, offset], row_to_user)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(users)
    }

    fn find_by_id(&self, id: &str) -> Result<Option<User>> {
        let conn = self.open()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM users WHERE id = ?1",
            USER_COLUMNS
        ))?;

        match stmt.query_row(params![id], row_to_user) {
            Ok(user) => Ok(Some(user)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let conn = self.open()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM users WHERE email = ?1",
            USER_COLUMNS
        ))?;

        match stmt.query_row(params![email], row_to_user) {
            Ok(user) => Ok(Some(user)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn create(&self, user: &User) -> Result<()> {
        let conn = self.open()?;
        conn.execute(
            "INSERT INTO users (id, email, name, password_hash, roles, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                user.id,
                user.email,
                user.name,
                user.password_hash,
                serde_json::to_string(&user.roles)?,
                user.created_at,
            ],
        )
        .context("Failed to insert user")?;

        info!("✅ Created user: {} ({})", user.email, user.id);
        Ok(())
    }

    fn update(&self, user: &User) -> Result<()> {
        let conn = self.open()?;
        let rows = conn
            .execute(
                "UPDATE users SET email = ?2, name = ?3, password_hash = ?4,
                 roles = ?5, created_at = ?6 WHERE id = ?1",
                params![
                    user.id,
                    user.email,
                    user.name,
                    user.password_hash,
                    serde_json::to_string(&user.roles)?,
                    user.created_at,
                ],
            )
            .context("Failed to update user")?;

        if rows == 0 {
            anyhow::bail!("User not found");
        }
        Ok(())
    }

    fn delete(&self, id: &str) -> Result<bool> {
        let conn = self.open()?;
        let rows = conn.execute("DELETE FROM users WHERE id = ?1", params![id])?;

        if rows > 0 {
            info!("🗑️  Deleted user: {}", id);
        }
        Ok(rows > 0)
    }
}
