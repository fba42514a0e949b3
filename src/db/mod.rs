use rusqlite::{params, OptionalExtension, Params, Row};
use r2d2_sqlite::SqliteConnectionManager;
pub mod entities;
mod mappers;
use eyre::WrapErr;
use color_eyre::Result;
pub use entities::StoredSession;
use mappers::map_session;

// Type alias to make function signatures much clearer:
pub type Pool = r2d2::Pool<SqliteConnectionManager>;

const SESSION_FIELDS: &str =
  "post_id, revision_id, status, form, saved_form, updated_at";

/**
 * Local store for editing sessions. Only the command
 * line uses it, to keep form values around between
 * two invocations. The backend stays the reference for
 * everything else.
 */
pub fn open_store(path: &str) -> Result<Pool> {
  let manager = SqliteConnectionManager::file(path);
  let pool = Pool::new(manager)
    .context("Opening session database")?;
  create_schema(&pool)?;
  Ok(pool)
}

fn create_schema(pool: &Pool) -> Result<()> {
  let conn = pool.get()?;
  conn.execute_batch(
    "CREATE TABLE IF NOT EXISTS sessions (
      id INTEGER PRIMARY KEY AUTOINCREMENT,
      post_id INTEGER NOT NULL UNIQUE,
      revision_id INTEGER,
      status TEXT NOT NULL,
      form TEXT NOT NULL,
      saved_form TEXT NOT NULL,
      updated_at INTEGER NOT NULL
    )"
  ).context("Creating sessions table")
}

fn select_many<T, P, F>(
  pool: &Pool,
  query: &str,
  params: P,
  mapper: F
) -> Result<Vec<T>>
  where
    P: Params,
    F: FnMut(&Row<'_>) -> Result<T, rusqlite::Error>,
{
  let conn = pool.get()?;
  let mut stmt = conn.prepare(query)?;
  stmt.query_map(params, mapper)
    .and_then(Iterator::collect)
    .context("Generic select_many query")
}

fn select_one<T, P, F>(
  pool: &Pool,
  query: &str,
  params: P,
  mapper: F
) -> Result<Option<T>>
  where
    P: Params,
    F: FnOnce(&Row<'_>) -> Result<T, rusqlite::Error>,
{
  let conn = pool.get()?;
  let mut stmt = conn.prepare(query)?;
  stmt.query_row(params, mapper)
    .optional()
    .context("Generic select_one query")
}

// There's only ever one session per post, saving
// again replaces the row and the replacement gets a
// fresh id.
pub fn save_session(pool: &Pool, session: &StoredSession) -> Result<()> {
  let conn = pool.get()?;
  conn.execute(
    &format!("INSERT OR REPLACE INTO sessions ({}) VALUES (?, ?, ?, ?, ?, ?)", SESSION_FIELDS),
    params![
      session.post_id,
      session.revision_id,
      session.status,
      session.form,
      session.saved_form,
      session.updated_at
    ]
  ).context("Saving session")?;
  Ok(())
}

pub fn load_session(pool: &Pool, post_id: i64) -> Result<Option<StoredSession>> {
  select_one(
    pool,
    &format!("SELECT {} FROM sessions WHERE post_id = ?", SESSION_FIELDS),
    params![post_id],
    map_session
  )
}

// Ids only ever grow (AUTOINCREMENT), so the highest
// one is the session written last even when several
// share the same updated_at second.
pub fn latest_session(pool: &Pool) -> Result<Option<StoredSession>> {
  select_one(
    pool,
    &format!(
      "SELECT {} FROM sessions ORDER BY id DESC LIMIT 1",
      SESSION_FIELDS
    ),
    params![],
    map_session
  )
}

pub fn all_sessions(pool: &Pool) -> Result<Vec<StoredSession>> {
  select_many(
    pool,
    &format!(
      "SELECT {} FROM sessions ORDER BY id DESC",
      SESSION_FIELDS
    ),
    params![],
    map_session
  )
}

pub fn delete_session(pool: &Pool, post_id: i64) -> Result<bool> {
  let conn = pool.get()?;
  let count = conn.execute("DELETE FROM sessions WHERE post_id = ?", params![post_id])
    .context("Deleting session")?;
  Ok(count > 0)
}
