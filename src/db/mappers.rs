use super::entities::*;
use rusqlite::{Row, Error};

pub fn map_session(row: &Row) -> Result<StoredSession, Error> {
  Ok(StoredSession {
    post_id: row.get(0)?,
    revision_id: row.get(1)?,
    status: row.get(2)?,
    form: row.get(3)?,
    saved_form: row.get(4)?,
    updated_at: row.get(5)?
  })
}
