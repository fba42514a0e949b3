use eyre::WrapErr;
use color_eyre::Result;
use crate::workflow::entities::PostContent;
use crate::workflow::{EditHandle, SessionSnapshot};

// One editing session as stored locally. Form values
// go in as JSON text, SQLite doesn't need to know
// what's in there.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredSession {
  pub post_id: i64,
  pub revision_id: Option<i64>,
  pub status: String,
  pub form: String,
  pub saved_form: String,
  pub updated_at: i64
}

impl StoredSession {

  // Returns None when the snapshot isn't attached to a
  // post anymore (nothing loaded, discarded, deleted).
  pub fn from_snapshot(
    snapshot: &SessionSnapshot,
    updated_at: i64
  ) -> Result<Option<Self>> {
    let (handle, post) = match (snapshot.handle, &snapshot.post) {
      (Some(handle), Some(post)) => (handle, post),
      _ => return Ok(None)
    };
    Ok(Some(Self {
      post_id: handle.post_id(),
      revision_id: handle.revision_id(),
      status: post.status.to_string(),
      form: serde_json::to_string(&snapshot.form)
        .context("Serializing form")?,
      saved_form: serde_json::to_string(&snapshot.saved)
        .context("Serializing saved form")?,
      updated_at
    }))
  }

  pub fn form(&self) -> Result<PostContent> {
    serde_json::from_str(&self.form)
      .context("Parsing stored form")
  }

  pub fn saved_form(&self) -> Result<PostContent> {
    serde_json::from_str(&self.saved_form)
      .context("Parsing stored saved form")
  }

  // Unsaved edits are whatever differs from what was
  // last saved.
  pub fn unsaved_form(&self) -> Result<Option<PostContent>> {
    let form = self.form()?;
    if form == self.saved_form()? {
      Ok(None)
    } else {
      Ok(Some(form))
    }
  }

  pub fn handle(&self) -> EditHandle {
    match self.revision_id {
      Some(revision_id) => EditHandle::Revision {
        post_id: self.post_id,
        revision_id
      },
      None => EditHandle::Post { post_id: self.post_id }
    }
  }

}
