use std::sync::Arc;
use log::{debug, info, warn};
use crate::api::{Backend, PostUpdate};
use super::entities::{Post, PostContent, PostId, Revision, RevisionId};
use super::error::{Error, Result, ValidationError};
use super::status::{PostStatus, Role};

/**
 * Points at whatever the editing form writes to: the
 * post itself, or the live-edit revision of a
 * published post.
 */
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditHandle {
  Post {
    post_id: PostId
  },
  Revision {
    post_id: PostId,
    revision_id: RevisionId
  }
}

impl EditHandle {
  pub fn post_id(&self) -> PostId {
    match self {
      EditHandle::Post { post_id } => *post_id,
      EditHandle::Revision { post_id, .. } => *post_id
    }
  }

  pub fn revision_id(&self) -> Option<RevisionId> {
    match self {
      EditHandle::Post { .. } => None,
      EditHandle::Revision { revision_id, .. } => Some(*revision_id)
    }
  }

  pub fn is_revision(&self) -> bool {
    matches!(self, EditHandle::Revision { .. })
  }
}

// What a save sends back, depending on the handle.
#[derive(Debug, Clone, PartialEq)]
pub enum SavedRecord {
  Post(Post),
  Revision(Revision)
}

// Result of opening a post: the handle and the field
// values the form should start from.
#[derive(Debug, Clone, PartialEq)]
pub struct OpenedEdit {
  pub handle: EditHandle,
  pub content: PostContent,
  pub post_status: PostStatus
}

impl OpenedEdit {
  fn direct(post: &Post) -> Self {
    Self {
      handle: EditHandle::Post { post_id: post.id },
      content: post.content.clone(),
      post_status: post.status
    }
  }

  fn revision(post_id: PostId, revision: Revision) -> Self {
    Self {
      handle: EditHandle::Revision { post_id, revision_id: revision.id },
      content: revision.content,
      // Revisions only exist for published posts.
      post_status: PostStatus::Published
    }
  }
}

pub struct RevisionManager {
  backend: Arc<dyn Backend>
}

impl RevisionManager {

  pub fn new(backend: Arc<dyn Backend>) -> Self {
    Self { backend }
  }

  // Reviewers work on the live post directly, as does
  // everybody for posts that aren't published.
  pub fn edits_through_revision(status: PostStatus, role: Role) -> bool {
    status == PostStatus::Published && role != Role::Reviewer
  }

  /**
   * Decides what the form for "post" writes to.
   * Looks for the active revision first and only
   * creates one when there's none, so calling this
   * again after a failure never makes a duplicate.
   */
  pub async fn open_for_edit(&self, post: &Post, role: Role) -> Result<OpenedEdit> {
    if !Self::edits_through_revision(post.status, role) {
      debug!("Post {} opened for direct edit ({})", post.id, post.status);
      return Ok(OpenedEdit::direct(post));
    }
    if let Some(revision) = self.backend.active_revision(post.id).await? {
      debug!("Resuming revision {} of post {}", revision.id, post.id);
      return Ok(OpenedEdit::revision(post.id, revision));
    }
    match self.backend.create_revision(post.id).await {
      Ok(revision) => {
        info!("Created revision {} for post {}", revision.id, post.id);
        Ok(OpenedEdit::revision(post.id, revision))
      },
      Err(Error::Conflict(message)) => {
        warn!("Conflict creating a revision for post {}: {}", post.id, message);
        self.recover_from_conflict(post.id, message).await
      },
      Err(e) => Err(e)
    }
  }

  // Somebody else got there first. Either they opened a
  // revision (we pick it up) or the post isn't published
  // anymore (we edit it directly).
  async fn recover_from_conflict(
    &self,
    post_id: PostId,
    message: String
  ) -> Result<OpenedEdit> {
    if let Some(revision) = self.backend.active_revision(post_id).await? {
      return Ok(OpenedEdit::revision(post_id, revision));
    }
    let post = self.backend.fetch_post(post_id).await?;
    if post.status != PostStatus::Published {
      warn!(
        "Post {} is {} now, falling back to direct edit",
        post_id,
        post.status
      );
      return Ok(OpenedEdit::direct(&post));
    }
    Err(Error::Conflict(message))
  }

  // Writes the fields only, status is left alone.
  pub async fn save(&self, handle: EditHandle, fields: &PostContent) -> Result<SavedRecord> {
    match handle {
      EditHandle::Post { post_id } => {
        let update = PostUpdate::fields_only(fields.clone());
        let post = self.backend.update_post(post_id, &update).await?;
        Ok(SavedRecord::Post(post))
      },
      EditHandle::Revision { revision_id, .. } => {
        let revision = self.backend.update_revision(revision_id, fields).await?;
        Ok(SavedRecord::Revision(revision))
      }
    }
  }

  // Applies the revision to its post. Failures are
  // handed back as they are, no retrying.
  pub async fn publish(&self, handle: EditHandle) -> Result<Post> {
    let revision_id = handle.revision_id().ok_or(ValidationError::NotARevision)?;
    let post = self.backend.publish_revision(revision_id).await?;
    info!("Revision {} published onto post {}", revision_id, post.id);
    Ok(post)
  }

  // Irreversible. Callers have to get a confirmation
  // from the user before getting here.
  pub async fn discard(&self, handle: EditHandle) -> Result<()> {
    let revision_id = handle.revision_id().ok_or(ValidationError::NotARevision)?;
    self.backend.discard_revision(revision_id).await?;
    info!("Revision {} of post {} discarded", revision_id, handle.post_id());
    Ok(())
  }

}
