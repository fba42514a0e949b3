use async_trait::async_trait;
use crate::workflow::entities::*;
use crate::workflow::error::Result;
use crate::workflow::status::PostStatus;
pub mod dtos;
pub mod http;

pub use http::HttpBackend;

// Everything needed to write a post back. Status is
// only sent when the write is also a transition.
#[derive(Debug, Clone, PartialEq)]
pub struct PostUpdate {
  pub content: PostContent,
  pub status: Option<PostStatus>,
  pub review_comments: Option<String>
}

impl PostUpdate {
  pub fn fields_only(content: PostContent) -> Self {
    Self {
      content,
      status: None,
      review_comments: None
    }
  }
}

/**
 * The REST backend as the workflow sees it. The backend
 * is the final authority on permissions, whatever the
 * client checks is only there to avoid pointless calls.
 *
 * A missing active revision is Ok(None), not an error.
 * A second revision for the same post must come back
 * as Error::Conflict.
 */
#[async_trait]
pub trait Backend: Send + Sync {
  async fn fetch_post(&self, id: PostId) -> Result<Post>;

  async fn create_post(&self, content: &PostContent) -> Result<Post>;

  async fn update_post(&self, id: PostId, update: &PostUpdate) -> Result<Post>;

  async fn delete_post(&self, id: PostId) -> Result<()>;

  async fn active_revision(&self, post_id: PostId) -> Result<Option<Revision>>;

  async fn create_revision(&self, post_id: PostId) -> Result<Revision>;

  async fn update_revision(&self, id: RevisionId, content: &PostContent) -> Result<Revision>;

  async fn publish_revision(&self, id: RevisionId) -> Result<Post>;

  async fn discard_revision(&self, id: RevisionId) -> Result<()>;

  async fn request_deletion(&self, post_id: PostId, reason: &str) -> Result<DeletionRequest>;

  async fn my_deletion_requests(&self) -> Result<Vec<DeletionRequest>>;

  async fn pending_deletion_requests(&self) -> Result<Vec<DeletionRequest>>;

  async fn approve_deletion(&self, id: DeletionRequestId) -> Result<()>;

  async fn deny_deletion(&self, id: DeletionRequestId) -> Result<()>;

  async fn post_history(&self, post_id: PostId) -> Result<Vec<HistoryEntry>>;
}
