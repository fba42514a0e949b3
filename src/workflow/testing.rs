use std::collections::HashMap;
use std::sync::Mutex;
use async_trait::async_trait;
use crate::api::{Backend, PostUpdate};
use crate::utils::time_utils::current_datetime;
use super::entities::*;
use super::error::{Error, Result};
use super::status::PostStatus;

// In-memory stand-in for the REST backend. Keeps the
// same rules the real one enforces (one revision per
// post, publish copies the revision over) and records
// every call so tests can check what went out.

// What happens "concurrently" when the next revision
// creation comes in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Race {
  RevisionAppears,
  PostUnpublished
}

#[derive(Default)]
struct State {
  posts: HashMap<PostId, Post>,
  // Keyed by parent post, there's at most one.
  revisions: HashMap<PostId, Revision>,
  deletion_requests: Vec<DeletionRequest>,
  history: Vec<(PostId, HistoryEntry)>,
  next_id: i64,
  calls: Vec<&'static str>,
  failures: HashMap<&'static str, fn() -> Error>,
  race: Option<Race>
}

impl State {
  fn next_id(&mut self) -> i64 {
    self.next_id += 1;
    self.next_id
  }

  fn post(&self, id: PostId) -> Result<&Post> {
    self.posts.get(&id).ok_or_else(|| Error::NotFound(format!("Post {} not found", id)))
  }

  fn active_revision(&self, post_id: PostId) -> Option<&Revision> {
    self.revisions.get(&post_id)
  }

  fn new_revision(&mut self, post_id: PostId) -> Result<Revision> {
    let content = self.post(post_id)?.content.clone();
    let revision = Revision {
      id: self.next_id(),
      content,
      status: RevisionStatus::Draft,
      created_at: Some(current_datetime()),
      updated_at: None
    };
    self.revisions.insert(post_id, revision.clone());
    Ok(revision)
  }

  fn parent_of(&self, id: RevisionId) -> Result<PostId> {
    self.revisions.iter()
      .find(|(_, r)| r.id == id)
      .map(|(post_id, _)| *post_id)
      .ok_or_else(|| Error::NotFound(format!("Revision {} not found", id)))
  }

  fn log(&mut self, post_id: PostId, action: &str, old: PostStatus, new: PostStatus) {
    let entry = HistoryEntry {
      id: self.next_id(),
      action: action.to_string(),
      change_description: None,
      old_status: Some(old),
      new_status: Some(new),
      modified_by_name: Some("Test User".to_string()),
      created_at: Some(current_datetime())
    };
    self.history.push((post_id, entry));
  }
}

pub struct MemoryBackend {
  state: Mutex<State>
}

impl MemoryBackend {

  pub fn new() -> Self {
    Self { state: Mutex::new(State::default()) }
  }

  fn state(&self) -> std::sync::MutexGuard<'_, State> {
    self.state.lock().unwrap()
  }

  pub fn seed_post(&self, status: PostStatus, content: PostContent) -> Post {
    let mut state = self.state();
    let post = Post {
      id: state.next_id(),
      content,
      status,
      created_by: None,
      created_at: Some(current_datetime()),
      updated_at: None,
      submitted_at: None,
      published_at: None,
      review_comments: None
    };
    state.posts.insert(post.id, post.clone());
    post
  }

  pub fn set_status(&self, post_id: PostId, status: PostStatus) {
    if let Some(post) = self.state().posts.get_mut(&post_id) {
      post.status = status;
    }
  }

  pub fn post(&self, id: PostId) -> Option<Post> {
    self.state().posts.get(&id).cloned()
  }

  pub fn revision_count(&self) -> usize {
    self.state().revisions.len()
  }

  pub fn deletion_requests(&self) -> Vec<DeletionRequest> {
    self.state().deletion_requests.clone()
  }

  pub fn calls(&self) -> Vec<&'static str> {
    self.state().calls.clone()
  }

  pub fn clear_calls(&self) {
    self.state().calls.clear();
  }

  // The next call with that name fails with the given
  // error, and only that one.
  pub fn fail_next(&self, call: &'static str, error: fn() -> Error) {
    self.state().failures.insert(call, error);
  }

  pub fn race_on_create_revision(&self, race: Race) {
    self.state().race = Some(race);
  }

  // Every call yields once first so concurrent futures
  // in the same task actually overlap.
  async fn enter(&self, call: &'static str) -> Result<()> {
    tokio::task::yield_now().await;
    let mut state = self.state();
    state.calls.push(call);
    match state.failures.remove(call) {
      Some(error) => Err(error()),
      None => Ok(())
    }
  }

}

#[async_trait]
impl Backend for MemoryBackend {

  async fn fetch_post(&self, id: PostId) -> Result<Post> {
    self.enter("fetch_post").await?;
    self.state().post(id).cloned()
  }

  async fn create_post(&self, content: &PostContent) -> Result<Post> {
    self.enter("create_post").await?;
    Ok(self.seed_post(PostStatus::Draft, content.clone()))
  }

  async fn update_post(&self, id: PostId, update: &PostUpdate) -> Result<Post> {
    self.enter("update_post").await?;
    let mut state = self.state();
    let old_status = state.post(id)?.status;
    let now = current_datetime();
    let post = state.posts.get_mut(&id)
      .ok_or_else(|| Error::NotFound(format!("Post {} not found", id)))?;
    post.content = update.content.clone();
    post.updated_at = Some(now);
    if let Some(status) = update.status {
      post.status = status;
      match status {
        PostStatus::UnderReview => post.submitted_at = Some(now),
        PostStatus::Published => post.published_at = Some(now),
        _ => ()
      }
    }
    if update.review_comments.is_some() {
      post.review_comments = update.review_comments.clone();
    }
    let post = post.clone();
    if old_status != post.status {
      state.log(id, "STATUS_CHANGE", old_status, post.status);
    }
    Ok(post)
  }

  async fn delete_post(&self, id: PostId) -> Result<()> {
    self.enter("delete_post").await?;
    let mut state = self.state();
    state.post(id)?;
    state.posts.remove(&id);
    state.revisions.remove(&id);
    Ok(())
  }

  async fn active_revision(&self, post_id: PostId) -> Result<Option<Revision>> {
    self.enter("active_revision").await?;
    Ok(self.state().active_revision(post_id).cloned())
  }

  async fn create_revision(&self, post_id: PostId) -> Result<Revision> {
    self.enter("create_revision").await?;
    let mut state = self.state();
    match state.race.take() {
      Some(Race::RevisionAppears) => {
        state.new_revision(post_id)?;
      },
      Some(Race::PostUnpublished) => {
        if let Some(post) = state.posts.get_mut(&post_id) {
          post.status = PostStatus::Draft;
        }
      },
      None => ()
    }
    if state.active_revision(post_id).is_some() {
      return Err(Error::Conflict("An active revision already exists for this post".to_string()));
    }
    if state.post(post_id)?.status != PostStatus::Published {
      return Err(Error::Conflict("Post is not published".to_string()));
    }
    state.new_revision(post_id)
  }

  async fn update_revision(&self, id: RevisionId, content: &PostContent) -> Result<Revision> {
    self.enter("update_revision").await?;
    let mut state = self.state();
    let post_id = state.parent_of(id)?;
    let revision = state.revisions.get_mut(&post_id)
      .ok_or_else(|| Error::NotFound(format!("Revision {} not found", id)))?;
    revision.content = content.clone();
    revision.updated_at = Some(current_datetime());
    Ok(revision.clone())
  }

  async fn publish_revision(&self, id: RevisionId) -> Result<Post> {
    self.enter("publish_revision").await?;
    let mut state = self.state();
    let post_id = state.parent_of(id)?;
    state.post(post_id)?;
    let revision = state.revisions.remove(&post_id)
      .ok_or_else(|| Error::NotFound(format!("Revision {} not found", id)))?;
    let post = state.posts.get_mut(&post_id)
      .ok_or_else(|| Error::NotFound(format!("Post {} not found", post_id)))?;
    post.content = revision.content;
    post.status = PostStatus::Published;
    post.updated_at = Some(current_datetime());
    let post = post.clone();
    state.log(post.id, "REVISION_PUBLISHED", PostStatus::Published, PostStatus::Published);
    Ok(post)
  }

  async fn discard_revision(&self, id: RevisionId) -> Result<()> {
    self.enter("discard_revision").await?;
    let mut state = self.state();
    let post_id = state.parent_of(id)?;
    state.revisions.remove(&post_id);
    Ok(())
  }

  async fn request_deletion(&self, post_id: PostId, reason: &str) -> Result<DeletionRequest> {
    self.enter("request_deletion").await?;
    let mut state = self.state();
    let post_title = state.post(post_id)?.content.title.clone();
    let request = DeletionRequest {
      id: state.next_id(),
      post_id,
      post_title,
      reason: reason.to_string(),
      status: DeletionRequestStatus::Pending,
      requested_by: None,
      created_at: Some(current_datetime()),
      reviewed_at: None
    };
    state.deletion_requests.push(request.clone());
    Ok(request)
  }

  async fn my_deletion_requests(&self) -> Result<Vec<DeletionRequest>> {
    self.enter("my_deletion_requests").await?;
    Ok(self.deletion_requests())
  }

  async fn pending_deletion_requests(&self) -> Result<Vec<DeletionRequest>> {
    self.enter("pending_deletion_requests").await?;
    Ok(
      self.deletion_requests()
        .into_iter()
        .filter(|r| r.status == DeletionRequestStatus::Pending)
        .collect()
    )
  }

  async fn approve_deletion(&self, id: DeletionRequestId) -> Result<()> {
    self.enter("approve_deletion").await?;
    let mut state = self.state();
    let request = state.deletion_requests.iter_mut()
      .find(|r| r.id == id)
      .ok_or_else(|| Error::NotFound(format!("Deletion request {} not found", id)))?;
    request.status = DeletionRequestStatus::Approved;
    request.reviewed_at = Some(current_datetime());
    let post_id = request.post_id;
    state.posts.remove(&post_id);
    Ok(())
  }

  async fn deny_deletion(&self, id: DeletionRequestId) -> Result<()> {
    self.enter("deny_deletion").await?;
    let mut state = self.state();
    let request = state.deletion_requests.iter_mut()
      .find(|r| r.id == id)
      .ok_or_else(|| Error::NotFound(format!("Deletion request {} not found", id)))?;
    request.status = DeletionRequestStatus::Denied;
    request.reviewed_at = Some(current_datetime());
    Ok(())
  }

  async fn post_history(&self, post_id: PostId) -> Result<Vec<HistoryEntry>> {
    self.enter("post_history").await?;
    Ok(
      self.state().history.iter()
        .rev()
        .filter(|(id, _)| *id == post_id)
        .map(|(_, e)| e.clone())
        .collect()
    )
  }

}
