use std::sync::{Arc, Mutex, MutexGuard};
use std::sync::atomic::{self, AtomicBool};
use derive_more::Display;
use log::{error, info, warn};
use crate::api::{Backend, PostUpdate};
use super::deletion::{deletion_route, DeletionRoute};
use super::entities::{DeletionRequest, HistoryEntry, Post, PostContent, PostId};
use super::error::{Error, Result, ValidationError};
use super::form;
use super::revision::{EditHandle, OpenedEdit, RevisionManager};
use super::status::{check_transition, DenialReason, PostStatus, Role, RoleTier};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum SessionState {
  #[display(fmt = "idle")]
  Idle,
  #[display(fmt = "loading")]
  Loading,
  #[display(fmt = "editing")]
  Editing,
  #[display(fmt = "saving")]
  Saving,
  #[display(fmt = "discarded")]
  Discarded,
  #[display(fmt = "published")]
  Published,
  #[display(fmt = "deleted")]
  Deleted
}

impl SessionState {
  pub fn is_terminal(&self) -> bool {
    matches!(
      self,
      SessionState::Discarded | SessionState::Published | SessionState::Deleted
    )
  }
}

// Asks the user a yes/no question before anything
// destructive happens.
pub trait Confirm {
  fn confirm(&self, question: &str) -> bool;
}

impl<F> Confirm for F where F: Fn(&str) -> bool {
  fn confirm(&self, question: &str) -> bool {
    self(question)
  }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DeletionOutcome {
  Deleted,
  Requested(DeletionRequest)
}

// Copy of the session state handed out to callers.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
  pub state: SessionState,
  pub handle: Option<EditHandle>,
  pub post: Option<Post>,
  pub form: PostContent,
  pub saved: PostContent,
  pub error: Option<String>
}

impl SessionSnapshot {
  pub fn is_dirty(&self) -> bool {
    self.form != self.saved
  }

  pub fn post_status(&self) -> Option<PostStatus> {
    self.post.as_ref().map(|p| p.status)
  }
}

struct Session {
  state: SessionState,
  handle: Option<EditHandle>,
  // Last version of the post the backend gave us.
  post: Option<Post>,
  form: PostContent,
  // What the backend has for the handle target.
  saved: PostContent,
  error: Option<String>
}

impl Session {
  fn idle() -> Self {
    Self {
      state: SessionState::Idle,
      handle: None,
      post: None,
      form: PostContent::default(),
      saved: PostContent::default(),
      error: None
    }
  }
}

// Authoritative state fetched after a mutation.
struct Refreshed {
  post: Post,
  handle: EditHandle,
  content: PostContent
}

// Held for as long as an action talks to the backend.
// Dropping it releases the session whatever happened,
// and puts a session stuck in Saving back to Editing.
struct InFlight<'a> {
  controller: &'a WorkflowController
}

impl Drop for InFlight<'_> {
  fn drop(&mut self) {
    {
      let mut session = self.controller.session();
      if session.state == SessionState::Saving {
        session.state = SessionState::Editing;
      }
    }
    self.controller.in_flight.store(false, atomic::Ordering::SeqCst);
  }
}

/**
 * One editing session on one post. Every user action
 * goes through here: it checks the transition rules,
 * routes the write to the post or its revision, then
 * re-fetches what the backend has so the form always
 * starts from the real thing.
 *
 * Only one action runs at a time per session, a second
 * one started meanwhile gets Error::Busy.
 */
pub struct WorkflowController {
  backend: Arc<dyn Backend>,
  revisions: RevisionManager,
  role: Role,
  session: Mutex<Session>,
  in_flight: AtomicBool
}

impl WorkflowController {

  pub fn new(backend: Arc<dyn Backend>, role: Role) -> Self {
    Self {
      revisions: RevisionManager::new(backend.clone()),
      backend,
      role,
      session: Mutex::new(Session::idle()),
      in_flight: AtomicBool::new(false)
    }
  }

  pub fn role(&self) -> Role {
    self.role
  }

  fn session(&self) -> MutexGuard<'_, Session> {
    // Nothing in here panics while holding the lock,
    // but a poisoned session is still usable anyway.
    self.session.lock().unwrap_or_else(|e| e.into_inner())
  }

  fn try_begin(&self) -> Result<InFlight<'_>> {
    match self.in_flight.compare_exchange(
      false,
      true,
      atomic::Ordering::SeqCst,
      atomic::Ordering::Acquire
    ) {
      Ok(_) => Ok(InFlight { controller: self }),
      Err(_) => {
        warn!("Action attempted while another one is in flight");
        Err(Error::Busy)
      }
    }
  }

  fn record<T>(&self, result: Result<T>) -> Result<T> {
    if let Err(e) = &result {
      match e {
        Error::Validation(_) | Error::Busy => warn!("Action refused: {}", e),
        _ => error!("Action failed: {}", e)
      }
      self.session().error = Some(e.to_string());
    }
    result
  }

  pub fn snapshot(&self) -> SessionSnapshot {
    let session = self.session();
    SessionSnapshot {
      state: session.state,
      handle: session.handle,
      post: session.post.clone(),
      form: session.form.clone(),
      saved: session.saved.clone(),
      error: session.error.clone()
    }
  }

  pub fn state(&self) -> SessionState {
    self.session().state
  }

  pub fn handle(&self) -> Option<EditHandle> {
    self.session().handle
  }

  pub fn form(&self) -> PostContent {
    self.session().form.clone()
  }

  pub fn error_message(&self) -> Option<String> {
    self.session().error.clone()
  }

  pub fn is_dirty(&self) -> bool {
    let session = self.session();
    session.form != session.saved
  }

  // Save is off while a required field is empty or
  // while something is already being sent.
  pub fn can_save(&self) -> bool {
    if self.in_flight.load(atomic::Ordering::SeqCst) {
      return false;
    }
    let session = self.session();
    session.state == SessionState::Editing
      && form::missing_required_field(&session.form).is_none()
  }

  // Form edits are accepted while saving too, they're
  // kept when the save comes back.
  pub fn update_form<F>(&self, edit: F) -> Result<()>
  where F: FnOnce(&mut PostContent) {
    let mut session = self.session();
    match session.state {
      SessionState::Editing | SessionState::Saving => {
        edit(&mut session.form);
        Ok(())
      },
      state => Err(Error::InvalidState(format!("cannot edit the form while {}", state)))
    }
  }

  pub fn set_form(&self, content: PostContent) -> Result<()> {
    self.update_form(|form| *form = content)
  }

  /**
   * Fetches the post and opens it for edit, which may
   * create a revision. Starts over from whatever state
   * the session was in.
   */
  pub async fn load(&self, post_id: PostId) -> Result<()> {
    let result = self.load_no_record(post_id).await;
    self.record(result)
  }

  async fn load_no_record(&self, post_id: PostId) -> Result<()> {
    let _in_flight = self.try_begin()?;
    {
      let mut session = self.session();
      *session = Session::idle();
      session.state = SessionState::Loading;
    }
    let opened = match self.fetch_and_open(post_id).await {
      Ok(opened) => opened,
      Err(e) => {
        self.session().state = SessionState::Idle;
        return Err(e);
      }
    };
    let (post, edit) = opened;
    let mut session = self.session();
    session.state = SessionState::Editing;
    session.handle = Some(edit.handle);
    session.form = edit.content.clone();
    session.saved = edit.content;
    session.post = Some(post);
    Ok(())
  }

  async fn fetch_and_open(
    &self,
    post_id: PostId
  ) -> Result<(Post, OpenedEdit)> {
    let post = self.backend.fetch_post(post_id).await?;
    let opened = self.revisions.open_for_edit(&post, self.role).await?;
    // Opening may have found out the post changed.
    let post = if opened.post_status != post.status {
      self.backend.fetch_post(post_id).await?
    } else {
      post
    };
    Ok((post, opened))
  }

  // Loads the post again and puts back form values
  // that were never saved.
  pub async fn resume(&self, post_id: PostId, unsaved: Option<PostContent>) -> Result<()> {
    self.load(post_id).await?;
    if let Some(form) = unsaved {
      self.set_form(form)?;
    }
    Ok(())
  }

  /**
   * Creates a new DRAFT post from the given content
   * and opens it.
   */
  pub async fn create_draft(&self, content: &PostContent) -> Result<Post> {
    let result = self.create_draft_no_record(content).await;
    self.record(result)
  }

  async fn create_draft_no_record(&self, content: &PostContent) -> Result<Post> {
    form::validate_required(content)?;
    let prepared = form::prepare_for_write(content)?;
    let post = {
      let _in_flight = self.try_begin()?;
      self.backend.create_post(&prepared).await?
    };
    info!("Created draft post {}", post.id);
    self.load_no_record(post.id).await?;
    Ok(post)
  }

  fn editing(&self) -> Result<(EditHandle, Post, PostContent)> {
    let session = self.session();
    match (session.state, session.handle, &session.post) {
      (SessionState::Editing, Some(handle), Some(post)) => {
        Ok((handle, post.clone(), session.form.clone()))
      },
      (state, _, _) => Err(Error::InvalidState(format!("no post is being edited ({})", state)))
    }
  }

  fn begin_saving(&self) {
    let mut session = self.session();
    session.state = SessionState::Saving;
    session.error = None;
  }

  async fn refresh(&self, handle: EditHandle) -> Result<Refreshed> {
    let post = self.backend.fetch_post(handle.post_id()).await?;
    match handle {
      EditHandle::Post { .. } => Ok(Refreshed {
        content: post.content.clone(),
        handle,
        post
      }),
      EditHandle::Revision { post_id, revision_id } => {
        match self.backend.active_revision(post_id).await? {
          Some(revision) => {
            if revision.id != revision_id {
              warn!(
                "Revision {} of post {} was replaced by {}",
                revision_id,
                post_id,
                revision.id
              );
            }
            Ok(Refreshed {
              handle: EditHandle::Revision { post_id, revision_id: revision.id },
              content: revision.content,
              post
            })
          },
          None => Err(Error::Conflict(
            format!("The revision of post {} was published or discarded elsewhere", post_id)
          ))
        }
      }
    }
  }

  // Puts the refreshed record in the session. The form
  // is only overwritten when the user didn't touch it
  // since the action was sent.
  fn apply(&self, refreshed: Refreshed, dispatched: &PostContent, state: SessionState) {
    let mut session = self.session();
    if session.form == *dispatched {
      session.form = refreshed.content.clone();
    }
    session.saved = refreshed.content;
    session.handle = Some(refreshed.handle);
    session.post = Some(refreshed.post);
    session.state = state;
    session.error = None;
  }

  // Writers can't touch a post that's waiting for a
  // reviewer.
  fn ensure_editable(&self, status: PostStatus) -> Result<(), ValidationError> {
    if status.is_frozen() && self.role.tier() == RoleTier::Contributor {
      Err(ValidationError::NotPermitted("edit a post under review"))
    } else {
      Ok(())
    }
  }

  /// Saves the form to the post or the revision, the
  /// status stays as it is.
  pub async fn save_draft(&self) -> Result<()> {
    let result = self.save_draft_no_record().await;
    self.record(result)
  }

  async fn save_draft_no_record(&self) -> Result<()> {
    let _in_flight = self.try_begin()?;
    let (handle, post, dispatched) = self.editing()?;
    if !handle.is_revision() {
      self.ensure_editable(post.status)?;
    }
    form::validate_required(&dispatched)?;
    let prepared = form::prepare_for_write(&dispatched)?;
    self.begin_saving();
    self.revisions.save(handle, &prepared).await?;
    let refreshed = self.refresh(handle).await?;
    self.apply(refreshed, &dispatched, SessionState::Editing);
    info!("Saved post {}", handle.post_id());
    Ok(())
  }

  // Status change on the post itself, along with the
  // current form values.
  async fn transition(
    &self,
    target: PostStatus,
    review_comments: Option<String>
  ) -> Result<()> {
    let _in_flight = self.try_begin()?;
    let (handle, post, dispatched) = self.editing()?;
    if handle.is_revision() {
      return Err(ValidationError::NotPermitted("change the status of a live-edit revision").into());
    }
    check_transition(post.status, self.role, target)
      .map_err(|reason| Error::transition(post.status, target, reason))?;
    form::validate_required(&dispatched)?;
    let prepared = form::prepare_for_write(&dispatched)?;
    self.begin_saving();
    let update = PostUpdate {
      content: prepared,
      status: Some(target),
      review_comments
    };
    self.backend.update_post(handle.post_id(), &update).await?;
    info!("Post {} moved from {} to {}", handle.post_id(), post.status, target);
    let refreshed = self.refresh(handle).await?;
    self.apply(refreshed, &dispatched, SessionState::Editing);
    Ok(())
  }

  pub async fn submit_for_review(&self) -> Result<()> {
    let result = self.transition(PostStatus::UnderReview, None).await;
    self.record(result)
  }

  /**
   * On a revision: saves the form to the revision, then
   * applies it to the live post. The session ends in
   * Published with a direct handle on the post.
   * On the post itself it's a plain status change.
   */
  pub async fn publish(&self) -> Result<()> {
    let handle = self.handle();
    let result = match handle {
      Some(handle) if handle.is_revision() => self.publish_revision().await,
      _ => self.transition(PostStatus::Published, None).await
    };
    self.record(result)
  }

  async fn publish_revision(&self) -> Result<()> {
    let _in_flight = self.try_begin()?;
    let (handle, _, dispatched) = self.editing()?;
    check_transition(PostStatus::Published, self.role, PostStatus::Published)
      .map_err(|reason| Error::transition(PostStatus::Published, PostStatus::Published, reason))?;
    form::validate_required(&dispatched)?;
    let prepared = form::prepare_for_write(&dispatched)?;
    self.begin_saving();
    // Publishing copies whatever the revision has, so
    // the save has to be done first.
    self.revisions.save(handle, &prepared).await?;
    self.revisions.publish(handle).await?;
    let post_handle = EditHandle::Post { post_id: handle.post_id() };
    let refreshed = self.refresh(post_handle).await?;
    self.apply(refreshed, &dispatched, SessionState::Published);
    Ok(())
  }

  // Reviewer desk wording for UNDER_REVIEW -> PUBLISHED.
  pub async fn approve(&self) -> Result<()> {
    let result = self.approve_no_record().await;
    self.record(result)
  }

  async fn approve_no_record(&self) -> Result<()> {
    let status = self.snapshot().post_status();
    match status {
      Some(PostStatus::UnderReview) => self.transition(PostStatus::Published, None).await,
      Some(status) => Err(Error::transition(
        status,
        PostStatus::Published,
        DenialReason::InvalidTransition
      )),
      None => Err(Error::InvalidState("no post is being edited".to_string()))
    }
  }

  pub async fn reject(&self, comments: Option<&str>) -> Result<()> {
    let comments = comments
      .map(|c| c.trim())
      .filter(|c| !c.is_empty())
      .map(|c| c.to_string());
    let result = self.transition(PostStatus::Rejected, comments).await;
    self.record(result)
  }

  /**
   * Throws away the live-edit revision. Returns false
   * when the user didn't confirm, nothing is sent then.
   */
  pub async fn discard(&self, confirm: &dyn Confirm) -> Result<bool> {
    let result = self.discard_no_record(confirm).await;
    self.record(result)
  }

  async fn discard_no_record(&self, confirm: &dyn Confirm) -> Result<bool> {
    let _in_flight = self.try_begin()?;
    let (handle, _, dispatched) = self.editing()?;
    if !handle.is_revision() {
      return Err(ValidationError::NotARevision.into());
    }
    if !confirm.confirm("Discard all changes made to this revision?") {
      return Ok(false);
    }
    self.begin_saving();
    self.revisions.discard(handle).await?;
    {
      // The revision is gone even if the refresh fails.
      let mut session = self.session();
      session.state = SessionState::Discarded;
      session.handle = None;
    }
    let post_handle = EditHandle::Post { post_id: handle.post_id() };
    let refreshed = self.refresh(post_handle).await?;
    self.apply(refreshed, &dispatched, SessionState::Discarded);
    {
      let mut session = self.session();
      session.handle = None;
      session.form = session.saved.clone();
    }
    Ok(true)
  }

  /**
   * Deletes the post when the actor may, files a
   * deletion request otherwise (which needs a reason).
   * Returns None when the user didn't confirm.
   */
  pub async fn delete(
    &self,
    reason: Option<&str>,
    confirm: &dyn Confirm
  ) -> Result<Option<DeletionOutcome>> {
    let result = self.delete_no_record(reason, confirm).await;
    self.record(result)
  }

  async fn delete_no_record(
    &self,
    reason: Option<&str>,
    confirm: &dyn Confirm
  ) -> Result<Option<DeletionOutcome>> {
    let _in_flight = self.try_begin()?;
    let (handle, post, dispatched) = self.editing()?;
    match deletion_route(post.status, self.role) {
      DeletionRoute::Direct => {
        if !confirm.confirm(&format!("Delete \"{}\" for good?", post.content.title)) {
          return Ok(None);
        }
        self.begin_saving();
        self.backend.delete_post(post.id).await?;
        info!("Deleted post {}", post.id);
        let mut session = self.session();
        *session = Session::idle();
        session.state = SessionState::Deleted;
        Ok(Some(DeletionOutcome::Deleted))
      },
      DeletionRoute::RequestApproval => {
        let reason = reason.map(|r| r.trim()).unwrap_or("");
        if reason.is_empty() {
          return Err(ValidationError::MissingField("Reason").into());
        }
        if !confirm.confirm(&format!("Ask an admin to delete \"{}\"?", post.content.title)) {
          return Ok(None);
        }
        self.begin_saving();
        let request = self.backend.request_deletion(post.id, reason).await?;
        info!("Deletion request {} filed for post {}", request.id, post.id);
        let refreshed = self.refresh(handle).await?;
        self.apply(refreshed, &dispatched, SessionState::Editing);
        Ok(Some(DeletionOutcome::Requested(request)))
      }
    }
  }

  // Forgets the session. Unsaved edits need a
  // confirmation first.
  pub fn close(&self, confirm: &dyn Confirm) -> bool {
    if self.is_dirty() && !confirm.confirm("Drop unsaved changes?") {
      return false;
    }
    *self.session() = Session::idle();
    true
  }

  pub async fn history(&self, post_id: PostId) -> Result<Vec<HistoryEntry>> {
    let result = self.backend.post_history(post_id).await;
    self.record(result)
  }

}
