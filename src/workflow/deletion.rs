use std::sync::Arc;
use log::info;
use crate::api::Backend;
use super::entities::{DeletionRequest, DeletionRequestId};
use super::error::{Result, ValidationError};
use super::status::{PostStatus, Role};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeletionRoute {
  Direct,
  RequestApproval
}

// Drafts and posts under review can just go away.
// Published posts only when an editor or an admin
// asks, everything else needs an admin to approve a
// deletion request.
pub fn deletion_route(status: PostStatus, role: Role) -> DeletionRoute {
  match status {
    PostStatus::Draft | PostStatus::UnderReview => DeletionRoute::Direct,
    PostStatus::Published if role.is_privileged() => DeletionRoute::Direct,
    _ => DeletionRoute::RequestApproval
  }
}

/**
 * The admin side of deletion requests. Role checks
 * here only avoid sending requests we know the backend
 * will refuse.
 */
pub struct DeletionDesk {
  backend: Arc<dyn Backend>,
  role: Role
}

impl DeletionDesk {

  pub fn new(backend: Arc<dyn Backend>, role: Role) -> Self {
    Self { backend, role }
  }

  pub async fn my_requests(&self) -> Result<Vec<DeletionRequest>> {
    self.backend.my_deletion_requests().await
  }

  pub async fn pending_requests(&self) -> Result<Vec<DeletionRequest>> {
    if !self.role.is_privileged() {
      return Err(ValidationError::NotPermitted("review deletion requests").into());
    }
    self.backend.pending_deletion_requests().await
  }

  pub async fn approve(&self, id: DeletionRequestId) -> Result<()> {
    self.ensure_admin("approve deletion requests")?;
    self.backend.approve_deletion(id).await?;
    info!("Deletion request {} approved", id);
    Ok(())
  }

  pub async fn deny(&self, id: DeletionRequestId) -> Result<()> {
    self.ensure_admin("deny deletion requests")?;
    self.backend.deny_deletion(id).await?;
    info!("Deletion request {} denied", id);
    Ok(())
  }

  fn ensure_admin(&self, action: &'static str) -> Result<(), ValidationError> {
    match self.role {
      Role::Admin => Ok(()),
      _ => Err(ValidationError::NotPermitted(action))
    }
  }

}
