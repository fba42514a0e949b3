pub mod controller;
pub mod deletion;
pub mod entities;
pub mod error;
pub mod form;
pub mod revision;
pub mod status;
#[cfg(test)]
pub mod testing;

pub use controller::{Confirm, DeletionOutcome, SessionSnapshot, SessionState, WorkflowController};
pub use deletion::{deletion_route, DeletionDesk, DeletionRoute};
pub use error::{Error, Result, ValidationError};
pub use revision::{EditHandle, RevisionManager};
pub use status::{check_transition, PostStatus, Role};
