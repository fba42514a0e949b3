use derive_more::Display;
use super::status::{DenialReason, PostStatus};

// Message shown when the backend couldn't be reached
// at all. Details only go to the logs.
pub const NETWORK_ERROR_MESSAGE: &str =
  "Network error: could not reach the server, please try again";

// Errors caught on the client before anything is sent
// to the backend.
#[derive(Debug, Clone, PartialEq, Display)]
pub enum ValidationError {
  #[display(fmt = "{} is required", _0)]
  MissingField(&'static str),
  #[display(fmt = "Cannot move post from {} to {} ({})", from, to, reason)]
  Transition {
    from: PostStatus,
    to: PostStatus,
    reason: DenialReason
  },
  #[display(fmt = "Invalid slug \"{}\": use lowercase letters, digits and dashes", _0)]
  InvalidSlug(String),
  #[display(fmt = "This action only applies to a live-edit revision")]
  NotARevision,
  #[display(fmt = "Your role is not allowed to {}", _0)]
  NotPermitted(&'static str)
}

// Not sure "Error" is the best name, but it's what
// the rest of the crate imports.
// Display gives out the user facing message, the
// full story goes to the logs.
#[derive(Debug, Display)]
pub enum Error {
  #[display(fmt = "{}", _0)]
  Validation(ValidationError),
  #[display(fmt = "Conflict: {}", _0)]
  Conflict(String),
  #[display(fmt = "Not Found: {}", _0)]
  NotFound(String),
  #[display(fmt = "Forbidden: {}", _0)]
  Forbidden(String),
  #[display(fmt = "{}", message)]
  Backend {
    status: u16,
    message: String
  },
  #[display(fmt = "{}", _0)]
  Network(String),
  #[display(fmt = "Another action is still in progress")]
  Busy,
  #[display(fmt = "Invalid session state: {}", _0)]
  InvalidState(String)
}

// Standard way to implement the Error trait is
// to not actually implement any function at all.
impl std::error::Error for Error {}

impl From<ValidationError> for Error {
  fn from(e: ValidationError) -> Self {
    Error::Validation(e)
  }
}

impl Error {
  pub fn transition(from: PostStatus, to: PostStatus, reason: DenialReason) -> Self {
    Error::Validation(ValidationError::Transition { from, to, reason })
  }

  pub fn is_validation(&self) -> bool {
    matches!(self, Error::Validation(_))
  }

  pub fn is_conflict(&self) -> bool {
    matches!(self, Error::Conflict(_))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
