use std::str::FromStr;
use derive_more::Display;
use serde::{Deserialize, Serialize};

// Finite set of states a post can be in. APPROVED and
// ARCHIVED exist because the backend can send them,
// but nothing in the workflow moves a post there.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PostStatus {
  #[display(fmt = "DRAFT")]
  Draft,
  #[display(fmt = "UNDER_REVIEW")]
  UnderReview,
  #[display(fmt = "APPROVED")]
  Approved,
  #[display(fmt = "PUBLISHED")]
  Published,
  #[display(fmt = "REJECTED")]
  Rejected,
  #[display(fmt = "ARCHIVED")]
  Archived
}

impl PostStatus {
  // Human readable label, the Display impl gives
  // out the wire value.
  pub fn label(&self) -> &'static str {
    match self {
      PostStatus::Draft => "Draft",
      PostStatus::UnderReview => "Under Review",
      PostStatus::Approved => "Approved",
      PostStatus::Published => "Published",
      PostStatus::Rejected => "Rejected",
      PostStatus::Archived => "Archived"
    }
  }

  // UNDER_REVIEW is frozen for the author until a
  // reviewer or editor acts on it.
  pub fn is_frozen(&self) -> bool {
    *self == PostStatus::UnderReview
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
  #[display(fmt = "VIEWER")]
  Viewer,
  #[display(fmt = "USER")]
  User,
  #[display(fmt = "WRITER")]
  Writer,
  #[display(fmt = "REVIEWER")]
  Reviewer,
  #[display(fmt = "EDITOR")]
  Editor,
  #[display(fmt = "ADMIN")]
  Admin
}

// Roles collapse into three columns as far as status
// transitions are concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleTier {
  Contributor,
  Reviewer,
  Privileged
}

const ALL_TIERS: [RoleTier; 3] = [
  RoleTier::Contributor,
  RoleTier::Reviewer,
  RoleTier::Privileged
];

impl Role {
  pub fn tier(&self) -> RoleTier {
    match self {
      Role::Viewer | Role::User | Role::Writer => RoleTier::Contributor,
      Role::Reviewer => RoleTier::Reviewer,
      Role::Editor | Role::Admin => RoleTier::Privileged
    }
  }

  pub fn is_privileged(&self) -> bool {
    self.tier() == RoleTier::Privileged
  }
}

impl FromStr for Role {
  type Err = String;

  fn from_str(value: &str) -> Result<Self, Self::Err> {
    match value.trim().to_uppercase().as_str() {
      "VIEWER" => Ok(Role::Viewer),
      "USER" => Ok(Role::User),
      "WRITER" => Ok(Role::Writer),
      "REVIEWER" => Ok(Role::Reviewer),
      "EDITOR" => Ok(Role::Editor),
      "ADMIN" => Ok(Role::Admin),
      other => Err(format!("Unknown role: {}", other))
    }
  }
}

impl FromStr for PostStatus {
  type Err = String;

  fn from_str(value: &str) -> Result<Self, Self::Err> {
    match value.trim().to_uppercase().as_str() {
      "DRAFT" => Ok(PostStatus::Draft),
      "UNDER_REVIEW" => Ok(PostStatus::UnderReview),
      "APPROVED" => Ok(PostStatus::Approved),
      "PUBLISHED" => Ok(PostStatus::Published),
      "REJECTED" => Ok(PostStatus::Rejected),
      "ARCHIVED" => Ok(PostStatus::Archived),
      other => Err(format!("Unknown post status: {}", other))
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum DenialReason {
  #[display(fmt = "ROLE_INSUFFICIENT")]
  RoleInsufficient,
  #[display(fmt = "INVALID_TRANSITION")]
  InvalidTransition
}

// The transition table. PUBLISHED -> PUBLISHED is a
// direct edit of the live post, which only privileged
// roles get; everybody else goes through a revision.
fn tier_allows(tier: RoleTier, current: PostStatus, requested: PostStatus) -> bool {
  use PostStatus::*;
  match (tier, current, requested) {
    (RoleTier::Contributor, Draft, UnderReview) => true,
    (RoleTier::Contributor, Rejected, UnderReview) => true,
    (RoleTier::Reviewer, Draft, UnderReview) => true,
    (RoleTier::Reviewer, UnderReview, UnderReview) => true,
    (RoleTier::Privileged, Draft, UnderReview) => true,
    (RoleTier::Privileged, Draft, Published) => true,
    (RoleTier::Privileged, UnderReview, Published) => true,
    (RoleTier::Privileged, UnderReview, Rejected) => true,
    (RoleTier::Privileged, Published, Published) => true,
    (RoleTier::Privileged, Rejected, Published) => true,
    _ => false
  }
}

/**
 * Checks if the actor role may move a post from
 * "current" to "requested". Pure, never talks to
 * the backend.
 * A denied transition that some other role could
 * perform is ROLE_INSUFFICIENT, a transition nobody
 * can perform is INVALID_TRANSITION.
 */
pub fn check_transition(
  current: PostStatus,
  role: Role,
  requested: PostStatus
) -> Result<(), DenialReason> {
  if tier_allows(role.tier(), current, requested) {
    Ok(())
  } else if ALL_TIERS.iter().any(|t| tier_allows(*t, current, requested)) {
    Err(DenialReason::RoleInsufficient)
  } else {
    Err(DenialReason::InvalidTransition)
  }
}

pub fn is_transition_allowed(
  current: PostStatus,
  role: Role,
  requested: PostStatus
) -> bool {
  check_transition(current, role, requested).is_ok()
}

// Statuses an actor could pick from right now. Used to
// decide which buttons (or CLI commands) make sense.
pub fn allowed_targets(current: PostStatus, role: Role) -> Vec<PostStatus> {
  [
    PostStatus::Draft,
    PostStatus::UnderReview,
    PostStatus::Published,
    PostStatus::Rejected
  ].iter()
    .copied()
    .filter(|s| is_transition_allowed(current, role, *s))
    .collect()
}
