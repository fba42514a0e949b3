use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use crate::utils::serde_utils::null_as_default;
use super::status::PostStatus;

// Models of what the REST backend sends back. Field
// names follow the backend JSON (camelCase), hence
// the serde attributes everywhere.

pub type PostId = i64;
pub type RevisionId = i64;
pub type DeletionRequestId = i64;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Faq {
  #[serde(default, deserialize_with = "null_as_default")]
  pub question: String,
  #[serde(default, deserialize_with = "null_as_default")]
  pub answer: String,
  #[serde(default)]
  pub display_order: i32
}

// Categories come in as full objects but we only ever
// send their IDs back. The name is there for display.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryRef {
  pub id: i64,
  #[serde(default, deserialize_with = "null_as_default")]
  pub name: String,
  #[serde(default, deserialize_with = "null_as_default")]
  pub slug: String
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActorRef {
  pub id: i64,
  #[serde(default)]
  pub name: Option<String>,
  #[serde(default)]
  pub email: Option<String>
}

/**
 * Every editable field of a post. Posts and revisions
 * share it, and the editing form is just one of these.
 */
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostContent {
  #[serde(default, deserialize_with = "null_as_default")]
  pub title: String,
  #[serde(default, deserialize_with = "null_as_default")]
  pub slug: String,
  #[serde(default, deserialize_with = "null_as_default")]
  pub excerpt: String,
  // The backend calls the body "content".
  #[serde(rename = "content", default, deserialize_with = "null_as_default")]
  pub body: String,
  #[serde(default, deserialize_with = "null_as_default")]
  pub main_image: String,
  #[serde(default, deserialize_with = "null_as_default")]
  pub meta_title: String,
  #[serde(default, deserialize_with = "null_as_default")]
  pub meta_description: String,
  #[serde(default, deserialize_with = "null_as_default")]
  pub tags: Vec<String>,
  // First category is the primary one.
  #[serde(default, deserialize_with = "null_as_default")]
  pub categories: Vec<CategoryRef>,
  #[serde(default, deserialize_with = "null_as_default")]
  pub faqs: Vec<Faq>
}

impl PostContent {
  pub fn category_ids(&self) -> Vec<i64> {
    self.categories.iter().map(|c| c.id).collect()
  }

  pub fn primary_category(&self) -> Option<&CategoryRef> {
    self.categories.first()
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
  pub id: PostId,
  #[serde(flatten)]
  pub content: PostContent,
  pub status: PostStatus,
  #[serde(default)]
  pub created_by: Option<ActorRef>,
  #[serde(default)]
  pub created_at: Option<NaiveDateTime>,
  #[serde(default)]
  pub updated_at: Option<NaiveDateTime>,
  #[serde(default)]
  pub submitted_at: Option<NaiveDateTime>,
  #[serde(default)]
  pub published_at: Option<NaiveDateTime>,
  #[serde(default)]
  pub review_comments: Option<String>
}

// Revisions carry their own status but it's always
// DRAFT on the client side of things: a revision is
// never published on its own, it gets applied to its
// parent post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RevisionStatus {
  Draft,
  PendingReview,
  Approved,
  Discarded
}

impl Default for RevisionStatus {
  fn default() -> Self {
    RevisionStatus::Draft
  }
}

// No reference to the parent post comes with it, callers
// always know which post they asked about.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Revision {
  pub id: RevisionId,
  #[serde(flatten)]
  pub content: PostContent,
  #[serde(default)]
  pub status: RevisionStatus,
  #[serde(default)]
  pub created_at: Option<NaiveDateTime>,
  #[serde(default)]
  pub updated_at: Option<NaiveDateTime>
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeletionRequestStatus {
  Pending,
  Approved,
  Denied
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletionRequest {
  pub id: DeletionRequestId,
  pub post_id: PostId,
  #[serde(default, deserialize_with = "null_as_default")]
  pub post_title: String,
  #[serde(default, deserialize_with = "null_as_default")]
  pub reason: String,
  pub status: DeletionRequestStatus,
  #[serde(default)]
  pub requested_by: Option<ActorRef>,
  #[serde(default)]
  pub created_at: Option<NaiveDateTime>,
  #[serde(default)]
  pub reviewed_at: Option<NaiveDateTime>
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
  pub id: i64,
  pub action: String,
  #[serde(default)]
  pub change_description: Option<String>,
  #[serde(default)]
  pub old_status: Option<PostStatus>,
  #[serde(default)]
  pub new_status: Option<PostStatus>,
  #[serde(default)]
  pub modified_by_name: Option<String>,
  #[serde(default)]
  pub created_at: Option<NaiveDateTime>
}
