use serde::{Deserialize, Serialize};
use crate::utils::text_utils;
use crate::workflow::entities::{Faq, PostContent};
use crate::workflow::status::PostStatus;
use super::PostUpdate;

// Request bodies as the backend expects them. I'm
// borrowing everything from the form, these only
// live for the time of the request.

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentBody<'a> {
  pub title: &'a str,
  pub slug: &'a str,
  pub excerpt: &'a str,
  pub content: &'a str,
  pub main_image: &'a str,
  pub meta_title: &'a str,
  pub meta_description: &'a str,
  pub tags: &'a [String],
  pub faqs: &'a [Faq],
  pub category_ids: Vec<i64>,
  pub read_time: usize
}

impl<'a> From<&'a PostContent> for ContentBody<'a> {
  fn from(content: &'a PostContent) -> Self {
    Self {
      title: &content.title,
      slug: &content.slug,
      excerpt: &content.excerpt,
      content: &content.body,
      main_image: &content.main_image,
      meta_title: &content.meta_title,
      meta_description: &content.meta_description,
      tags: &content.tags,
      faqs: &content.faqs,
      category_ids: content.category_ids(),
      read_time: text_utils::read_time(&content.body)
    }
  }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePostBody<'a> {
  #[serde(flatten)]
  pub content: ContentBody<'a>,
  // No status means "leave it alone".
  #[serde(skip_serializing_if = "Option::is_none")]
  pub status: Option<PostStatus>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub review_comments: Option<&'a str>
}

impl<'a> From<&'a PostUpdate> for UpdatePostBody<'a> {
  fn from(update: &'a PostUpdate) -> Self {
    Self {
      content: (&update.content).into(),
      status: update.status,
      review_comments: update.review_comments.as_deref()
    }
  }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPostBody<'a> {
  #[serde(flatten)]
  pub content: ContentBody<'a>,
  pub status: PostStatus
}

#[derive(Debug, Serialize)]
pub struct ReasonBody<'a> {
  pub reason: &'a str
}

// What the backend sends back on errors. Most
// endpoints use "error", a few use "message".
#[derive(Debug, Default, Deserialize)]
pub struct ErrorBody {
  pub error: Option<String>,
  pub message: Option<String>
}

impl ErrorBody {
  pub fn into_message(self) -> Option<String> {
    self.error
      .or(self.message)
      .filter(|m| !m.trim().is_empty())
  }
}
