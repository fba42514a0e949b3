use crate::utils::text_utils;
use super::entities::PostContent;
use super::error::ValidationError;

// Title and body are the only required fields, the
// rest can be filled in later.
pub fn missing_required_field(form: &PostContent) -> Option<&'static str> {
  if form.title.trim().is_empty() {
    Some("Title")
  } else if text_utils::is_blank_html(&form.body) {
    Some("Body")
  } else {
    None
  }
}

pub fn validate_required(form: &PostContent) -> Result<(), ValidationError> {
  match missing_required_field(form) {
    Some(field) => Err(ValidationError::MissingField(field)),
    None => Ok(())
  }
}

// Drop blanks and duplicates but keep the order the
// author typed the tags in.
pub fn clean_tags(tags: &[String]) -> Vec<String> {
  let mut cleaned: Vec<String> = Vec::with_capacity(tags.len());
  for tag in tags.iter().map(|t| t.trim()) {
    if !tag.is_empty() && !cleaned.iter().any(|c| c == tag) {
      cleaned.push(tag.to_string());
    }
  }
  cleaned
}

/**
 * Returns the form as it should be written to the
 * backend: slug filled from the title when empty,
 * tags cleaned up and FAQ entries renumbered in
 * their current order.
 * A slug typed in by hand has to be valid already,
 * we don't silently rewrite it.
 */
pub fn prepare_for_write(form: &PostContent) -> Result<PostContent, ValidationError> {
  let mut prepared = form.clone();
  prepared.title = prepared.title.trim().to_string();
  let slug = prepared.slug.trim().to_string();
  prepared.slug = if slug.is_empty() {
    let generated = text_utils::slugify(&prepared.title);
    if generated.is_empty() {
      return Err(ValidationError::MissingField("Slug"));
    }
    generated
  } else if text_utils::is_valid_slug(&slug) {
    slug
  } else {
    return Err(ValidationError::InvalidSlug(slug));
  };
  prepared.tags = clean_tags(&prepared.tags);
  for (i, faq) in prepared.faqs.iter_mut().enumerate() {
    faq.display_order = i as i32;
  }
  Ok(prepared)
}
