use crate::utils::text_utils;
use crate::utils::time_utils::optional_datetime_to_string;
use crate::workflow::entities::{DeletionRequest, HistoryEntry};
use crate::workflow::status::allowed_targets;
use crate::workflow::{EditHandle, Role, SessionSnapshot};

// Everything printed by the commands goes through
// here. Plain text, one fact per line.

pub fn describe_handle(handle: &Option<EditHandle>) -> String {
  match handle {
    Some(EditHandle::Post { post_id }) => format!("post {} (direct)", post_id),
    Some(EditHandle::Revision { post_id, revision_id }) => {
      format!("revision {} of post {}", revision_id, post_id)
    },
    None => String::from("-")
  }
}

pub fn format_snapshot(snapshot: &SessionSnapshot, role: Role) -> String {
  let mut lines: Vec<String> = Vec::new();
  lines.push(format!("Session:   {}", snapshot.state));
  lines.push(format!("Editing:   {}", describe_handle(&snapshot.handle)));
  if let Some(post) = &snapshot.post {
    lines.push(format!("Status:    {}", post.status.label()));
    lines.push(format!("Published: {}", optional_datetime_to_string(&post.published_at)));
    if let Some(comments) = &post.review_comments {
      lines.push(format!("Review:    {}", comments));
    }
    let targets: Vec<String> = allowed_targets(post.status, role)
      .iter()
      .map(|s| s.to_string())
      .collect();
    lines.push(format!(
      "Can move:  {}",
      if targets.is_empty() { String::from("-") } else { targets.join(", ") }
    ));
  }
  lines.push(format!("Title:     {}", snapshot.form.title));
  lines.push(format!("Slug:      {}", snapshot.form.slug));
  lines.push(format!("Tags:      {}", snapshot.form.tags.join(", ")));
  lines.push(format!("Read time: {} min", text_utils::read_time(&snapshot.form.body)));
  lines.push(format!(
    "Unsaved:   {}",
    if snapshot.is_dirty() { "yes" } else { "no" }
  ));
  if let Some(error) = &snapshot.error {
    lines.push(format!("Error:     {}", error));
  }
  lines.join("\n")
}

pub fn format_history_entry(entry: &HistoryEntry) -> String {
  let transition = match (entry.old_status, entry.new_status) {
    (Some(old), Some(new)) if old != new => format!(" {} -> {}", old, new),
    _ => String::new()
  };
  format!(
    "{} {}{} by {}{}",
    optional_datetime_to_string(&entry.created_at),
    entry.action,
    transition,
    entry.modified_by_name.as_deref().unwrap_or("unknown"),
    entry.change_description.as_ref()
      .map(|d| format!(": {}", d))
      .unwrap_or_default()
  )
}

pub fn format_deletion_request(request: &DeletionRequest) -> String {
  format!(
    "#{} post {} \"{}\" [{:?}] {}",
    request.id,
    request.post_id,
    request.post_title,
    request.status,
    request.reason
  )
}
