pub mod text_utils;
pub mod time_utils;
pub mod serde_utils;

// Splits comma separated command line values and
// drops the blanks. Used for tags and category IDs.
pub fn split_list(value: &str) -> Vec<String> {
  value.split(',')
    .map(|v| v.trim())
    .filter(|v| !v.is_empty())
    .map(String::from)
    .collect()
}
