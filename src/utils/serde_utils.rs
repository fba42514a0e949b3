use serde::{Deserialize, Deserializer};

// The backend happily sends null for text fields
// that were never filled (excerpt, meta fields...)
// and for empty lists. The form wants empty values,
// not Options everywhere.
// To be used with annotation:
// #[serde(default, deserialize_with = "serde_utils::null_as_default")]
pub fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
  D: Deserializer<'de>,
  T: Default + Deserialize<'de>,
{
  let value = Option::<T>::deserialize(deserializer)?;
  Ok(value.unwrap_or_default())
}

// I'll be doing empty string to None in the DTO conversion
// using plain old function here:
pub fn empty_string_to_none(value: Option<String>) -> Option<String> {
  match value {
    Some(s) => if s.trim().is_empty()
      { None } else { Some(s) },
    None => None
  }
}
