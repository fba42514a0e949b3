use chrono::{Local, NaiveDateTime};

// The backend sends LocalDateTime values, so no offset
// in there. chrono formatting reference:
// https://docs.rs/chrono/0.4.19/chrono/format/strftime/index.html
const DATE_FORMAT_STANDARD: &str = "%d/%m/%Y %k:%M:%S";
const DATE_FORMAT_USCOMPACT: &str = "%Y-%m-%d";

pub enum DateFormat {
  Standard,
  USCompact,
}

pub fn datetime_to_string(datetime: &NaiveDateTime, format: DateFormat) -> String {
  let format_str = match format {
    DateFormat::Standard => DATE_FORMAT_STANDARD,
    DateFormat::USCompact => DATE_FORMAT_USCOMPACT,
  };
  datetime.format(format_str).to_string()
}

// Displays "-" for timestamps the backend didn't set yet
// (e.g. published_at on a draft).
pub fn optional_datetime_to_string(datetime: &Option<NaiveDateTime>) -> String {
  datetime.as_ref()
    .map(|d| datetime_to_string(d, DateFormat::Standard))
    .unwrap_or_else(|| String::from("-"))
}

pub fn current_timestamp() -> i64 {
  Local::now().timestamp()
}

pub fn current_datetime() -> NaiveDateTime {
  Local::now().naive_local()
}
