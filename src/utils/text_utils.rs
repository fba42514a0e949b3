use html2text::from_read;
use lazy_static::lazy_static;
use regex::Regex;

// Reading speed used for the read time estimate,
// in words per minute.
const WORDS_PER_MINUTE: usize = 200;

lazy_static! {
  static ref SLUG_REGEX: Regex = Regex::new(
    r"^[a-z0-9]+(?:-[a-z0-9]+)*$"
  ).unwrap();
}

pub fn strip_html(html: &str) -> String {
  from_read(html.as_bytes(), 80)
}

// The rich text editor never gives out a truly empty
// body, it's usually "<p></p>" or some <br>. So a body
// is blank when there's no text left once the markup
// is gone.
pub fn is_blank_html(html: &str) -> bool {
  html.trim().is_empty() || strip_html(html).trim().is_empty()
}

pub fn word_count(html: &str) -> usize {
  strip_html(html).split_whitespace().count()
}

// Read time in minutes, rounded up. A body with
// markup but no words (just an image) still counts
// as one minute, only an empty one gets zero.
pub fn read_time(html: &str) -> usize {
  if html.trim().is_empty() {
    return 0;
  }
  let words = word_count(html);
  ((words + WORDS_PER_MINUTE - 1) / WORDS_PER_MINUTE).max(1)
}

pub fn is_valid_slug(slug: &str) -> bool {
  SLUG_REGEX.is_match(slug)
}

// Non-ASCII gets transliterated ("Café" is "cafe").
// Can still come out empty for titles made of
// punctuation or symbols only.
pub fn slugify(title: &str) -> String {
  slug::slugify(title)
}
