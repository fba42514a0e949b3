use std::io::{self, BufRead, Write};
use log::error;
use crate::workflow::Confirm;

// Asks on the terminal, unless -y was given.
pub struct Prompt {
  pub assume_yes: bool
}

impl Prompt {
  pub fn new(assume_yes: bool) -> Self {
    Self { assume_yes }
  }
}

impl Confirm for Prompt {
  fn confirm(&self, question: &str) -> bool {
    if self.assume_yes {
      return true;
    }
    print!("{} [y/N] ", question);
    if let Err(e) = io::stdout().flush() {
      error!("Could not write to stdout - {}", e);
      return false;
    }
    let mut answer = String::new();
    match io::stdin().lock().read_line(&mut answer) {
      Ok(_) => is_yes(&answer),
      Err(e) => {
        error!("Could not read the answer - {}", e);
        false
      }
    }
  }
}

fn is_yes(answer: &str) -> bool {
  matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}
