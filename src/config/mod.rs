// Adding the context method to errors:
use eyre::{eyre, WrapErr};
use color_eyre::Result;
use serde::Deserialize;
use std::fmt;
use std::time::Duration;
use crate::utils::serde_utils::empty_string_to_none;
use crate::workflow::Role;

#[derive(Deserialize)]
pub struct Config {
  // Base URL of the REST API, "/posts" and friends
  // get appended to it.
  pub api_base_url: String,
  #[serde(default)]
  pub api_token: Option<String>,
  pub actor_role: String,
  pub session_db_path: String,
  // In seconds.
  pub request_timeout: u64
}

// Written by hand so the token never shows up in
// the logs.
impl fmt::Debug for Config {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Config")
      .field("api_base_url", &self.api_base_url)
      .field("api_token", &self.api_token.as_ref().map(|_| "***"))
      .field("actor_role", &self.actor_role)
      .field("session_db_path", &self.session_db_path)
      .field("request_timeout", &self.request_timeout)
      .finish()
  }
}

impl Config {

  fn builder() -> Result<config::ConfigBuilder<config::builder::DefaultState>> {
    // RUST_LOG is already set in main.rs if it
    // was absent.
    // You have to use lowercase when compared to
    // what's in the .env file.
    let builder = config::Config::builder()
      .set_default("api_base_url", "http://localhost:8080/api")?
      .set_default("actor_role", "WRITER")?
      .set_default("session_db_path", "./sessions.sqlite")?
      .set_default("request_timeout", 30)?;
    Ok(builder)
  }

  pub fn from_env() -> Result<Config> {
    let config: Config = Self::builder()?
      .add_source(config::Environment::default())
      .build()?
      // The error has to be given a context for
      // color_eyre to work here:
      .try_deserialize()
      .context("Loading configuration from env")?;
    // Fail early on a role we don't know.
    config.role()?;
    Ok(config)
  }

  pub fn role(&self) -> Result<Role> {
    self.actor_role.parse::<Role>()
      .map_err(|e| eyre!("Invalid ACTOR_ROLE - {}", e))
  }

  pub fn timeout(&self) -> Duration {
    Duration::from_secs(self.request_timeout)
  }

  pub fn token(&self) -> Option<String> {
    empty_string_to_none(self.api_token.clone())
  }

}
