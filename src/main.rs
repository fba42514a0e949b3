use color_eyre::Result;
use dotenv::dotenv;
use std::env;

#[tokio::main]
async fn main() -> Result<()> {
  dotenv().ok();
  // Default log level when RUST_LOG isn't set.
  if env::var("RUST_LOG").is_err() {
    env::set_var("RUST_LOG", "info");
  }
  color_eyre::install()?;
  env_logger::init();

  post_workflow::cli::run().await
}
