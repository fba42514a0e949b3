use std::env;
use std::str::FromStr;
use std::sync::Arc;
use color_eyre::Result;
use eyre::{eyre, WrapErr};
use getopts::{Matches, Options};
use log::{debug, info};
// I think we have to add crate here because
// of the other crate named "config" that we
// use as a dependency.
use crate::config::Config;
use crate::api::{Backend, HttpBackend};
use crate::db::{self, Pool, StoredSession};
use crate::utils::split_list;
use crate::utils::time_utils::current_timestamp;
use crate::workflow::entities::{CategoryRef, Faq, PostContent, PostId};
use crate::workflow::{Confirm, DeletionDesk, DeletionOutcome, Role, WorkflowController};
use prompt::Prompt;
mod output;
mod prompt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
  New,
  Open,
  Set,
  Show,
  Save,
  Submit,
  Publish,
  Approve,
  Reject,
  Discard,
  Delete,
  Close,
  History,
  Requests,
  ApproveDeletion,
  DenyDeletion
}

impl FromStr for Command {
  type Err = eyre::Report;

  fn from_str(value: &str) -> Result<Self> {
    match value {
      "new" => Ok(Command::New),
      "open" => Ok(Command::Open),
      "set" => Ok(Command::Set),
      "show" => Ok(Command::Show),
      "save" => Ok(Command::Save),
      "submit" => Ok(Command::Submit),
      "publish" => Ok(Command::Publish),
      "approve" => Ok(Command::Approve),
      "reject" => Ok(Command::Reject),
      "discard" => Ok(Command::Discard),
      "delete" => Ok(Command::Delete),
      "close" => Ok(Command::Close),
      "history" => Ok(Command::History),
      "requests" => Ok(Command::Requests),
      "approve-deletion" => Ok(Command::ApproveDeletion),
      "deny-deletion" => Ok(Command::DenyDeletion),
      other => Err(eyre!("Unknown command: {}", other))
    }
  }
}

// Copy pasted this from getopts doc.
fn print_usage(program: &str, opts: &Options) {
  let brief = format!(
    "Usage: {} COMMAND [options]\n\n\
    Commands: new, open, set, show, save, submit, publish, approve,\n\
    reject, discard, delete, close, history, requests,\n\
    approve-deletion, deny-deletion",
    program
  );
  print!("{}", opts.usage(&brief));
}

fn build_options() -> Options {
  let mut opts = Options::new();
  opts.optopt("p", "post", "Post ID (defaults to the last session)", "ID");
  opts.optopt("", "title", "Post title", "TITLE");
  opts.optopt("", "slug", "Post slug", "SLUG");
  opts.optopt("", "excerpt", "Post excerpt", "TEXT");
  opts.optopt("", "body-file", "Read the HTML body from a file", "FILE");
  opts.optopt("", "image", "Main image URL", "URL");
  opts.optopt("", "meta-title", "SEO title", "TEXT");
  opts.optopt("", "meta-description", "SEO description", "TEXT");
  opts.optopt("", "tags", "Comma separated tags", "TAGS");
  opts.optopt("", "categories", "Comma separated category IDs, primary first", "IDS");
  opts.optmulti("", "faq", "FAQ entry, replaces the list", "QUESTION|ANSWER");
  opts.optopt("", "comments", "Review comments when rejecting", "TEXT");
  opts.optopt("", "reason", "Reason for a deletion request", "TEXT");
  opts.optopt("", "request", "Deletion request ID", "ID");
  opts.optflag("", "mine", "Only list my deletion requests");
  opts.optflag("y", "yes", "Don't ask for confirmation");
  opts.optflag("h", "help", "Program usage");
  opts
}

fn parse_id(value: &str, what: &str) -> Result<i64> {
  value.trim()
    .parse::<i64>()
    .with_context(|| format!("Invalid {}: {}", what, value))
}

// Only touches the fields given on the command line.
fn apply_form_options(form: &mut PostContent, matches: &Matches) -> Result<()> {
  if let Some(title) = matches.opt_str("title") {
    form.title = title;
  }
  if let Some(slug) = matches.opt_str("slug") {
    form.slug = slug;
  }
  if let Some(excerpt) = matches.opt_str("excerpt") {
    form.excerpt = excerpt;
  }
  if let Some(path) = matches.opt_str("body-file") {
    form.body = std::fs::read_to_string(&path)
      .with_context(|| format!("Reading body file {}", path))?;
  }
  if let Some(image) = matches.opt_str("image") {
    form.main_image = image;
  }
  if let Some(meta_title) = matches.opt_str("meta-title") {
    form.meta_title = meta_title;
  }
  if let Some(meta_description) = matches.opt_str("meta-description") {
    form.meta_description = meta_description;
  }
  if let Some(tags) = matches.opt_str("tags") {
    form.tags = split_list(&tags);
  }
  if let Some(categories) = matches.opt_str("categories") {
    form.categories = split_list(&categories)
      .iter()
      .map(|id| parse_id(id, "category ID").map(|id| CategoryRef {
        id,
        ..Default::default()
      }))
      .collect::<Result<Vec<CategoryRef>>>()?;
  }
  let faqs = matches.opt_strs("faq");
  if !faqs.is_empty() {
    form.faqs = faqs.iter()
      .map(|entry| parse_faq(entry))
      .collect::<Result<Vec<Faq>>>()?;
  }
  Ok(())
}

fn parse_faq(entry: &str) -> Result<Faq> {
  match entry.split_once('|') {
    Some((question, answer)) => Ok(Faq {
      question: question.trim().to_string(),
      answer: answer.trim().to_string(),
      display_order: 0
    }),
    None => Err(eyre!("FAQ entries look like \"question|answer\", got: {}", entry))
  }
}

struct Cli {
  backend: Arc<dyn Backend>,
  role: Role,
  pool: Pool,
  matches: Matches
}

impl Cli {

  fn prompt(&self) -> Prompt {
    Prompt::new(self.matches.opt_present("y"))
  }

  fn controller(&self) -> WorkflowController {
    WorkflowController::new(self.backend.clone(), self.role)
  }

  // Session for -p, or the last one touched.
  fn stored_session(&self) -> Result<StoredSession> {
    let stored = match self.matches.opt_str("p") {
      Some(id) => {
        let post_id = parse_id(&id, "post ID")?;
        db::load_session(&self.pool, post_id)?
          .ok_or_else(|| eyre!("No session for post {}, use \"open -p {}\" first", post_id, post_id))?
      },
      None => db::latest_session(&self.pool)?
        .ok_or_else(|| eyre!("No editing session, use \"open -p ID\" first"))?
    };
    Ok(stored)
  }

  fn post_id(&self) -> Result<PostId> {
    match self.matches.opt_str("p") {
      Some(id) => parse_id(&id, "post ID"),
      None => Ok(self.stored_session()?.post_id)
    }
  }

  fn request_id(&self) -> Result<i64> {
    let id = self.matches.opt_str("request")
      .ok_or_else(|| eyre!("Missing --request ID"))?;
    parse_id(&id, "request ID")
  }

  async fn resume(&self) -> Result<(WorkflowController, PostId)> {
    let stored = self.stored_session()?;
    let controller = self.controller();
    controller.resume(stored.post_id, stored.unsaved_form()?).await?;
    Ok((controller, stored.post_id))
  }

  // Sessions that ended (discarded, deleted) are
  // removed, the others are saved with their form.
  fn persist(&self, controller: &WorkflowController, post_id: PostId) -> Result<()> {
    let snapshot = controller.snapshot();
    match StoredSession::from_snapshot(&snapshot, current_timestamp())? {
      Some(stored) => db::save_session(&self.pool, &stored),
      None => {
        db::delete_session(&self.pool, post_id)?;
        Ok(())
      }
    }
  }

  fn show(&self, controller: &WorkflowController) {
    println!("{}", output::format_snapshot(&controller.snapshot(), self.role));
  }

  // Resumes the session, runs the action and stores
  // the session whatever happened so unsaved input is
  // never lost.
  async fn run_action(&self, command: Command) -> Result<()> {
    let (controller, post_id) = self.resume().await?;
    let prompt = self.prompt();
    let result = match command {
      Command::Show => Ok(()),
      Command::Save => controller.save_draft().await,
      Command::Submit => controller.submit_for_review().await,
      Command::Publish => controller.publish().await,
      Command::Approve => controller.approve().await,
      Command::Reject => {
        let comments = self.matches.opt_str("comments");
        controller.reject(comments.as_deref()).await
      },
      Command::Discard => controller.discard(&prompt).await.map(|done| {
        if !done {
          println!("Nothing discarded.");
        }
      }),
      Command::Delete => {
        let reason = self.matches.opt_str("reason");
        controller.delete(reason.as_deref(), &prompt).await.map(|outcome| match outcome {
          Some(DeletionOutcome::Deleted) => println!("Post {} deleted.", post_id),
          Some(DeletionOutcome::Requested(request)) => println!(
            "Deletion request {} sent, an admin has to approve it.",
            request.id
          ),
          None => println!("Nothing deleted.")
        })
      },
      _ => Err(crate::workflow::Error::InvalidState(format!("{:?} is not a session action", command)))
    };
    self.persist(&controller, post_id)?;
    self.show(&controller);
    result?;
    Ok(())
  }

  async fn execute(&self, command: Command) -> Result<()> {
    match command {
      Command::New => {
        let mut form = PostContent::default();
        apply_form_options(&mut form, &self.matches)?;
        let controller = self.controller();
        let post = controller.create_draft(&form).await?;
        info!("Created post {}", post.id);
        self.persist(&controller, post.id)?;
        self.show(&controller);
        Ok(())
      },
      Command::Open => {
        let id = self.matches.opt_str("p")
          .ok_or_else(|| eyre!("Missing -p ID"))?;
        let post_id = parse_id(&id, "post ID")?;
        let controller = self.controller();
        controller.load(post_id).await?;
        self.persist(&controller, post_id)?;
        self.show(&controller);
        Ok(())
      },
      Command::Set => {
        let mut stored = self.stored_session()?;
        let mut form = stored.form()?;
        apply_form_options(&mut form, &self.matches)?;
        stored.form = serde_json::to_string(&form)
          .context("Serializing form")?;
        stored.updated_at = current_timestamp();
        db::save_session(&self.pool, &stored)?;
        println!("Form of post {} updated locally, use \"save\" to send it.", stored.post_id);
        Ok(())
      },
      Command::Close => {
        let stored = self.stored_session()?;
        if stored.unsaved_form()?.is_some()
          && !self.prompt().confirm("Drop unsaved changes?") {
          println!("Session kept.");
          return Ok(());
        }
        db::delete_session(&self.pool, stored.post_id)?;
        println!("Session for post {} closed.", stored.post_id);
        Ok(())
      },
      Command::History => {
        let post_id = self.post_id()?;
        let entries = self.controller().history(post_id).await?;
        if entries.is_empty() {
          println!("No history for post {}.", post_id);
        }
        for entry in entries.iter() {
          println!("{}", output::format_history_entry(entry));
        }
        Ok(())
      },
      Command::Requests => {
        let desk = DeletionDesk::new(self.backend.clone(), self.role);
        let requests = if self.matches.opt_present("mine") {
          desk.my_requests().await?
        } else {
          desk.pending_requests().await?
        };
        if requests.is_empty() {
          println!("No deletion requests.");
        }
        for request in requests.iter() {
          println!("{}", output::format_deletion_request(request));
        }
        Ok(())
      },
      Command::ApproveDeletion => {
        let id = self.request_id()?;
        DeletionDesk::new(self.backend.clone(), self.role).approve(id).await?;
        println!("Deletion request {} approved.", id);
        Ok(())
      },
      Command::DenyDeletion => {
        let id = self.request_id()?;
        DeletionDesk::new(self.backend.clone(), self.role).deny(id).await?;
        println!("Deletion request {} denied.", id);
        Ok(())
      },
      _ => self.run_action(command).await
    }
  }

}

/**
 * Entry point for the command line. Parses the
 * arguments, sets up the backend client and the
 * session store, then runs the one command.
 */
pub async fn run() -> Result<()> {
  let args: Vec<String> = env::args().collect();
  let program = args.first()
    .cloned()
    .unwrap_or_else(|| String::from("post-workflow"));
  let opts = build_options();
  let matches = opts.parse(args.iter().skip(1))?;
  if matches.opt_present("h") || matches.free.is_empty() {
    print_usage(&program, &opts);
    return Ok(());
  }
  let command = Command::from_str(&matches.free[0])?;

  let config = Config::from_env()?;
  debug!("Current config: {:?}", config);
  let role = config.role()?;
  let backend = HttpBackend::new(&config.api_base_url, config.token(), config.timeout())?;
  let pool = db::open_store(&config.session_db_path)?;

  let cli = Cli {
    backend: Arc::new(backend),
    role,
    pool,
    matches
  };
  cli.execute(command).await
}
