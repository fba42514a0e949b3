// Small stand-in for the REST backend, served for
// real over HTTP so the reqwest client gets exercised
// end to end. Posts are kept as raw JSON so the wire
// format doesn't come from our own types.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Mutex;
use actix_web::{web, App, HttpRequest, HttpResponse, HttpServer};
use serde_json::{json, Value};

pub const TOKEN: &str = "test-token";

const CONTENT_FIELDS: [&str; 9] = [
  "title",
  "slug",
  "excerpt",
  "content",
  "mainImage",
  "metaTitle",
  "metaDescription",
  "tags",
  "faqs"
];

#[derive(Default)]
pub struct FakeState {
  pub posts: HashMap<i64, Value>,
  pub revisions: HashMap<i64, Value>,
  // Revision id to post id. The revision JSON itself
  // doesn't say which post it belongs to.
  pub revision_posts: HashMap<i64, i64>,
  pub deletion_requests: Vec<Value>,
  pub history: Vec<(i64, Value)>,
  pub next_id: i64,
  // Somebody else creates a revision right before
  // ours does.
  pub race_on_create_revision: bool,
  pub requests: Vec<String>
}

impl FakeState {
  fn next_id(&mut self) -> i64 {
    self.next_id += 1;
    self.next_id
  }

  pub fn seed_post(&mut self, title: &str, status: &str) -> i64 {
    let id = self.next_id();
    self.posts.insert(id, json!({
      "id": id,
      "title": title,
      "slug": null,
      "excerpt": null,
      "content": "<p>Some body</p>",
      "mainImage": null,
      "metaTitle": null,
      "metaDescription": null,
      "status": status,
      "tags": ["rust"],
      "categories": [{"id": 1, "name": "Dev", "slug": "dev"}],
      "faqs": [],
      "createdBy": {"id": 5, "name": "Author", "email": null},
      "createdAt": "2024-05-01T08:00:00",
      "publishedAt": null,
      "reviewComments": null
    }));
    id
  }

  fn active_revision_id(&self, post_id: i64) -> Option<i64> {
    self.revision_posts.iter()
      .find(|(_, parent)| **parent == post_id)
      .map(|(id, _)| *id)
  }

  fn new_revision(&mut self, post_id: i64) -> Option<Value> {
    let post = self.posts.get(&post_id)?.clone();
    let id = self.next_id();
    let mut revision = json!({
      "id": id,
      "status": "DRAFT",
      "categories": post["categories"].clone(),
      "createdAt": "2024-05-03T10:00:00"
    });
    for field in CONTENT_FIELDS.iter() {
      revision[*field] = post[*field].clone();
    }
    self.revisions.insert(id, revision.clone());
    self.revision_posts.insert(id, post_id);
    Some(revision)
  }
}

type Shared = web::Data<Mutex<FakeState>>;

pub struct FakeBackend {
  pub state: Shared,
  pub base_url: String
}

impl FakeBackend {
  pub fn with_state<F, T>(&self, f: F) -> T
  where F: FnOnce(&mut FakeState) -> T {
    f(&mut self.state.lock().unwrap())
  }
}

fn error(status: actix_web::http::StatusCode, message: &str) -> HttpResponse {
  HttpResponse::build(status).json(json!({"error": message}))
}

fn not_found(what: &str) -> HttpResponse {
  error(actix_web::http::StatusCode::NOT_FOUND, &format!("{} not found", what))
}

// Returns the locked state when the bearer token is
// right, the 401 response otherwise.
fn authorize<'a>(
  req: &HttpRequest,
  state: &'a Shared
) -> Result<std::sync::MutexGuard<'a, FakeState>, HttpResponse> {
  let expected = format!("Bearer {}", TOKEN);
  let header = req.headers()
    .get("Authorization")
    .and_then(|v| v.to_str().ok());
  let mut guard = state.lock().unwrap();
  guard.requests.push(format!("{} {}", req.method(), req.path()));
  if header == Some(expected.as_str()) {
    Ok(guard)
  } else {
    Err(error(actix_web::http::StatusCode::UNAUTHORIZED, "Unauthorized"))
  }
}

fn apply_fields(target: &mut Value, body: &Value) {
  for field in CONTENT_FIELDS.iter() {
    if let Some(value) = body.get(*field) {
      target[*field] = value.clone();
    }
  }
  if let Some(ids) = body.get("categoryIds").and_then(|v| v.as_array()) {
    target["categories"] = Value::Array(
      ids.iter()
        .map(|id| json!({"id": id, "name": format!("Category {}", id), "slug": null}))
        .collect()
    );
  }
}

async fn get_post(req: HttpRequest, state: Shared, path: web::Path<i64>) -> HttpResponse {
  let st = match authorize(&req, &state) {
    Ok(st) => st,
    Err(resp) => return resp
  };
  match st.posts.get(&path.into_inner()) {
    Some(post) => HttpResponse::Ok().json(post),
    None => not_found("Post")
  }
}

async fn create_post(req: HttpRequest, state: Shared, body: web::Json<Value>) -> HttpResponse {
  let mut st = match authorize(&req, &state) {
    Ok(st) => st,
    Err(resp) => return resp
  };
  let title = body["title"].as_str().unwrap_or("").to_string();
  let status = body["status"].as_str().unwrap_or("DRAFT").to_string();
  let id = st.seed_post(&title, &status);
  let post = st.posts.get_mut(&id).unwrap();
  apply_fields(post, &body);
  HttpResponse::Created().json(post.clone())
}

async fn update_post(
  req: HttpRequest,
  state: Shared,
  path: web::Path<i64>,
  body: web::Json<Value>
) -> HttpResponse {
  let mut st = match authorize(&req, &state) {
    Ok(st) => st,
    Err(resp) => return resp
  };
  if body["slug"] == json!("taken") {
    return error(
      actix_web::http::StatusCode::INTERNAL_SERVER_ERROR,
      "Slug already in use"
    );
  }
  let id = path.into_inner();
  let history_id = st.next_id();
  let post = match st.posts.get_mut(&id) {
    Some(post) => post,
    None => return not_found("Post")
  };
  let old_status = post["status"].clone();
  apply_fields(post, &body);
  if let Some(status) = body.get("status") {
    post["status"] = status.clone();
  }
  if let Some(comments) = body.get("reviewComments") {
    post["reviewComments"] = comments.clone();
  }
  let post = post.clone();
  if post["status"] != old_status {
    st.history.push((id, json!({
      "id": history_id,
      "action": "STATUS_CHANGE",
      "changeDescription": null,
      "oldStatus": old_status,
      "newStatus": post["status"].clone(),
      "modifiedByName": "Fake Reviewer",
      "createdAt": "2024-05-02T09:00:00"
    })));
  }
  HttpResponse::Ok().json(post)
}

async fn delete_post(req: HttpRequest, state: Shared, path: web::Path<i64>) -> HttpResponse {
  let mut st = match authorize(&req, &state) {
    Ok(st) => st,
    Err(resp) => return resp
  };
  let id = path.into_inner();
  match st.posts.remove(&id) {
    Some(_) => {
      let orphans: Vec<i64> = st.revision_posts.iter()
        .filter(|(_, parent)| **parent == id)
        .map(|(revision_id, _)| *revision_id)
        .collect();
      for revision_id in orphans {
        st.revisions.remove(&revision_id);
        st.revision_posts.remove(&revision_id);
      }
      HttpResponse::NoContent().finish()
    },
    None => not_found("Post")
  }
}

async fn active_revision(req: HttpRequest, state: Shared, path: web::Path<i64>) -> HttpResponse {
  let st = match authorize(&req, &state) {
    Ok(st) => st,
    Err(resp) => return resp
  };
  match st.active_revision_id(path.into_inner()) {
    Some(id) => HttpResponse::Ok().json(&st.revisions[&id]),
    None => not_found("Active revision")
  }
}

async fn create_revision(req: HttpRequest, state: Shared, path: web::Path<i64>) -> HttpResponse {
  let mut st = match authorize(&req, &state) {
    Ok(st) => st,
    Err(resp) => return resp
  };
  let post_id = path.into_inner();
  if st.race_on_create_revision {
    st.race_on_create_revision = false;
    st.new_revision(post_id);
  }
  if st.active_revision_id(post_id).is_some() {
    return error(
      actix_web::http::StatusCode::CONFLICT,
      "An active revision already exists for this post"
    );
  }
  match st.new_revision(post_id) {
    Some(revision) => HttpResponse::Created().json(revision),
    None => not_found("Post")
  }
}

async fn update_revision(
  req: HttpRequest,
  state: Shared,
  path: web::Path<i64>,
  body: web::Json<Value>
) -> HttpResponse {
  let mut st = match authorize(&req, &state) {
    Ok(st) => st,
    Err(resp) => return resp
  };
  match st.revisions.get_mut(&path.into_inner()) {
    Some(revision) => {
      apply_fields(revision, &body);
      HttpResponse::Ok().json(revision.clone())
    },
    None => not_found("Revision")
  }
}

async fn publish_revision(req: HttpRequest, state: Shared, path: web::Path<i64>) -> HttpResponse {
  let mut st = match authorize(&req, &state) {
    Ok(st) => st,
    Err(resp) => return resp
  };
  let id = path.into_inner();
  let revision = match st.revisions.remove(&id) {
    Some(revision) => revision,
    None => return not_found("Revision")
  };
  let post_id = st.revision_posts.remove(&id).unwrap_or_default();
  match st.posts.get_mut(&post_id) {
    Some(post) => {
      for field in CONTENT_FIELDS.iter() {
        post[*field] = revision[*field].clone();
      }
      post["categories"] = revision["categories"].clone();
      post["status"] = json!("PUBLISHED");
      post["publishedAt"] = json!("2024-05-04T12:00:00");
      HttpResponse::Ok().json(post.clone())
    },
    None => not_found("Post")
  }
}

async fn discard_revision(req: HttpRequest, state: Shared, path: web::Path<i64>) -> HttpResponse {
  let mut st = match authorize(&req, &state) {
    Ok(st) => st,
    Err(resp) => return resp
  };
  let id = path.into_inner();
  st.revision_posts.remove(&id);
  match st.revisions.remove(&id) {
    Some(_) => HttpResponse::NoContent().finish(),
    None => not_found("Revision")
  }
}

async fn request_deletion(
  req: HttpRequest,
  state: Shared,
  path: web::Path<i64>,
  body: web::Json<Value>
) -> HttpResponse {
  let mut st = match authorize(&req, &state) {
    Ok(st) => st,
    Err(resp) => return resp
  };
  let post_id = path.into_inner();
  let title = match st.posts.get(&post_id) {
    Some(post) => post["title"].clone(),
    None => return not_found("Post")
  };
  let id = st.next_id();
  let request = json!({
    "id": id,
    "postId": post_id,
    "postTitle": title,
    "reason": body["reason"].clone(),
    "status": "PENDING",
    "requestedBy": {"id": 5, "name": "Author"},
    "createdAt": "2024-05-05T14:00:00",
    "reviewedAt": null
  });
  st.deletion_requests.push(request.clone());
  HttpResponse::Ok().json(request)
}

async fn my_deletion_requests(req: HttpRequest, state: Shared) -> HttpResponse {
  match authorize(&req, &state) {
    Ok(st) => HttpResponse::Ok().json(&st.deletion_requests),
    Err(resp) => resp
  }
}

async fn pending_deletion_requests(req: HttpRequest, state: Shared) -> HttpResponse {
  match authorize(&req, &state) {
    Ok(st) => {
      let pending: Vec<&Value> = st.deletion_requests.iter()
        .filter(|r| r["status"] == json!("PENDING"))
        .collect();
      HttpResponse::Ok().json(pending)
    },
    Err(resp) => resp
  }
}

async fn review_deletion(
  req: HttpRequest,
  state: Shared,
  path: web::Path<(i64, String)>
) -> HttpResponse {
  let mut st = match authorize(&req, &state) {
    Ok(st) => st,
    Err(resp) => return resp
  };
  let (id, decision) = path.into_inner();
  let request = match st.deletion_requests.iter_mut().find(|r| r["id"] == json!(id)) {
    Some(request) => request,
    None => return not_found("Deletion request")
  };
  let approved = decision == "approve";
  request["status"] = json!(if approved { "APPROVED" } else { "DENIED" });
  request["reviewedAt"] = json!("2024-05-06T15:00:00");
  let post_id = request["postId"].as_i64().unwrap_or_default();
  if approved {
    st.posts.remove(&post_id);
  }
  HttpResponse::Ok().json(json!({"message": "done"}))
}

async fn post_history(req: HttpRequest, state: Shared, path: web::Path<i64>) -> HttpResponse {
  let st = match authorize(&req, &state) {
    Ok(st) => st,
    Err(resp) => return resp
  };
  let post_id = path.into_inner();
  let entries: Vec<&Value> = st.history.iter()
    .rev()
    .filter(|(id, _)| *id == post_id)
    .map(|(_, e)| e)
    .collect();
  HttpResponse::Ok().json(entries)
}

fn routes(cfg: &mut web::ServiceConfig) {
  cfg.service(
    web::scope("/api")
      .route("/posts", web::post().to(create_post))
      .route("/posts/{id}", web::get().to(get_post))
      .route("/posts/{id}", web::put().to(update_post))
      .route("/posts/{id}", web::delete().to(delete_post))
      .route("/posts/{id}/request-deletion", web::post().to(request_deletion))
      .route("/revisions/posts/{id}/active", web::get().to(active_revision))
      .route("/revisions/posts/{id}", web::post().to(create_revision))
      .route("/revisions/{id}", web::put().to(update_revision))
      .route("/revisions/{id}", web::delete().to(discard_revision))
      .route("/revisions/{id}/publish", web::post().to(publish_revision))
      .route("/admin/deletion-requests", web::get().to(pending_deletion_requests))
      .route("/admin/deletion-requests/my-requests", web::get().to(my_deletion_requests))
      .route("/admin/deletion-requests/{id}/{decision}", web::post().to(review_deletion))
      .route("/reviews/history/{id}", web::get().to(post_history))
  );
}

// Binds on a random port and serves until the test
// runtime goes away.
pub async fn start(state: FakeState) -> FakeBackend {
  let data = web::Data::new(Mutex::new(state));
  let app_data = data.clone();
  let server = HttpServer::new(move || {
    App::new()
      .app_data(app_data.clone())
      .configure(routes)
  })
  .workers(1)
  .bind(("127.0.0.1", 0))
  .unwrap();
  let addr = server.addrs()[0];
  actix_web::rt::spawn(server.run());
  FakeBackend {
    state: data,
    base_url: format!("http://{}/api/", addr)
  }
}
