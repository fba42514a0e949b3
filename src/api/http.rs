use std::time::Duration;
use async_trait::async_trait;
use log::{debug, error, warn};
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use crate::utils::serde_utils::empty_string_to_none;
use crate::workflow::entities::*;
use crate::workflow::error::{Error, Result, NETWORK_ERROR_MESSAGE};
use crate::workflow::status::PostStatus;
use super::dtos::{ContentBody, ErrorBody, NewPostBody, ReasonBody, UpdatePostBody};
use super::{Backend, PostUpdate};

/**
 * Backend implementation talking to the REST API over
 * HTTP. Every request carries the bearer token when we
 * have one.
 */
pub struct HttpBackend {
  client: reqwest::Client,
  base_url: String,
  token: Option<String>
}

impl HttpBackend {

  pub fn new(
    base_url: &str,
    token: Option<String>,
    timeout: Duration
  ) -> Result<Self> {
    let client = reqwest::Client::builder()
      .timeout(timeout)
      .build()
      .map_err(|e| {
        error!("Could not build the HTTP client - {}", e);
        Error::Network(NETWORK_ERROR_MESSAGE.to_string())
      })?;
    Ok(Self::with_client(client, base_url, token))
  }

  // Mostly for tests, or to share a connection pool.
  pub fn with_client(
    client: reqwest::Client,
    base_url: &str,
    token: Option<String>
  ) -> Self {
    Self {
      client,
      // Trailing slashes would give out "//" in paths.
      base_url: base_url.trim_end_matches('/').to_string(),
      token: empty_string_to_none(token)
    }
  }

  fn request(&self, method: Method, path: &str) -> RequestBuilder {
    debug!("{} {}", method, path);
    let builder = self.client.request(method, format!("{}{}", self.base_url, path));
    match &self.token {
      Some(token) => builder.bearer_auth(token),
      None => builder
    }
  }

  async fn send(&self, builder: RequestBuilder) -> Result<Response> {
    let response = builder.send()
      .await
      .map_err(|e| {
        error!("Request to backend failed - {}", e);
        Error::Network(NETWORK_ERROR_MESSAGE.to_string())
      })?;
    ensure_success(response).await
  }

  async fn send_json<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T> {
    let response = self.send(builder).await?;
    response.json::<T>()
      .await
      .map_err(|e| {
        error!("Could not parse backend response - {}", e);
        Error::Backend {
          status: 200,
          message: String::from("Unexpected response from the server")
        }
      })
  }

  async fn send_no_content(&self, builder: RequestBuilder) -> Result<()> {
    self.send(builder).await.map(|_| ())
  }

}

// Maps a non-2xx status and the message we could dig
// out of the body into our error taxonomy.
pub fn error_from_status(status: StatusCode, message: Option<String>) -> Error {
  let message = message.unwrap_or_else(|| format!("HTTP {}", status.as_u16()));
  match status {
    StatusCode::NOT_FOUND => Error::NotFound(message),
    StatusCode::CONFLICT => Error::Conflict(message),
    StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Error::Forbidden(message),
    _ => Error::Backend {
      status: status.as_u16(),
      message
    }
  }
}

async fn ensure_success(response: Response) -> Result<Response> {
  let status = response.status();
  if status.is_success() {
    return Ok(response);
  }
  // Body might not be JSON at all (proxies and the
  // like), in which case we just go with the status.
  let message = match response.text().await {
    Ok(text) => serde_json::from_str::<ErrorBody>(&text)
      .ok()
      .and_then(ErrorBody::into_message),
    Err(_) => None
  };
  warn!("Backend responded with {} - {:?}", status, message);
  Err(error_from_status(status, message))
}

#[async_trait]
impl Backend for HttpBackend {

  async fn fetch_post(&self, id: PostId) -> Result<Post> {
    self.send_json(self.request(Method::GET, &format!("/posts/{}", id))).await
  }

  async fn create_post(&self, content: &PostContent) -> Result<Post> {
    let body = NewPostBody {
      content: ContentBody::from(content),
      status: PostStatus::Draft
    };
    self.send_json(self.request(Method::POST, "/posts").json(&body)).await
  }

  async fn update_post(&self, id: PostId, update: &PostUpdate) -> Result<Post> {
    let body = UpdatePostBody::from(update);
    self.send_json(
      self.request(Method::PUT, &format!("/posts/{}", id)).json(&body)
    ).await
  }

  async fn delete_post(&self, id: PostId) -> Result<()> {
    self.send_no_content(self.request(Method::DELETE, &format!("/posts/{}", id))).await
  }

  async fn active_revision(&self, post_id: PostId) -> Result<Option<Revision>> {
    let builder = self.request(
      Method::GET,
      &format!("/revisions/posts/{}/active", post_id)
    );
    // A 404 here just means there's no open revision.
    match self.send_json::<Revision>(builder).await {
      Ok(revision) => Ok(Some(revision)),
      Err(Error::NotFound(_)) => Ok(None),
      Err(e) => Err(e)
    }
  }

  async fn create_revision(&self, post_id: PostId) -> Result<Revision> {
    self.send_json(
      self.request(Method::POST, &format!("/revisions/posts/{}", post_id))
    ).await
  }

  async fn update_revision(&self, id: RevisionId, content: &PostContent) -> Result<Revision> {
    let body = ContentBody::from(content);
    self.send_json(
      self.request(Method::PUT, &format!("/revisions/{}", id)).json(&body)
    ).await
  }

  async fn publish_revision(&self, id: RevisionId) -> Result<Post> {
    self.send_json(
      self.request(Method::POST, &format!("/revisions/{}/publish", id))
    ).await
  }

  async fn discard_revision(&self, id: RevisionId) -> Result<()> {
    self.send_no_content(self.request(Method::DELETE, &format!("/revisions/{}", id))).await
  }

  async fn request_deletion(&self, post_id: PostId, reason: &str) -> Result<DeletionRequest> {
    self.send_json(
      self.request(Method::POST, &format!("/posts/{}/request-deletion", post_id))
        .json(&ReasonBody { reason })
    ).await
  }

  async fn my_deletion_requests(&self) -> Result<Vec<DeletionRequest>> {
    self.send_json(
      self.request(Method::GET, "/admin/deletion-requests/my-requests")
    ).await
  }

  async fn pending_deletion_requests(&self) -> Result<Vec<DeletionRequest>> {
    self.send_json(self.request(Method::GET, "/admin/deletion-requests")).await
  }

  async fn approve_deletion(&self, id: DeletionRequestId) -> Result<()> {
    self.send_no_content(
      self.request(Method::POST, &format!("/admin/deletion-requests/{}/approve", id))
    ).await
  }

  async fn deny_deletion(&self, id: DeletionRequestId) -> Result<()> {
    self.send_no_content(
      self.request(Method::POST, &format!("/admin/deletion-requests/{}/deny", id))
    ).await
  }

  async fn post_history(&self, post_id: PostId) -> Result<Vec<HistoryEntry>> {
    self.send_json(
      self.request(Method::GET, &format!("/reviews/history/{}", post_id))
    ).await
  }

}
