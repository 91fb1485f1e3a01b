//! reqwest-backed implementation of [`StudentSource`].

use std::future::Future;
use std::time::Duration;

use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use tokio::time::timeout;

use super::error::RemoteError;
use super::wire::{DraftBody, ErrorPayload, PagePayload, PatchBody, StudentPayload};
use super::{RemoteConfig, StudentSource, TokenSource};
use crate::models::{Snapshot, Student, StudentDraft, StudentFilter, StudentId, StudentPatch};

/// Client for the student REST API.
#[derive(Debug, Clone)]
pub struct RemoteDataSource<T> {
    http: reqwest::Client,
    base_url: String,
    timeout: Duration,
    tokens: T,
}

impl<T: TokenSource> RemoteDataSource<T> {
    pub fn new(config: &RemoteConfig, tokens: T) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            timeout: config.timeout,
            tokens,
        }
    }

    /// Returns the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Path of one student; the id is sent as a single escaped segment.
    fn student_path(id: &StudentId) -> String {
        format!("/students/{}", urlencoding::encode(id.as_str()))
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http
            .request(method, self.url(path))
            .header(ACCEPT, "application/json")
            .header(CONTENT_TYPE, "application/json")
    }

    /// Attaches the token, sends, and turns non-success statuses into errors.
    async fn send(&self, builder: RequestBuilder) -> Result<Response, RemoteError> {
        let builder = match self.tokens.token().await {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        };

        let response = builder.send().await.map_err(|e| self.classify(e))?;
        let status = response.status();
        tracing::debug!("{} {}", status.as_u16(), response.url());

        if status.is_success() {
            return Ok(response);
        }

        let body = response.bytes().await.unwrap_or_default();
        let message = serde_json::from_slice::<ErrorPayload>(&body)
            .ok()
            .and_then(|e| e.message)
            .unwrap_or_else(|| format!("HTTP {}", status.as_u16()));

        Err(RemoteError::HttpStatus {
            code: status.as_u16(),
            message,
        })
    }

    async fn read_json<V: DeserializeOwned>(&self, response: Response) -> Result<V, RemoteError> {
        let body = response.bytes().await.map_err(|e| self.classify(e))?;
        serde_json::from_slice(&body).map_err(|e| RemoteError::Decode(e.to_string()))
    }

    /// Runs the whole exchange, body included, under the time budget.
    async fn bounded<V>(
        &self,
        exchange: impl Future<Output = Result<V, RemoteError>>,
    ) -> Result<V, RemoteError> {
        match timeout(self.timeout, exchange).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!("request aborted after {:?}", self.timeout);
                Err(RemoteError::Timeout(self.timeout))
            }
        }
    }

    fn classify(&self, err: reqwest::Error) -> RemoteError {
        if err.is_timeout() {
            RemoteError::Timeout(self.timeout)
        } else if err.is_decode() {
            RemoteError::Decode(err.to_string())
        } else {
            RemoteError::Transport(err.to_string())
        }
    }

    async fn fetch_page(
        &self,
        query: &[(&str, String)],
        page: u32,
    ) -> Result<Snapshot, RemoteError> {
        self.bounded(async {
            let response = self
                .send(self.request(Method::GET, "/students").query(query))
                .await?;
            let payload: PagePayload = self.read_json(response).await?;
            payload.into_snapshot(page)
        })
        .await
    }

    async fn fetch_student(&self, builder: RequestBuilder) -> Result<Student, RemoteError> {
        self.bounded(async {
            let response = self.send(builder).await?;
            let payload: StudentPayload = self.read_json(response).await?;
            payload.into_student()
        })
        .await
    }
}

impl<T: TokenSource> StudentSource for RemoteDataSource<T> {
    async fn list(&self, page: u32, size: u32) -> Result<Snapshot, RemoteError> {
        let query = [("page", page.to_string()), ("size", size.to_string())];
        self.fetch_page(&query, page).await
    }

    async fn list_filtered(
        &self,
        filter: &StudentFilter,
        page: u32,
        size: u32,
    ) -> Result<Snapshot, RemoteError> {
        let mut query = Vec::new();
        if let Some(program) = filter.program.as_deref().map(str::trim) {
            if !program.is_empty() {
                query.push(("filiere", program.to_string()));
            }
        }
        if let Some(status) = filter.status {
            query.push(("statut", status.as_backend_str().to_string()));
        }
        query.push(("page", page.to_string()));
        query.push(("size", size.to_string()));
        self.fetch_page(&query, page).await
    }

    async fn get(&self, id: &StudentId) -> Result<Student, RemoteError> {
        let path = Self::student_path(id);
        self.fetch_student(self.request(Method::GET, &path)).await
    }

    async fn create(&self, draft: &StudentDraft) -> Result<Student, RemoteError> {
        let builder = self
            .request(Method::POST, "/students")
            .json(&DraftBody::from(draft));
        self.fetch_student(builder).await
    }

    async fn update(&self, id: &StudentId, patch: &StudentPatch) -> Result<Student, RemoteError> {
        let path = Self::student_path(id);
        let builder = self
            .request(Method::PUT, &path)
            .json(&PatchBody::from(patch));
        self.fetch_student(builder).await
    }

    async fn delete(&self, id: &StudentId) -> Result<(), RemoteError> {
        let path = Self::student_path(id);
        self.bounded(async {
            self.send(self.request(Method::DELETE, &path)).await?;
            Ok(())
        })
        .await
    }

    async fn search(&self, term: &str, page: u32, size: u32) -> Result<Snapshot, RemoteError> {
        let query = [
            ("search", term.to_string()),
            ("page", page.to_string()),
            ("size", size.to_string()),
        ];
        self.fetch_page(&query, page).await
    }

    async fn health(&self) -> bool {
        let result = self
            .bounded(self.send(self.request(Method::GET, "/actuator/health")))
            .await;
        match result {
            Ok(_) => true,
            Err(e) => {
                tracing::debug!("health check failed: {}", e);
                false
            }
        }
    }
}
