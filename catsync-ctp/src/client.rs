//! The commercetools catalog client.

use crate::auth::TokenCache;
use crate::config::CtpConfig;
use crate::error::CtpResult;
use async_trait::async_trait;
use catsync_sync::{
    CatalogClient, CatalogError, CatalogResult, Expansion, Page, QueryRequest, WriteResponse,
};
use catsync_types::{Category, CategoryDraft, Key, ResourceId, UpdateAction};
use reqwest::header::RETRY_AFTER;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::{debug, info};

/// Fallback wait when a 429 response carries no usable `Retry-After`.
const DEFAULT_RETRY_AFTER_SECS: u64 = 1;

/// A paged query result.
#[derive(Debug, Deserialize)]
struct PagedQueryResponse {
    results: Vec<Category>,
}

/// A created or updated category, with any warnings the API attached.
#[derive(Debug, Deserialize)]
struct WriteBody {
    #[serde(flatten)]
    category: Category,
    #[serde(default)]
    warnings: Vec<ApiMessage>,
}

#[derive(Debug, Deserialize)]
struct ApiMessage {
    #[serde(default)]
    code: Option<String>,
    message: String,
}

impl ApiMessage {
    fn describe(&self) -> String {
        match &self.code {
            Some(code) => format!("{code}: {}", self.message),
            None => self.message.clone(),
        }
    }
}

/// The error body of a failed request.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    errors: Vec<ApiMessage>,
}

impl ErrorBody {
    fn describe(&self) -> String {
        if self.errors.is_empty() {
            self.message.clone()
        } else {
            self.errors
                .iter()
                .map(ApiMessage::describe)
                .collect::<Vec<_>>()
                .join("; ")
        }
    }
}

#[derive(Debug, Serialize)]
struct UpdateBody<'a> {
    version: u64,
    actions: &'a [UpdateAction],
}

/// Catalog client for one commercetools project.
pub struct CtpClient {
    config: CtpConfig,
    http: Client,
    tokens: TokenCache,
    closed: AtomicBool,
}

impl CtpClient {
    /// Creates a client. No request is made until the first call.
    pub fn new(config: CtpConfig) -> CtpResult<Self> {
        config.validate()?;
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            config,
            http,
            tokens: TokenCache::new(),
            closed: AtomicBool::new(false),
        })
    }

    pub fn config(&self) -> &CtpConfig {
        &self.config
    }

    fn categories_url(&self) -> String {
        format!("{}/{}/categories", self.config.api_base(), self.config.project_key)
    }

    fn ensure_open(&self) -> CatalogResult<()> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(CatalogError::Closed);
        }
        Ok(())
    }

    /// Sends an authenticated request and maps failure statuses.
    async fn send(&self, request: RequestBuilder) -> CatalogResult<Response> {
        self.ensure_open()?;
        let token = self.tokens.access_token(&self.http, &self.config).await?;

        let response = request
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| CatalogError::Transient(format!("request failed: {e}")))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        if status == StatusCode::UNAUTHORIZED {
            self.tokens.invalidate().await;
        }
        Err(error_for(response).await)
    }

    async fn write(&self, request: RequestBuilder) -> CatalogResult<WriteResponse> {
        let response = self.send(request).await?;
        let body: WriteBody = response
            .json()
            .await
            .map_err(|e| CatalogError::Protocol(format!("failed to parse category: {e}")))?;

        Ok(WriteResponse {
            category: body.category,
            warnings: body.warnings.iter().map(ApiMessage::describe).collect(),
        })
    }
}

fn expand_params() -> Vec<(&'static str, &'static str)> {
    Expansion::all()
        .iter()
        .map(|expansion| ("expand", expansion.path()))
        .collect()
}

/// Maps a non-success response onto a catalog error.
async fn error_for(response: Response) -> CatalogError {
    let status = response.status();
    let retry_after = response
        .headers()
        .get(RETRY_AFTER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse::<u64>().ok());
    let text = response.text().await.unwrap_or_default();
    let detail = serde_json::from_str::<ErrorBody>(&text)
        .map(|body| body.describe())
        .ok()
        .filter(|d| !d.is_empty())
        .unwrap_or(text);

    match status {
        StatusCode::BAD_REQUEST => CatalogError::Validation(detail),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => CatalogError::Auth(detail),
        StatusCode::NOT_FOUND => CatalogError::NotFound(detail),
        StatusCode::CONFLICT => CatalogError::Conflict(detail),
        StatusCode::TOO_MANY_REQUESTS => CatalogError::RateLimited {
            retry_after_secs: retry_after.unwrap_or(DEFAULT_RETRY_AFTER_SECS),
        },
        s if s.is_server_error() => CatalogError::Transient(format!("{status}: {detail}")),
        _ => CatalogError::Protocol(format!("{status}: {detail}")),
    }
}

#[async_trait]
impl CatalogClient for CtpClient {
    fn project_key(&self) -> &str {
        &self.config.project_key
    }

    // changeParent requires a parent on this API.
    fn supports_root_moves(&self) -> bool {
        false
    }

    async fn query(&self, request: &QueryRequest) -> CatalogResult<Page> {
        let mut params: Vec<(&str, String)> = vec![
            ("limit", request.limit.to_string()),
            ("sort", "id asc".to_string()),
            ("withTotal", "false".to_string()),
        ];
        for expansion in &request.expansions {
            params.push(("expand", expansion.path().to_string()));
        }
        if let Some(cursor) = &request.cursor {
            let after = ResourceId::from_cursor(cursor)
                .map_err(|e| CatalogError::Protocol(format!("bad cursor '{cursor}': {e}")))?;
            params.push(("where", after.after_predicate()));
        }

        let response = self
            .send(self.http.get(self.categories_url()).query(&params))
            .await?;
        let page: PagedQueryResponse = response
            .json()
            .await
            .map_err(|e| CatalogError::Protocol(format!("failed to parse query response: {e}")))?;

        debug!(
            "Queried {} categories from project '{}'",
            page.results.len(),
            self.config.project_key
        );

        // A short page is the last one.
        let next_cursor = if page.results.len() as u64 >= u64::from(request.limit) {
            page.results.last().map(|c| c.id.cursor())
        } else {
            None
        };

        Ok(Page {
            results: page.results,
            next_cursor,
        })
    }

    async fn create(&self, draft: &CategoryDraft) -> CatalogResult<WriteResponse> {
        let request = self
            .http
            .post(self.categories_url())
            .query(&expand_params())
            .json(draft);
        self.write(request).await
    }

    async fn update(
        &self,
        key: &Key,
        version: u64,
        actions: &[UpdateAction],
    ) -> CatalogResult<WriteResponse> {
        let url = format!(
            "{}/key={}",
            self.categories_url(),
            urlencoding::encode(key.as_str())
        );
        let request = self
            .http
            .post(url)
            .query(&expand_params())
            .json(&UpdateBody { version, actions });
        self.write(request).await
    }

    async fn close(&self) -> CatalogResult<()> {
        if !self.closed.swap(true, Ordering::SeqCst) {
            self.tokens.invalidate().await;
            info!("Closed client for project '{}'", self.config.project_key);
        }
        Ok(())
    }
}
