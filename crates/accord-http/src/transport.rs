//! REST request loop
//!
//! Issues HTTP calls with bounded retries: 429s honor the server-declared
//! cooldown (globally when flagged), 5xx and transient connection failures
//! back off linearly, and client errors surface immediately. Successful
//! bodies come back as JSON or raw text per the response content type.

use crate::error::HttpError;
use crate::ratelimit::RateLimitGate;
use crate::route::Route;
use accord_common::RestConfig;
use parking_lot::RwLock;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;

const USER_AGENT: &str = concat!(
    "AccordBot (https://github.com/accord-rs/accord, ",
    env!("CARGO_PKG_VERSION"),
    ")"
);

/// A decoded successful response
#[derive(Debug, Clone)]
pub enum ApiResponse {
    Json(Value),
    Text(String),
    /// 204 or an empty body
    Empty,
}

impl ApiResponse {
    /// The JSON body, if the response carried one
    #[must_use]
    pub fn into_json(self) -> Option<Value> {
        match self {
            Self::Json(value) => Some(value),
            _ => None,
        }
    }
}

/// A file to attach to a mutating request
#[derive(Debug, Clone)]
pub struct FileAttachment {
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// Per-request options
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    json: Option<Value>,
    reason: Option<String>,
    files: Vec<FileAttachment>,
}

impl RequestOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// JSON request body
    #[must_use]
    pub fn json(mut self, body: Value) -> Self {
        self.json = Some(body);
        self
    }

    /// Audit-log reason attached as the `X-Audit-Log-Reason` header
    #[must_use]
    pub fn reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Attach a file; the JSON body moves into the `payload_json` form field
    #[must_use]
    pub fn file(mut self, file: FileAttachment) -> Self {
        self.files.push(file);
        self
    }
}

/// Shape of a 429 response body
#[derive(Debug, Deserialize)]
struct RateLimitBody {
    #[serde(default)]
    retry_after: f64,
    #[serde(default)]
    global: bool,
}

/// REST client with the rate-limit gate and retry loop
pub struct Rest {
    http: reqwest::Client,
    base_url: String,
    max_retries: u32,
    token: RwLock<Option<String>>,
    gate: RateLimitGate,
}

impl Rest {
    #[must_use]
    pub fn new(config: &RestConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: config.base_url.clone(),
            max_retries: config.max_retries,
            token: RwLock::new(None),
            gate: RateLimitGate::new(),
        }
    }

    /// Store the bot token used for the Authorization header
    pub fn set_token(&self, token: &str) {
        *self.token.write() = Some(token.trim().to_string());
    }

    /// Check whether a token has been configured
    #[must_use]
    pub fn has_token(&self) -> bool {
        self.token.read().is_some()
    }

    /// The global rate-limit gate (exposed for tests and diagnostics)
    #[must_use]
    pub fn gate(&self) -> &RateLimitGate {
        &self.gate
    }

    fn auth_header(&self) -> Result<String, HttpError> {
        self.token
            .read()
            .as_ref()
            .map(|t| format!("Bot {t}"))
            .ok_or(HttpError::MissingToken)
    }

    /// Issue a request with bounded retries for transient failures.
    ///
    /// 404 maps to `NotFound`, 401/403 to `Forbidden`; both carry the raw
    /// body and are never retried. 429 and 5xx are retried up to the
    /// configured attempt count.
    pub async fn request(
        &self,
        route: Route,
        options: RequestOptions,
    ) -> Result<ApiResponse, HttpError> {
        let url = route.url(&self.base_url);
        let auth = self.auth_header()?;

        let mut last_status = 0u16;
        let mut last_body = String::new();

        for attempt in 0..self.max_retries {
            // Block while a global cooldown is in effect.
            self.gate.acquire().await;

            let builder = self.build_request(&route, &url, &auth, &options);

            let response = match builder.send().await {
                Ok(response) => response,
                Err(err) if is_transient(&err) && attempt + 1 < self.max_retries => {
                    let delay = backoff(attempt);
                    tracing::warn!(
                        route = %route,
                        attempt,
                        delay_secs = delay.as_secs(),
                        error = %err,
                        "transient transport error, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    continue;
                }
                Err(err) => return Err(HttpError::Transport(err)),
            };

            let status = response.status();
            if status.is_success() {
                return decode_body(response).await;
            }

            let body = response.text().await.unwrap_or_default();
            match status.as_u16() {
                404 => return Err(HttpError::NotFound { body }),
                401 | 403 => return Err(HttpError::Forbidden { body }),
                429 => {
                    let limit: RateLimitBody =
                        serde_json::from_str(&body).unwrap_or(RateLimitBody {
                            retry_after: 1.0,
                            global: false,
                        });
                    let cooldown = Duration::from_secs_f64(limit.retry_after.max(0.0));
                    tracing::debug!(
                        route = %route,
                        retry_after = limit.retry_after,
                        global = limit.global,
                        "rate limited"
                    );
                    if limit.global {
                        self.gate.lock_for(cooldown).await;
                    } else {
                        tokio::time::sleep(cooldown).await;
                    }
                    last_status = 429;
                    last_body = body;
                }
                status_code if status_code >= 500 => {
                    let delay = backoff(attempt);
                    tracing::warn!(
                        route = %route,
                        status = status_code,
                        attempt,
                        delay_secs = delay.as_secs(),
                        "server error, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    last_status = status_code;
                    last_body = body;
                }
                status_code => {
                    return Err(HttpError::RequestFailed { status: status_code, body });
                }
            }
        }

        Err(HttpError::RequestFailed { status: last_status, body: last_body })
    }

    fn build_request(
        &self,
        route: &Route,
        url: &str,
        auth: &str,
        options: &RequestOptions,
    ) -> reqwest::RequestBuilder {
        let mut builder = self
            .http
            .request(route.method.clone(), url)
            .header(reqwest::header::AUTHORIZATION, auth)
            .header(reqwest::header::USER_AGENT, USER_AGENT);

        if let Some(reason) = &options.reason {
            builder = builder.header("X-Audit-Log-Reason", reason);
        }

        if options.files.is_empty() {
            if let Some(json) = &options.json {
                builder = builder.json(json);
            }
        } else {
            // Files ride in a multipart form: the JSON body moves into the
            // `payload_json` field, files become indexed parts.
            let mut form = reqwest::multipart::Form::new();
            if let Some(json) = &options.json {
                form = form.text("payload_json", json.to_string());
            }
            for (index, file) in options.files.iter().enumerate() {
                let part = reqwest::multipart::Part::bytes(file.bytes.clone())
                    .file_name(file.filename.clone());
                form = form.part(format!("files[{index}]"), part);
            }
            builder = builder.multipart(form);
        }

        builder
    }
}

async fn decode_body(response: reqwest::Response) -> Result<ApiResponse, HttpError> {
    let is_json = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("application/json"));

    let text = response.text().await?;
    if text.is_empty() {
        return Ok(ApiResponse::Empty);
    }
    if is_json {
        return Ok(ApiResponse::Json(serde_json::from_str(&text)?));
    }
    Ok(ApiResponse::Text(text))
}

/// Linear backoff for 5xx and transient connection failures
fn backoff(attempt: u32) -> Duration {
    Duration::from_secs(1 + u64::from(attempt) * 2)
}

fn is_transient(err: &reqwest::Error) -> bool {
    err.is_connect() || err.is_timeout()
}
