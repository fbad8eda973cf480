use std::time::Duration;

use flowstate_ports::SourceError;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RestError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("API error: {status} - {body}")]
    Status { status: u16, body: String },
    #[error("Parse error: {0}")]
    Parse(String),
}

/// Convert infrastructure RestError to the adapter-level SourceError
impl From<RestError> for SourceError {
    fn from(err: RestError) -> Self {
        match err {
            RestError::Http(e) if e.is_timeout() => {
                SourceError::Unavailable(format!("request timed out: {e}"))
            }
            RestError::Http(e) => SourceError::Unavailable(e.to_string()),
            RestError::Status { status, body } => match StatusCode::from_u16(status) {
                Ok(StatusCode::UNAUTHORIZED) | Ok(StatusCode::FORBIDDEN) => {
                    SourceError::Unauthorized(format!("{status}: {body}"))
                }
                Ok(StatusCode::TOO_MANY_REQUESTS) => SourceError::RateLimited,
                _ => SourceError::Unavailable(format!("{status}: {body}")),
            },
            RestError::Parse(msg) => SourceError::MalformedResponse(msg),
        }
    }
}

/// JSON-over-HTTP client shared by the provider adapters
#[derive(Clone)]
pub struct RestClient {
    client: Client,
}

impl RestClient {
    pub fn new(timeout: Duration) -> Result<Self, RestError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(RestClient { client })
    }

    /// GET `url` and parse the body as JSON
    pub async fn get_json(
        &self,
        url: &str,
        bearer: Option<&str>,
        query: &[(&str, String)],
    ) -> Result<Value, RestError> {
        let mut request = self.client.get(url).query(query);
        if let Some(token) = bearer {
            request = request.bearer_auth(token);
        }
        let resp = request.send().await?;
        self.handle_response(resp).await
    }

    async fn handle_response(&self, resp: reqwest::Response) -> Result<Value, RestError> {
        let status = resp.status();
        let text = resp.text().await?;

        if !status.is_success() {
            return Err(RestError::Status {
                status: status.as_u16(),
                body: text,
            });
        }

        serde_json::from_str(&text).map_err(|e| RestError::Parse(format!("{}: {}", e, text)))
    }
}

/// Read a finite number at a JSON pointer. Numeric strings are accepted.
pub fn read_number(body: &Value, pointer: &str) -> Result<f64, SourceError> {
    let value = body
        .pointer(pointer)
        .ok_or_else(|| SourceError::MalformedResponse(format!("no value at {pointer}")))?;
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    match number {
        Some(n) if n.is_finite() => Ok(n),
        _ => Err(SourceError::MalformedResponse(format!(
            "value at {pointer} is not a number: {value}"
        ))),
    }
}
