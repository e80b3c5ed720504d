use std::thread;
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use serde_json::Value;

use crate::config::LlmConfig;
use crate::domain::DatasetLocator;
use crate::error::PaperfetchError;
use crate::prompt::SECTION_MARKER;

/// The language-model transport. The pipeline only ever needs one raw text
/// completion per prompt.
pub trait LlmClient: Send + Sync {
    fn complete(&self, prompt: &str) -> Result<String, PaperfetchError>;
}

/// Blocking chat-completions client with bounded retries.
#[derive(Clone)]
pub struct HttpLlmClient {
    client: Client,
    endpoint: String,
    model: String,
    temperature: f32,
    api_key: Option<String>,
    max_retries: usize,
    retry_delay: Duration,
}

impl HttpLlmClient {
    pub fn new(config: &LlmConfig) -> Result<Self, PaperfetchError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("paperfetch/{}", env!("CARGO_PKG_VERSION")))
                .map_err(|err| PaperfetchError::LlmHttp(err.to_string()))?,
        );
        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|err| PaperfetchError::LlmHttp(err.to_string()))?;

        let api_key = std::env::var(&config.api_key_env).ok();
        if api_key.is_none() {
            tracing::warn!("{} is not set; LLM calls will go out unauthenticated", config.api_key_env);
        }

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            model: config.model.clone(),
            temperature: config.temperature,
            api_key,
            max_retries: config.max_retries,
            retry_delay: Duration::from_millis(config.retry_delay_ms),
        })
    }

    fn send_with_retries(&self, payload: &Value) -> Result<reqwest::blocking::Response, PaperfetchError> {
        let mut attempt = 0usize;
        loop {
            let mut request = self.client.post(&self.endpoint).json(payload);
            if let Some(key) = &self.api_key {
                request = request.bearer_auth(key);
            }
            match request.send() {
                Ok(response) => {
                    let status = response.status().as_u16();
                    if attempt < self.max_retries && is_retryable_status(status) {
                        tracing::warn!("LLM returned {status}, retrying ({}/{})", attempt + 1, self.max_retries);
                        thread::sleep(self.retry_delay * (attempt as u32 + 1));
                        attempt += 1;
                        continue;
                    }
                    return Ok(response);
                }
                Err(err) => {
                    if attempt < self.max_retries && is_retryable_error(&err) {
                        tracing::warn!("LLM request error, retrying ({}/{}): {err}", attempt + 1, self.max_retries);
                        thread::sleep(self.retry_delay * (attempt as u32 + 1));
                        attempt += 1;
                        continue;
                    }
                    return Err(PaperfetchError::LlmHttp(err.to_string()));
                }
            }
        }
    }
}

impl LlmClient for HttpLlmClient {
    fn complete(&self, prompt: &str) -> Result<String, PaperfetchError> {
        let payload = serde_json::json!({
            "model": self.model,
            "temperature": self.temperature,
            "messages": [{"role": "user", "content": prompt}],
        });

        let response = self.send_with_retries(&payload)?;
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response
                .text()
                .unwrap_or_else(|_| "LLM request failed".to_string());
            return Err(PaperfetchError::LlmStatus { status, message });
        }

        let body: Value = response
            .json()
            .map_err(|err| PaperfetchError::LlmHttp(err.to_string()))?;
        if let Some(usage) = body.get("usage") {
            tracing::debug!("LLM usage: {usage}");
        }
        body.get("choices")
            .and_then(|choices| choices.get(0))
            .and_then(|choice| choice.get("message"))
            .and_then(|message| message.get("content"))
            .and_then(|content| content.as_str())
            .map(|content| content.to_string())
            .ok_or_else(|| PaperfetchError::LlmResponse("no message content in response".to_string()))
    }
}

fn is_retryable_status(status: u16) -> bool {
    matches!(status, 429 | 500 | 502 | 503 | 504)
}

fn is_retryable_error(err: &reqwest::Error) -> bool {
    err.is_timeout() || err.is_connect() || err.is_request()
}

/// Pull the comma-separated name list out of a naming response. The model is
/// asked for `#### name: a,b,c`; everything after the final marker counts.
pub fn parse_name_response(response: &str) -> Vec<String> {
    let tail = response
        .rsplit(SECTION_MARKER)
        .next()
        .unwrap_or(response)
        .trim();
    let tail = tail
        .strip_prefix("name:")
        .or_else(|| tail.strip_prefix("Name:"))
        .map(str::trim)
        .unwrap_or(tail);
    tail.split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(|name| name.to_string())
        .collect()
}

/// Parse a download-info response into (name, locator) pairs, preserving the
/// model's ordering. Any parse failure logs the raw response and yields an
/// empty mapping; this never errors out to the caller.
pub fn parse_download_response(response: &str) -> Vec<(String, DatasetLocator)> {
    let payload = marked_section(response).unwrap_or_else(|| response.trim());

    let value: Value = match serde_json::from_str(payload) {
        Ok(value) => value,
        Err(err) => {
            tracing::warn!("unparsable download-info response ({err}); raw: {response}");
            return Vec::new();
        }
    };
    let Some(object) = value.as_object() else {
        tracing::warn!("download-info response is not a JSON object; raw: {response}");
        return Vec::new();
    };

    let mut entries = Vec::new();
    for (name, info) in object {
        let pair = info.as_array().and_then(|array| {
            match (array.first().and_then(Value::as_str), array.get(1).and_then(Value::as_str)) {
                (Some(source), Some(location)) if array.len() == 2 => {
                    Some((source.to_string(), location.to_string()))
                }
                _ => None,
            }
        });
        match pair {
            Some((source, location)) => {
                entries.push((name.clone(), DatasetLocator::Explicit { source, location }));
            }
            None => tracing::warn!("skipping malformed download-info entry for {name}: {info}"),
        }
    }
    entries
}

/// Content between the first and second occurrence of the marker token.
fn marked_section(response: &str) -> Option<&str> {
    let start = response.find(SECTION_MARKER)? + SECTION_MARKER.len();
    let rest = &response[start..];
    let end = rest.find(SECTION_MARKER)?;
    Some(rest[..end].trim())
}
