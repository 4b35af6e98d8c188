use super::{ChatMessage, CompletionTransport, FragmentStream, LlmError};
use crate::config::LlmConfig;
use async_trait::async_trait;
use eventsource_stream::Eventsource;
use futures::{future, StreamExt};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, AUTHORIZATION};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

const CHAT_COMPLETIONS_PATH: &str = "/chat/completions";

/// Key header required by Azure API Management style gateways.
pub const API_KEY_HEADER: &str = "api-key";

#[derive(Serialize)]
struct OpenAiRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f64,
    stream: bool,
}

// Every level is optional: providers and gateways routinely send keep-alive
// chunks, usage-only chunks or `null` deltas.
#[derive(Deserialize)]
struct OpenAiStreamResponse {
    choices: Option<Vec<OpenAiStreamChoice>>,
}

#[derive(Deserialize)]
struct OpenAiStreamChoice {
    delta: Option<OpenAiDelta>,
}

#[derive(Deserialize)]
struct OpenAiDelta {
    content: Option<String>,
}

/// Streaming transport for OpenAI-compatible `/chat/completions` endpoints.
#[derive(Debug, Clone)]
pub struct OpenAiTransport {
    http: Client,
    url: String,
    model: String,
    temperature: f64,
}

impl OpenAiTransport {
    pub fn new(config: &LlmConfig) -> Result<Self, LlmError> {
        // Per-operation limits: a stream that keeps sending tokens may run
        // past `timeout_secs` as a whole.
        let http = Client::builder()
            .default_headers(build_headers(&config.api_key)?)
            .connect_timeout(config.timeout())
            .read_timeout(config.timeout())
            .build()?;

        Ok(Self {
            http,
            url: format!(
                "{}{}",
                config.base_url.trim_end_matches('/'),
                CHAT_COMPLETIONS_PATH
            ),
            model: config.model.clone(),
            temperature: config.temperature,
        })
    }
}

/// The key goes out both as a bearer token and as `api-key`, so one client
/// works against plain OpenAI-compatible servers and against gateways.
fn build_headers(api_key: &str) -> Result<HeaderMap, LlmError> {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("text/event-stream"));

    if !api_key.is_empty() {
        let mut bearer = HeaderValue::from_str(&format!("Bearer {}", api_key))
            .map_err(|e| LlmError::InvalidHeader(e.to_string()))?;
        bearer.set_sensitive(true);
        let mut key =
            HeaderValue::from_str(api_key).map_err(|e| LlmError::InvalidHeader(e.to_string()))?;
        key.set_sensitive(true);

        headers.insert(AUTHORIZATION, bearer);
        headers.insert(HeaderName::from_static(API_KEY_HEADER), key);
    }

    Ok(headers)
}

#[async_trait]
impl CompletionTransport for OpenAiTransport {
    async fn open_stream(&self, messages: &[ChatMessage]) -> Result<FragmentStream, LlmError> {
        let body = OpenAiRequest {
            model: &self.model,
            messages,
            temperature: self.temperature,
            stream: true,
        };

        let resp = self.http.post(&self.url).json(&body).send().await?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let text = resp.text().await.unwrap_or_default();
            return Err(LlmError::Api {
                status,
                message: text,
            });
        }

        let fragments = resp
            .bytes_stream()
            .eventsource()
            .take_while(|event| {
                let keep = match event {
                    Ok(event) => event.data != "[DONE]",
                    Err(e) => {
                        debug!(error = %e, "stream ended by transport error");
                        false
                    }
                };
                future::ready(keep)
            })
            .filter_map(|event| {
                future::ready(event.ok().and_then(|event| fragment_from_event(&event.data)))
            })
            .boxed();

        Ok(fragments)
    }
}

/// Extract the text of one SSE `data:` payload, if it carries any.
pub(crate) fn fragment_from_event(data: &str) -> Option<String> {
    let parsed: OpenAiStreamResponse = match serde_json::from_str(data) {
        Ok(parsed) => parsed,
        Err(e) => {
            debug!(error = %e, "skipping unparseable stream event");
            return None;
        }
    };

    parsed
        .choices?
        .into_iter()
        .next()?
        .delta?
        .content
        .filter(|content| !content.is_empty())
}
