use reqwest::Client;
use serde_json::{json, Value};
use std::future::Future;
use std::time::Duration;
use tracing::{error, info, warn};

use super::config::Config;
use super::error::{AgentError, Result};

const GENERATE_ATTEMPTS: usize = 2;
const WARMUP_TIMEOUT: Duration = Duration::from_secs(10);

/// Client for the completion-style generation endpoint. Failures never
/// propagate past `generate`: after the bounded retries it degrades to an
/// empty string and the turn ends with no commands.
#[derive(Clone)]
pub struct LlmClient {
    http: Client,
    base_url: String,
    model: String,
    temperature: f32,
    backoff: Duration,
}

impl LlmClient {
    pub fn new(config: &Config) -> Result<Self> {
        let http = Client::builder()
            .timeout(config.llm_timeout)
            .build()
            .map_err(|e| AgentError::Model(format!("failed to build LLM HTTP client: {e}")))?;
        Ok(Self {
            http,
            base_url: config.llm_url.trim_end_matches('/').to_string(),
            model: config.llm_model.clone(),
            temperature: config.temperature,
            backoff: config.llm_backoff,
        })
    }

    /// One-time ping so the backend loads the model before the first real
    /// prompt. Failure is non-fatal; the first prompt retries anyway.
    pub async fn warmup(&self) {
        info!("Warming up generation backend...");
        let payload = self.request_body("ping");
        let url = self.completions_url();
        match self
            .http
            .post(&url)
            .timeout(WARMUP_TIMEOUT)
            .json(&payload)
            .send()
            .await
        {
            Ok(_) => info!("Generation backend is ready."),
            Err(e) => warn!("Warm-up failed ({e}); will retry on first prompt."),
        }
    }

    /// Send the composed prompt, retrying once on any failure. Returns the
    /// raw completion text, or an empty string when both attempts fail.
    pub async fn generate(&self, prompt: &str) -> String {
        let outcome = retry_with_backoff(GENERATE_ATTEMPTS, self.backoff, || {
            self.request_completion(prompt)
        })
        .await;

        match outcome {
            Ok(text) => text,
            Err(e) => {
                error!("Failed to contact generation backend: {e}");
                String::new()
            }
        }
    }

    async fn request_completion(&self, prompt: &str) -> Result<String> {
        let url = self.completions_url();
        let payload = self.request_body(prompt);

        let resp = self.http.post(&url).json(&payload).send().await?;
        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(AgentError::Model(format!(
                "generation endpoint error ({status}): {body}"
            )));
        }

        let data: Value = resp.json().await?;
        extract_completion_text(&data)
            .ok_or_else(|| AgentError::Model("no completion text in response".to_string()))
    }

    fn completions_url(&self) -> String {
        format!("{}/v1/completions", self.base_url)
    }

    fn request_body(&self, prompt: &str) -> Value {
        json!({
            "model": self.model,
            "prompt": prompt,
            "stream": false,
            "options": { "temperature": self.temperature },
        })
    }
}

/// Backends disagree on the response schema. Try each known shape in priority
/// order and take the first non-empty text.
pub(crate) fn extract_completion_text(data: &Value) -> Option<String> {
    let strategies: [fn(&Value) -> Option<&str>; 3] = [
        |v| v.get("response").and_then(Value::as_str),
        |v| v.get("content").and_then(Value::as_str),
        |v| {
            v.get("choices")
                .and_then(Value::as_array)
                .and_then(|c| c.first())
                .and_then(|c| c.get("text"))
                .and_then(Value::as_str)
        },
    ];

    strategies
        .iter()
        .filter_map(|extract| extract(data))
        .map(str::trim)
        .find(|text| !text.is_empty())
        .map(str::to_string)
}

/// Bounded-attempts loop with a fixed pause between attempts, kept separate
/// from the transport call so it can be driven with a paused test clock.
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    attempts: usize,
    backoff: Duration,
    mut call: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut last_err = AgentError::Model("no attempts made".to_string());
    for attempt in 0..attempts {
        match call().await {
            Ok(value) => return Ok(value),
            Err(e) => {
                if attempt + 1 < attempts {
                    warn!(
                        "generation attempt {}/{} failed ({e}), retrying in {:?}",
                        attempt + 1,
                        attempts,
                        backoff
                    );
                    tokio::time::sleep(backoff).await;
                }
                last_err = e;
            }
        }
    }
    Err(last_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn response_field_wins_over_others() {
        let data = json!({"response": "a", "content": "b"});
        assert_eq!(extract_completion_text(&data).as_deref(), Some("a"));
    }

    #[test]
    fn empty_response_falls_through_to_content() {
        let data = json!({"response": "  ", "content": "b"});
        assert_eq!(extract_completion_text(&data).as_deref(), Some("b"));
    }

    #[test]
    fn choices_text_is_the_last_resort() {
        let data = json!({"choices": [{"text": " hello "}]});
        assert_eq!(extract_completion_text(&data).as_deref(), Some("hello"));
    }

    #[test]
    fn unknown_shape_yields_none() {
        assert_eq!(extract_completion_text(&json!({"output": "x"})), None);
        assert_eq!(extract_completion_text(&json!({"choices": []})), None);
    }

    #[tokio::test(start_paused = true)]
    async fn retries_once_then_succeeds() {
        let calls = AtomicUsize::new(0);
        let result = retry_with_backoff(2, Duration::from_secs(3), || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n == 0 {
                    Err(AgentError::Model("transient".to_string()))
                } else {
                    Ok("ok".to_string())
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), "ok");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn exhausted_attempts_return_last_error() {
        let calls = AtomicUsize::new(0);
        let result: Result<String> = retry_with_backoff(2, Duration::from_secs(3), || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(AgentError::Model("down".to_string())) }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
