//! LLM Client: posts one assembled prompt to a chat-completion endpoint and
//! returns the assistant message text.

use crate::config::Config;
use crate::context::SYSTEM_INSTRUCTION;
use crate::error::{Result, VibecError};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{info, warn};

const DRY_RUN_FIXTURE: &str = "File: example/file\n```lang\ncontent\n```";

#[derive(Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<Message<'a>>,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: String,
}

/// Backoff before attempt `n+1`, in milliseconds: `min(1000*2^(n-1), 30000)`.
fn backoff_ms(n: u32) -> u64 {
    let scaled = 1000u64.saturating_mul(1u64 << n.saturating_sub(1).min(62));
    scaled.min(30_000)
}

/// Send `prompt` as a chat-completion request and return the assistant
/// message text. Retries up to `cfg.retries` additional times with
/// exponential backoff; a final failure propagates as `LLMTransport`.
pub fn complete(prompt: &str, cfg: &Config) -> Result<String> {
    if cfg.dry_run {
        info!("dry-run: returning fixture completion");
        return Ok(DRY_RUN_FIXTURE.to_string());
    }

    let api_key = cfg.api_key.as_ref().ok_or_else(|| VibecError::LLMAuth {
        message: "apiKey is required unless dryRun is set".to_string(),
    })?;

    let url = format!("{}/chat/completions", cfg.api_url.trim_end_matches('/'));
    let body = ChatRequest {
        model: &cfg.api_model,
        messages: vec![
            Message {
                role: "system",
                content: SYSTEM_INSTRUCTION,
            },
            Message {
                role: "user",
                content: prompt,
            },
        ],
    };

    let total_attempts = 1 + cfg.retries;
    let mut last_err: Option<VibecError> = None;

    for attempt in 1..=total_attempts {
        if attempt > 1 {
            let wait = backoff_ms(attempt - 1);
            warn!(attempt, wait_ms = wait, "retrying LLM request after backoff");
            std::thread::sleep(Duration::from_millis(wait));
        }

        match send_once(&url, api_key, &body) {
            Ok(text) => return Ok(text),
            Err(e) => last_err = Some(e),
        }
    }

    Err(last_err.expect("loop runs at least once"))
}

fn send_once(url: &str, api_key: &str, body: &ChatRequest) -> Result<String> {
    let response = ureq::post(url)
        .header("Authorization", &format!("Bearer {api_key}"))
        .header("Content-Type", "application/json")
        .send_json(body);

    match response {
        Ok(mut resp) => {
            let parsed: ChatResponse = resp.body_mut().read_json().map_err(|e| VibecError::LLMTransport {
                status: Some(resp.status().as_u16()),
                message: format!("invalid JSON body: {e}"),
            })?;
            parsed
                .choices
                .into_iter()
                .next()
                .map(|c| c.message.content)
                .ok_or_else(|| VibecError::LLMTransport {
                    status: None,
                    message: "response contained no choices".to_string(),
                })
        }
        Err(ureq::Error::StatusCode(status)) => Err(VibecError::LLMTransport {
            status: Some(status),
            message: format!("non-2xx status {status}"),
        }),
        Err(e) => Err(VibecError::LLMTransport {
            status: None,
            message: e.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_doubles_and_caps() {
        assert_eq!(backoff_ms(1), 1000);
        assert_eq!(backoff_ms(2), 2000);
        assert_eq!(backoff_ms(3), 4000);
        assert_eq!(backoff_ms(5), 16000);
        assert_eq!(backoff_ms(6), 30000);
        assert_eq!(backoff_ms(10), 30000);
    }

    #[test]
    fn dry_run_returns_fixture_without_network() {
        let cfg = Config {
            workdir: ".".into(),
            stacks: vec!["core".into()],
            dry_run: true,
            start: None,
            end: None,
            api_url: "https://example.invalid".into(),
            api_key: None,
            api_model: "model".into(),
            test_cmd: None,
            retries: 0,
            iterations: 2,
            plugin_timeout: 5000,
            output: "output".into(),
            plugin_runner: "node".into(),
            bootstrap: false,
        };
        let text = complete("anything", &cfg).unwrap();
        assert_eq!(text, DRY_RUN_FIXTURE);
    }

    #[test]
    fn missing_api_key_without_dry_run_is_fatal() {
        let cfg = Config {
            workdir: ".".into(),
            stacks: vec!["core".into()],
            dry_run: false,
            start: None,
            end: None,
            api_url: "https://example.invalid".into(),
            api_key: None,
            api_model: "model".into(),
            test_cmd: None,
            retries: 0,
            iterations: 2,
            plugin_timeout: 5000,
            output: "output".into(),
            plugin_runner: "node".into(),
            bootstrap: false,
        };
        let err = complete("anything", &cfg).unwrap_err();
        assert!(matches!(err, VibecError::LLMAuth { .. }));
    }
}
