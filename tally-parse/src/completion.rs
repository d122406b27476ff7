//! Text-completion capability used by the model-backed parser.
//!
//! The parser only needs "prompt in, text out". Tests pass closures; the CLI
//! passes an [`HttpCompleter`] talking to Anthropic or OpenAI.

use anyhow::{Context, Result, anyhow, bail};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::runtime::{Handle, RuntimeFlavor};

pub trait TextCompletion {
    fn complete(&self, prompt: &str) -> Result<String>;
}

impl<F> TextCompletion for F
where
    F: Fn(&str) -> Result<String>,
{
    fn complete(&self, prompt: &str) -> Result<String> {
        self(prompt)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Anthropic,
    OpenAI,
}

impl Provider {
    pub fn from_name(name: &str) -> Result<Provider> {
        match name.trim().to_ascii_lowercase().as_str() {
            "anthropic" => Ok(Provider::Anthropic),
            "openai" => Ok(Provider::OpenAI),
            other => bail!("unknown provider: {other} (expected anthropic or openai)"),
        }
    }

    pub fn default_base_url(&self) -> &'static str {
        match self {
            Provider::Anthropic => "https://api.anthropic.com",
            Provider::OpenAI => "https://api.openai.com",
        }
    }
}

#[derive(Debug, Clone)]
pub struct CompletionConfig {
    pub provider: Provider,
    pub model: String,
    pub base_url: String,
    pub api_key: String,
    pub timeout: Duration,
    pub max_tokens: u32,
}

/// Completion over HTTPS with a bounded timeout and no retries.
pub struct HttpCompleter {
    config: CompletionConfig,
    client: reqwest::Client,
}

impl HttpCompleter {
    pub fn new(config: CompletionConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .context("build http client")?;
        Ok(Self { config, client })
    }

    async fn complete_async(&self, prompt: &str) -> Result<String> {
        match self.config.provider {
            Provider::Anthropic => self.anthropic_complete(prompt).await,
            Provider::OpenAI => self.openai_complete(prompt).await,
        }
    }

    /// Drive one request on a private runtime.
    fn complete_blocking(&self, prompt: &str) -> Result<String> {
        let rt = tokio::runtime::Runtime::new().context("create tokio runtime")?;
        rt.block_on(self.complete_async(prompt))
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    async fn anthropic_complete(&self, prompt: &str) -> Result<String> {
        #[derive(Serialize)]
        struct Msg<'a> {
            role: &'a str,
            content: &'a str,
        }

        #[derive(Serialize)]
        struct Req<'a> {
            model: &'a str,
            max_tokens: u32,
            messages: Vec<Msg<'a>>,
        }

        #[derive(Deserialize)]
        struct Resp {
            content: Vec<ContentBlock>,
        }

        #[derive(Deserialize)]
        struct ContentBlock {
            #[serde(rename = "type")]
            t: String,
            text: Option<String>,
        }

        let body = Req {
            model: &self.config.model,
            max_tokens: self.config.max_tokens,
            messages: vec![Msg {
                role: "user",
                content: prompt,
            }],
        };

        let mut headers = HeaderMap::new();
        headers.insert("x-api-key", HeaderValue::from_str(&self.config.api_key)?);
        headers.insert("anthropic-version", HeaderValue::from_static("2023-06-01"));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let resp = self
            .client
            .post(self.endpoint("/v1/messages"))
            .headers(headers)
            .json(&body)
            .send()
            .await
            .context("anthropic request")?;

        let status = resp.status();
        if !status.is_success() {
            let txt = resp.text().await.unwrap_or_default();
            bail!("anthropic error: {status} {txt}");
        }

        let out: Resp = resp.json().await.context("parse anthropic response")?;
        let text: String = out
            .content
            .into_iter()
            .filter(|b| b.t == "text")
            .filter_map(|b| b.text)
            .collect();
        Ok(text.trim().to_string())
    }

    async fn openai_complete(&self, prompt: &str) -> Result<String> {
        #[derive(Serialize)]
        struct Msg<'a> {
            role: &'a str,
            content: &'a str,
        }

        #[derive(Serialize)]
        struct Req<'a> {
            model: &'a str,
            messages: Vec<Msg<'a>>,
            temperature: f32,
            max_tokens: u32,
        }

        #[derive(Deserialize)]
        struct Resp {
            choices: Vec<Choice>,
        }

        #[derive(Deserialize)]
        struct Choice {
            message: MsgOut,
        }

        #[derive(Deserialize)]
        struct MsgOut {
            content: Option<String>,
        }

        let body = Req {
            model: &self.config.model,
            messages: vec![Msg {
                role: "user",
                content: prompt,
            }],
            temperature: 0.1,
            max_tokens: self.config.max_tokens,
        };

        let resp = self
            .client
            .post(self.endpoint("/v1/chat/completions"))
            .header(AUTHORIZATION, format!("Bearer {}", self.config.api_key))
            .json(&body)
            .send()
            .await
            .context("openai request")?;

        let status = resp.status();
        if !status.is_success() {
            let txt = resp.text().await.unwrap_or_default();
            bail!("openai error: {status} {txt}");
        }

        let out: Resp = resp.json().await.context("parse openai response")?;
        let content = out
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default();

        Ok(content.trim().to_string())
    }
}

impl TextCompletion for HttpCompleter {
    fn complete(&self, prompt: &str) -> Result<String> {
        // A nested block_on panics inside any runtime. The multi-threaded one
        // can lend this worker via block_in_place; a current-thread runtime
        // cannot, so the request runs on a scoped thread instead.
        match Handle::try_current() {
            Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => {
                tokio::task::block_in_place(|| handle.block_on(self.complete_async(prompt)))
            }
            Ok(_) => std::thread::scope(|s| {
                s.spawn(|| self.complete_blocking(prompt))
                    .join()
                    .map_err(|_| anyhow!("completion thread panicked"))?
            }),
            Err(_) => self.complete_blocking(prompt),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closure_is_a_completion() {
        let echo = |p: &str| -> Result<String> { Ok(format!("echo: {p}")) };
        assert_eq!(echo.complete("hi").unwrap(), "echo: hi");
    }

    #[test]
    fn test_provider_from_name() {
        assert_eq!(Provider::from_name("OpenAI").unwrap(), Provider::OpenAI);
        assert_eq!(Provider::from_name("anthropic").unwrap(), Provider::Anthropic);
        assert!(Provider::from_name("gemini").is_err());
    }

    fn local_completer(base_url: String, timeout: Duration) -> HttpCompleter {
        HttpCompleter::new(CompletionConfig {
            provider: Provider::OpenAI,
            model: "gpt-4o-mini".to_string(),
            base_url,
            api_key: "sk-test".to_string(),
            timeout,
            max_tokens: 64,
        })
        .unwrap()
    }

    fn refused_completer() -> HttpCompleter {
        local_completer("http://127.0.0.1:9".to_string(), Duration::from_millis(500))
    }

    #[test]
    fn test_unreachable_endpoint_is_an_error() {
        let completer = refused_completer();
        assert!(completer.complete("hello").is_err());
    }

    #[test]
    fn test_silent_server_times_out() {
        // Accepts the connection (via the backlog) but never answers
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());
        let completer = local_completer(base_url, Duration::from_millis(200));

        let started = std::time::Instant::now();
        assert!(completer.complete("hello").is_err());
        assert!(started.elapsed() < Duration::from_secs(2), "took {:?}", started.elapsed());
        drop(listener);
    }

    #[tokio::test]
    async fn test_complete_inside_current_thread_runtime() {
        let completer = refused_completer();
        assert!(completer.complete("hello").is_err());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_complete_inside_multi_thread_runtime() {
        let completer = refused_completer();
        assert!(completer.complete("hello").is_err());
    }
}
