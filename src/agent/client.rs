//! Client for OpenAI-compatible completion APIs

use crate::agent::types::*;
use crate::config::ProviderConfig;
use crate::error::{Error, Result};
use reqwest::{header, Client, StatusCode};
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Chat completion and embeddings client
#[derive(Clone)]
pub struct CompletionClient {
    /// HTTP client
    client: Client,
    /// Configuration
    config: ProviderConfig,
    /// Tokens consumed by every call made through this client and its clones
    total_tokens: Arc<AtomicU64>,
}

impl CompletionClient {
    /// Create a new client
    pub fn new(config: ProviderConfig) -> Result<Self> {
        let mut headers = header::HeaderMap::new();

        headers.insert(
            header::AUTHORIZATION,
            header::HeaderValue::from_str(&format!(
                "Bearer {}",
                config.api_key.expose_secret()
            ))
            .map_err(|e| Error::Config(format!("Invalid API key format: {}", e)))?,
        );

        let client = Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()?;

        Ok(CompletionClient {
            client,
            config,
            total_tokens: Arc::new(AtomicU64::new(0)),
        })
    }

    /// Get the chat model
    pub fn model(&self) -> &str {
        &self.config.model
    }

    /// Default generation options from configuration
    pub fn default_options(&self) -> GenerationOptions {
        GenerationOptions {
            max_tokens: self.config.max_tokens,
            ..GenerationOptions::with_temperature(self.config.temperature)
        }
    }

    /// Tokens used so far across all calls
    pub fn total_tokens(&self) -> u64 {
        self.total_tokens.load(Ordering::Relaxed)
    }

    /// Create a chat completion
    pub async fn chat(
        &self,
        messages: Vec<Message>,
        options: GenerationOptions,
    ) -> Result<ChatCompletionResponse> {
        let request = ChatCompletionRequest {
            model: self.config.model.clone(),
            messages,
            max_tokens: options.max_tokens,
            temperature: options.temperature,
            top_p: options.top_p,
            stop: options.stop,
            stream: Some(false),
        };

        debug!("Sending chat completion: model={}", request.model);

        let url = format!("{}/chat/completions", self.base_url());
        let body: ChatCompletionResponse = self.post(&url, &request).await?;

        if let Some(usage) = body.usage {
            self.record_usage(usage);
            info!(
                "Completion response: model={}, tokens={}",
                body.model, usage.total_tokens
            );
        }

        Ok(body)
    }

    /// Create a chat completion and return the text of the first choice
    pub async fn complete(&self, messages: Vec<Message>, options: GenerationOptions) -> Result<String> {
        let response = self.chat(messages, options).await?;

        response
            .first_text()
            .map(str::to_string)
            .ok_or_else(|| {
                Error::UpstreamMalformedResponse(format!(
                    "completion {} has no message content",
                    response.id
                ))
            })
    }

    /// Embed a batch of texts, returned in input order
    pub async fn embed(&self, input: Vec<String>) -> Result<Vec<Vec<f32>>> {
        let expected = input.len();
        let request = EmbeddingRequest {
            model: self.config.embedding_model.clone(),
            input,
        };

        debug!("Sending embeddings request: model={}, inputs={}", request.model, expected);

        let url = format!("{}/embeddings", self.base_url());
        let mut body: EmbeddingResponse = self.post(&url, &request).await?;

        if let Some(usage) = body.usage {
            self.record_usage(usage);
        }

        if body.data.len() != expected {
            return Err(Error::UpstreamMalformedResponse(format!(
                "expected {} embeddings, got {}",
                expected,
                body.data.len()
            )));
        }

        body.data.sort_by_key(|d| d.index);
        Ok(body.data.into_iter().map(|d| d.embedding).collect())
    }

    fn base_url(&self) -> &str {
        self.config.base_url.trim_end_matches('/')
    }

    fn record_usage(&self, usage: Usage) {
        self.total_tokens
            .fetch_add(u64::from(usage.total_tokens), Ordering::Relaxed);
    }

    /// POST a JSON body and decode the JSON reply, mapping failures onto
    /// the upstream error taxonomy
    async fn post<B, T>(&self, url: &str, body: &B) -> Result<T>
    where
        B: serde::Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(Error::from_upstream)?;

        let status = response.status();
        let text = response.text().await.map_err(Error::from_upstream)?;

        if status.is_success() {
            return serde_json::from_str(&text)
                .map_err(|e| Error::UpstreamMalformedResponse(e.to_string()));
        }

        match status {
            StatusCode::TOO_MANY_REQUESTS => {
                warn!("Rate limit exceeded: {}", text);
                Err(Error::UpstreamRejected(format!("rate limited: {}", text)))
            }
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                Err(Error::UpstreamRejected(format!("unauthorized ({})", status)))
            }
            StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => {
                Err(Error::UpstreamTimeout(format!("upstream returned {}", status)))
            }
            _ => Err(Error::Upstream(format!("API error ({}): {}", status, text))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::SecretString;
    use std::time::Duration;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_config(base_url: &str) -> ProviderConfig {
        ProviderConfig {
            api_key: SecretString::from("test-key"),
            base_url: base_url.to_string(),
            timeout: Duration::from_secs(5),
            ..Default::default()
        }
    }

    fn completion_body(text: &str) -> serde_json::Value {
        serde_json::json!({
            "id": "chatcmpl-1",
            "object": "chat.completion",
            "created": 1,
            "model": "gpt-3.5-turbo",
            "choices": [{
                "index": 0,
                "message": { "role": "assistant", "content": text },
                "finish_reason": "stop"
            }],
            "usage": { "prompt_tokens": 10, "completion_tokens": 5, "total_tokens": 15 }
        })
    }

    #[test]
    fn test_client_creation() {
        let client = CompletionClient::new(test_config("https://api.openai.com/v1"));
        assert!(client.is_ok());
    }

    #[tokio::test]
    async fn test_complete_returns_first_choice_and_counts_tokens() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("authorization", "Bearer test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion_body("4.")))
            .mount(&server)
            .await;

        let client = CompletionClient::new(test_config(&server.uri())).unwrap();
        let answer = client
            .complete(vec![Message::user("What is 2+2?")], GenerationOptions::precise())
            .await
            .unwrap();

        assert_eq!(answer, "4.");
        assert_eq!(client.total_tokens(), 15);
    }

    #[tokio::test]
    async fn test_rejections_are_classified() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(429).set_body_string("slow down"))
            .mount(&server)
            .await;

        let client = CompletionClient::new(test_config(&server.uri())).unwrap();
        let err = client
            .complete(vec![Message::user("Hi")], GenerationOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::UpstreamRejected(_)));
    }

    #[tokio::test]
    async fn test_unauthorized_is_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let client = CompletionClient::new(test_config(&server.uri())).unwrap();
        let err = client
            .complete(vec![Message::user("Hi")], GenerationOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::UpstreamRejected(_)));
    }

    #[tokio::test]
    async fn test_malformed_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let client = CompletionClient::new(test_config(&server.uri())).unwrap();
        let err = client
            .complete(vec![Message::user("Hi")], GenerationOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::UpstreamMalformedResponse(_)));
    }

    #[tokio::test]
    async fn test_empty_choices_is_malformed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "chatcmpl-2",
                "model": "gpt-3.5-turbo",
                "choices": []
            })))
            .mount(&server)
            .await;

        let client = CompletionClient::new(test_config(&server.uri())).unwrap();
        let err = client
            .complete(vec![Message::user("Hi")], GenerationOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::UpstreamMalformedResponse(_)));
    }

    #[tokio::test]
    async fn test_request_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(completion_body("late"))
                    .set_delay(Duration::from_secs(2)),
            )
            .mount(&server)
            .await;

        let mut config = test_config(&server.uri());
        config.timeout = Duration::from_millis(100);
        let client = CompletionClient::new(config).unwrap();
        let err = client
            .complete(vec![Message::user("Hi")], GenerationOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::UpstreamTimeout(_)));
    }

    #[tokio::test]
    async fn test_embeddings_are_ordered() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/embeddings"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": [
                    { "index": 1, "embedding": [0.0, 1.0] },
                    { "index": 0, "embedding": [1.0, 0.0] }
                ],
                "usage": { "prompt_tokens": 4, "total_tokens": 4 }
            })))
            .mount(&server)
            .await;

        let client = CompletionClient::new(test_config(&server.uri())).unwrap();
        let vectors = client
            .embed(vec!["a".to_string(), "b".to_string()])
            .await
            .unwrap();
        assert_eq!(vectors, vec![vec![1.0, 0.0], vec![0.0, 1.0]]);
        assert_eq!(client.total_tokens(), 4);
    }
}
