use async_trait::async_trait;
use serde_json::Value;

use crate::shared::models::{ChatRole, ChatTurn};

/// Opaque text-completion service: one call, growing history plus a new
/// prompt, one text reply.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    async fn complete(
        &self,
        history: &[ChatTurn],
        prompt: &str,
    ) -> Result<String, Box<dyn std::error::Error + Send + Sync>>;
}

pub struct GeminiClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl GeminiClient {
    pub fn new(api_key: String, base_url: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            base_url: base_url
                .unwrap_or_else(|| "https://generativelanguage.googleapis.com".to_string()),
        }
    }
}

#[async_trait]
impl CompletionProvider for GeminiClient {
    async fn complete(
        &self,
        history: &[ChatTurn],
        prompt: &str,
    ) -> Result<String, Box<dyn std::error::Error + Send + Sync>> {
        let mut contents: Vec<Value> = history
            .iter()
            .map(|turn| {
                let role = match turn.role {
                    ChatRole::User => "user",
                    ChatRole::Assistant => "model",
                };
                serde_json::json!({"role": role, "parts": [{"text": turn.text}]})
            })
            .collect();
        contents.push(serde_json::json!({"role": "user", "parts": [{"text": prompt}]}));

        let response = self
            .client
            .post(format!(
                "{}/v1beta/models/gemini-pro:generateContent",
                self.base_url
            ))
            .query(&[("key", self.api_key.as_str())])
            .json(&serde_json::json!({"contents": contents}))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(format!("completion service returned HTTP {}", response.status()).into());
        }

        let result: Value = response.json().await?;
        let content = result["candidates"][0]["content"]["parts"][0]["text"]
            .as_str()
            .unwrap_or("")
            .to_string();

        Ok(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::test_util;

    #[tokio::test]
    async fn completes_against_stubbed_service() {
        test_util::setup();
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1beta/models/gemini-pro:generateContent")
            .match_query(mockito::Matcher::UrlEncoded("key".into(), "k".into()))
            .with_status(200)
            .with_body(
                r#"{"candidates":[{"content":{"parts":[{"text":"hello there"}],"role":"model"}}]}"#,
            )
            .create_async()
            .await;

        let client = GeminiClient::new("k".to_string(), Some(server.url()));
        let reply = client.complete(&[], "hi").await.expect("completion");
        assert_eq!(reply, "hello there");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn surfaces_http_failures() {
        test_util::setup();
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v1beta/models/gemini-pro:generateContent")
            .match_query(mockito::Matcher::Any)
            .with_status(503)
            .create_async()
            .await;

        let client = GeminiClient::new("k".to_string(), Some(server.url()));
        let err = client.complete(&[], "hi").await.unwrap_err();
        assert!(err.to_string().contains("503"));
    }
}
