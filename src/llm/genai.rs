//! 结构化生成模型客户端（generateContent）
//!
//! 请求 responseMimeType=application/json 并携带 responseSchema，让模型按 schema 输出 JSON；
//! 返回 candidates[0].content.parts[0].text，任何一层缺失都退化为空串，由上层按空响应处理。

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::llm::{ProviderError, StructuredModel, TokenProvider};

/// 默认的结构化生成模型
pub const DEFAULT_GENAI_MODEL: &str = "gemini-2.0-flash";

/// Vertex 上的 Gemini generateContent 客户端
pub struct GenAiClient {
    http: reqwest::Client,
    project: String,
    location: String,
    model: String,
    token: Arc<dyn TokenProvider>,
}

impl GenAiClient {
    pub fn new(
        http: reqwest::Client,
        project: impl Into<String>,
        location: impl Into<String>,
        model: impl Into<String>,
        token: Arc<dyn TokenProvider>,
    ) -> Self {
        Self {
            http,
            project: project.into(),
            location: location.into(),
            model: model.into(),
            token,
        }
    }

    fn generate_content_url(&self) -> String {
        // global 区域走无前缀主机名
        let host = if self.location == "global" {
            "aiplatform.googleapis.com".to_string()
        } else {
            format!("{}-aiplatform.googleapis.com", self.location)
        };
        format!(
            "https://{}/v1/projects/{}/locations/{}/publishers/google/models/{}:generateContent",
            host, self.project, self.location, self.model
        )
    }
}

#[async_trait]
impl StructuredModel for GenAiClient {
    async fn generate(
        &self,
        response_schema: &Value,
        prompt: &str,
    ) -> Result<String, ProviderError> {
        let token = self.token.access_token().await?;
        let body = json!({
            "contents": [ { "role": "user", "parts": [ { "text": prompt } ] } ],
            "generationConfig": {
                "responseMimeType": "application/json",
                "responseSchema": response_schema,
            }
        });

        let resp = self
            .http
            .post(self.generate_content_url())
            .bearer_auth(&token)
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::Transport(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(ProviderError::Http { status, body });
        }

        let value: Value = resp
            .json()
            .await
            .map_err(|e| ProviderError::Decode(e.to_string()))?;
        Ok(extract_candidate_text(&value))
    }
}

/// candidates[0].content.parts[0].text
fn extract_candidate_text(value: &Value) -> String {
    value
        .get("candidates")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("content"))
        .and_then(|c| c.get("parts"))
        .and_then(|p| p.get(0))
        .and_then(|p| p.get("text"))
        .and_then(|t| t.as_str())
        .unwrap_or_default()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::StaticTokenProvider;

    #[test]
    fn test_extract_candidate_text() {
        let value = serde_json::json!({
            "candidates": [ { "content": { "parts": [ { "text": "{\"a\":1}" } ] } } ]
        });
        assert_eq!(extract_candidate_text(&value), "{\"a\":1}");
    }

    #[test]
    fn test_extract_candidate_text_missing_is_empty() {
        assert_eq!(extract_candidate_text(&serde_json::json!({})), "");
        assert_eq!(
            extract_candidate_text(&serde_json::json!({ "candidates": [] })),
            ""
        );
    }

    #[test]
    fn test_generate_content_url_regional_and_global() {
        let token = std::sync::Arc::new(StaticTokenProvider::new("t"));
        let regional = GenAiClient::new(
            reqwest::Client::new(),
            "p1",
            "asia-northeast1",
            DEFAULT_GENAI_MODEL,
            token.clone(),
        );
        assert_eq!(
            regional.generate_content_url(),
            "https://asia-northeast1-aiplatform.googleapis.com/v1/projects/p1/locations/asia-northeast1/publishers/google/models/gemini-2.0-flash:generateContent"
        );

        let global = GenAiClient::new(
            reqwest::Client::new(),
            "p1",
            "global",
            "gemini-2.5-flash",
            token,
        );
        assert_eq!(
            global.generate_content_url(),
            "https://aiplatform.googleapis.com/v1/projects/p1/locations/global/publishers/google/models/gemini-2.5-flash:generateContent"
        );
    }
}
