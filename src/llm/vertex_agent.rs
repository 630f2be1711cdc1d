//! 推理引擎客户端（streamQuery SSE）
//!
//! POST {resource}:streamQuery?alt=sse，请求体 classMethod=async_stream_query；
//! 流式读取 data: 事件并拼接 content.parts[].text，流结束后残留缓冲区再按事件或裸 JSON 兜底解析。

use std::sync::Arc;

use async_trait::async_trait;
use futures_util::StreamExt;
use serde_json::{json, Value};

use crate::llm::{ProviderError, ReasoningEngine, TokenProvider};

/// Vertex Agent Engine 客户端
pub struct VertexAgentClient {
    http: reqwest::Client,
    location: String,
    resource_name: String,
    token: Arc<dyn TokenProvider>,
}

impl VertexAgentClient {
    pub fn new(
        http: reqwest::Client,
        location: impl Into<String>,
        resource_name: impl Into<String>,
        token: Arc<dyn TokenProvider>,
    ) -> Self {
        Self {
            http,
            location: location.into(),
            resource_name: resource_name.into(),
            token,
        }
    }

    fn stream_query_url(&self) -> String {
        format!(
            "https://{}-aiplatform.googleapis.com/v1/{}:streamQuery?alt=sse",
            self.location, self.resource_name
        )
    }
}

#[async_trait]
impl ReasoningEngine for VertexAgentClient {
    async fn query(
        &self,
        user_id: &str,
        session_id: &str,
        message: &str,
    ) -> Result<String, ProviderError> {
        let token = self.token.access_token().await?;
        let body = json!({
            "classMethod": "async_stream_query",
            "input": {
                "user_id": user_id,
                "session_id": session_id,
                "message": message,
            }
        });

        let resp = self
            .http
            .post(self.stream_query_url())
            .bearer_auth(&token)
            .header(reqwest::header::ACCEPT, "text/event-stream")
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::Transport(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(ProviderError::Http { status, body });
        }

        let mut collector = SseTextCollector::new();
        let mut stream = resp.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| ProviderError::Transport(e.to_string()))?;
            collector.push(&String::from_utf8_lossy(&chunk));
        }
        Ok(collector.finish())
    }
}

/// SSE 文本收集器：按空行切分事件，解析 data: 行中的 JSON 并累积 content.parts[].text
#[derive(Debug, Default)]
pub struct SseTextCollector {
    buffer: String,
    text: String,
}

impl SseTextCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// 喂入一段原始文本；跨 chunk 的半个事件留在缓冲区
    pub fn push(&mut self, chunk: &str) {
        self.buffer.push_str(chunk);
        while let Some(pos) = self.buffer.find("\n\n") {
            let event = self.buffer[..pos].to_string();
            self.buffer.drain(..pos + 2);
            self.consume_event(&event);
        }
    }

    /// 流结束：残留缓冲区先按事件解析，不行再按裸 JSON 兜底
    pub fn finish(mut self) -> String {
        let rest = std::mem::take(&mut self.buffer);
        if !rest.trim().is_empty() {
            self.consume_event(&rest);
            if let Ok(value) = serde_json::from_str::<Value>(rest.trim()) {
                self.text.push_str(&extract_parts_text(&value));
            }
        }
        self.text
    }

    fn consume_event(&mut self, event: &str) {
        for line in event.lines() {
            let Some(data) = line.strip_prefix("data:") else {
                continue;
            };
            let data = data.trim();
            if data.is_empty() {
                continue;
            }
            match serde_json::from_str::<Value>(data) {
                Ok(value) => self.text.push_str(&extract_parts_text(&value)),
                Err(e) => tracing::debug!("Skipping unparseable SSE data line: {}", e),
            }
        }
    }
}

/// 从事件 JSON 中提取 content.parts[].text 并拼接；任何一层缺失都退化为空串
fn extract_parts_text(value: &Value) -> String {
    let mut out = String::new();
    if let Some(parts) = value
        .get("content")
        .and_then(|c| c.get("parts"))
        .and_then(|p| p.as_array())
    {
        for part in parts {
            if let Some(text) = part.get("text").and_then(|t| t.as_str()) {
                out.push_str(text);
            }
        }
    }
    out
}
