//! 远端会话存储（Agent Engine Sessions REST）
//!
//! create: POST {base}/sessions，TTL 以秒串（如 "864000s"）下发，会话 ID 取响应 name 的末段；
//! append: POST {base}/sessions/{id}:appendEvent，事件作者与内容角色均为 system。
//! 远端在会话过期后直接删除资源，append 的一切失败都归为 NotFound（过期与不存在无法区分）。

use std::sync::Arc;

use async_trait::async_trait;
use regex::Regex;
use serde_json::{json, Value};

use crate::llm::TokenProvider;
use crate::session::{SessionError, SessionId, SessionStore, SESSION_TTL_DAYS};

/// 推理引擎资源引用
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineRef {
    pub project_id: String,
    pub location: String,
    pub engine_id: String,
}

impl EngineRef {
    pub fn new(
        project_id: impl Into<String>,
        location: impl Into<String>,
        engine_id: impl Into<String>,
    ) -> Self {
        Self {
            project_id: project_id.into(),
            location: location.into(),
            engine_id: engine_id.into(),
        }
    }

    /// 从完整资源名 projects/{p}/locations/{l}/reasoningEngines/{id} 解析
    pub fn parse(resource_name: &str) -> Option<EngineRef> {
        let re = Regex::new(r"^projects/([^/]+)/locations/([^/]+)/reasoningEngines/([^/]+)$")
            .ok()?;
        let caps = re.captures(resource_name)?;
        Some(EngineRef {
            project_id: caps[1].to_string(),
            location: caps[2].to_string(),
            engine_id: caps[3].to_string(),
        })
    }

    /// 完整资源名
    pub fn resource_name(&self) -> String {
        format!(
            "projects/{}/locations/{}/reasoningEngines/{}",
            self.project_id, self.location, self.engine_id
        )
    }

    /// 会话集合端点（v1beta1）
    pub fn sessions_uri(&self) -> String {
        format!(
            "https://{}-aiplatform.googleapis.com/v1beta1/{}/sessions",
            self.location,
            self.resource_name()
        )
    }

    /// 单个会话端点
    pub fn session_uri(&self, session_id: &str) -> String {
        format!("{}/{}", self.sessions_uri(), session_id)
    }

    /// appendEvent 端点
    pub fn append_event_uri(&self, session_id: &str) -> String {
        format!("{}:appendEvent", self.session_uri(session_id))
    }
}

/// 远端会话存储
pub struct VertexSessionStore {
    http: reqwest::Client,
    engine: EngineRef,
    token: Arc<dyn TokenProvider>,
    ttl_days: u64,
}

impl VertexSessionStore {
    pub fn new(http: reqwest::Client, engine: EngineRef, token: Arc<dyn TokenProvider>) -> Self {
        Self {
            http,
            engine,
            token,
            ttl_days: SESSION_TTL_DAYS,
        }
    }

    pub fn with_ttl_days(mut self, days: u64) -> Self {
        self.ttl_days = days;
        self
    }
}

/// TTL 秒串（10 天 → "864000s"）
fn format_ttl(days: u64) -> String {
    format!("{}s", days * 24 * 60 * 60)
}

/// 从创建响应的 name 字段提取会话 ID（资源名末段）
fn session_id_from_name(value: &Value) -> Option<SessionId> {
    let name = value.get("name")?.as_str()?;
    let id = name.rsplit('/').next()?;
    if id.is_empty() {
        None
    } else {
        Some(id.to_string())
    }
}

/// appendEvent 请求体：作者与内容角色均为 system，负载序列化进 parts[0].text
fn build_append_event(payload: &Value, invocation_id: Option<&str>) -> Value {
    let mut event = json!({
        "author": "system",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "content": {
            "role": "system",
            "parts": [ { "text": payload.to_string() } ]
        }
    });
    if let Some(id) = invocation_id {
        event["invocationId"] = json!(id);
    }
    event
}

#[async_trait]
impl SessionStore for VertexSessionStore {
    async fn create_session(&self, user_id: &str) -> Result<SessionId, SessionError> {
        let token = self
            .token
            .access_token()
            .await
            .map_err(|e| SessionError::CreateFailed(e.to_string()))?;
        let body = json!({ "userId": user_id, "ttl": format_ttl(self.ttl_days) });

        let resp = self
            .http
            .post(self.engine.sessions_uri())
            .bearer_auth(&token)
            .json(&body)
            .send()
            .await
            .map_err(|e| SessionError::CreateFailed(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let text = resp.text().await.unwrap_or_default();
            return Err(SessionError::CreateFailed(format!(
                "HTTP {}: {}",
                status, text
            )));
        }

        let value: Value = resp
            .json()
            .await
            .map_err(|e| SessionError::CreateFailed(e.to_string()))?;
        let Some(session_id) = session_id_from_name(&value) else {
            return Err(SessionError::CreateFailed(format!(
                "session id not found in response: {}",
                value
            )));
        };

        tracing::info!("Created session {} for user {}", session_id, user_id);
        Ok(session_id)
    }

    async fn append_session_data(
        &self,
        session_id: &str,
        payload: &Value,
        invocation_id: Option<&str>,
    ) -> Result<(), SessionError> {
        let token = match self.token.access_token().await {
            Ok(token) => token,
            Err(e) => {
                tracing::warn!("Append to session {} failed at auth: {}", session_id, e);
                return Err(SessionError::NotFound(session_id.to_string()));
            }
        };

        let event = build_append_event(payload, invocation_id);
        let resp = match self
            .http
            .post(self.engine.append_event_uri(session_id))
            .bearer_auth(&token)
            .json(&event)
            .send()
            .await
        {
            Ok(resp) => resp,
            Err(e) => {
                tracing::warn!("Append to session {} failed in transport: {}", session_id, e);
                return Err(SessionError::NotFound(session_id.to_string()));
            }
        };

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let text = resp.text().await.unwrap_or_default();
            // 过期会话已被远端删除，这里与主动 404 无法区分，一律按不存在处理
            tracing::warn!(
                "Append to session {} rejected: HTTP {}: {}",
                session_id,
                status,
                text
            );
            return Err(SessionError::NotFound(session_id.to_string()));
        }

        tracing::debug!("Appended event to session {}", session_id);
        Ok(())
    }
}
