//! 内存会话存储（本地开发与测试）
//!
//! 以 HashMap 模拟远端会话资源；remove_session 模拟 TTL 到期后的远端删除，
//! 之后的 append 与远端一样返回 NotFound。

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::session::{SessionError, SessionId, SessionStore};

/// 内存会话存储
#[derive(Default)]
pub struct MemorySessionStore {
    sessions: RwLock<HashMap<SessionId, Vec<Value>>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 模拟远端 TTL 清理：删除会话，返回是否存在过
    pub async fn remove_session(&self, session_id: &str) -> bool {
        self.sessions.write().await.remove(session_id).is_some()
    }

    /// 会话中已追加的事件负载
    pub async fn events(&self, session_id: &str) -> Option<Vec<Value>> {
        self.sessions.read().await.get(session_id).cloned()
    }

    /// 当前会话数
    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn create_session(&self, user_id: &str) -> Result<SessionId, SessionError> {
        let session_id = Uuid::new_v4().to_string();
        self.sessions
            .write()
            .await
            .insert(session_id.clone(), Vec::new());
        tracing::debug!("Created in-memory session {} for user {}", session_id, user_id);
        Ok(session_id)
    }

    async fn append_session_data(
        &self,
        session_id: &str,
        payload: &Value,
        _invocation_id: Option<&str>,
    ) -> Result<(), SessionError> {
        let mut sessions = self.sessions.write().await;
        match sessions.get_mut(session_id) {
            Some(events) => {
                events.push(payload.clone());
                Ok(())
            }
            None => Err(SessionError::NotFound(session_id.to_string())),
        }
    }
}
