//! 会话生命周期管理
//!
//! 远端推理引擎按 userId 维护带 TTL 的会话（默认 10 天），到期由远端直接删除资源；
//! 会话是否仍然存在只能在 append 时惰性发现，本地不做有效性缓存、不做主动清扫。
//! SessionStore 以 Arc<dyn ...> 注入：远端 REST 实现见 vertex，本地内存实现见 memory。

pub mod memory;
pub mod vertex;

pub use memory::MemorySessionStore;
pub use vertex::{EngineRef, VertexSessionStore};

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

/// 会话 ID（远端生成的资源短 ID，UUID v4 格式）
pub type SessionId = String;

/// 会话默认保存天数
pub const SESSION_TTL_DAYS: u64 = 10;

/// 会话层错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SessionError {
    /// 会话不存在；REST 存储无法区分「从未存在」与「过期被删」，两者都归入此类
    #[error("Session not found: {0}")]
    NotFound(SessionId),

    /// 会话已过期；仅能看到过期元数据的存储实现会返回
    #[error("Session expired: {0}")]
    Expired(SessionId),

    #[error("Failed to create session: {0}")]
    CreateFailed(String),
}

/// 会话存储接口
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// 为用户创建新会话，返回远端生成的会话 ID
    async fn create_session(&self, user_id: &str) -> Result<SessionId, SessionError>;

    /// 向会话追加一条数据事件；会话不存在（或已过期被删除）时返回 NotFound
    async fn append_session_data(
        &self,
        session_id: &str,
        payload: &Value,
        invocation_id: Option<&str>,
    ) -> Result<(), SessionError>;
}

/// 字符串是否为 UUID v4 格式
pub fn is_valid_uuid_v4(id: &str) -> bool {
    match uuid::Uuid::parse_str(id) {
        Ok(u) => u.get_version_num() == 4,
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uuid_v4_accepted() {
        assert!(is_valid_uuid_v4("550e8400-e29b-41d4-a716-446655440000"));
        assert!(is_valid_uuid_v4(&uuid::Uuid::new_v4().to_string()));
    }

    #[test]
    fn test_uuid_other_versions_rejected() {
        // v1 时间戳型
        assert!(!is_valid_uuid_v4("550e8400-e29b-11d4-a716-446655440000"));
        // nil
        assert!(!is_valid_uuid_v4("00000000-0000-0000-0000-000000000000"));
    }

    #[test]
    fn test_uuid_garbage_rejected() {
        assert!(!is_valid_uuid_v4(""));
        assert!(!is_valid_uuid_v4("not-a-uuid"));
        assert!(!is_valid_uuid_v4("550e8400e29b41d4a716446655440000zzz"));
    }
}
