//! 问询层错误
//!
//! 调用方可见的封闭错误集合。Agent / StructuredGeneration 携带重试执行器的实际尝试次数
//! 与最后一次底层原因，原样上抛、不二次包装。

use thiserror::Error;

use crate::llm::ProviderError;
use crate::session::{SessionError, SessionId};

/// 问询编排错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum HearingError {
    /// 会话不存在（或已过期被远端删除，REST 存储不区分两者）
    #[error("Session not found: {0}")]
    SessionNotFound(SessionId),

    /// 会话已过期；仅在存储能看到过期元数据时出现
    #[error("Session expired: {0}")]
    SessionExpired(SessionId),

    #[error("Failed to create session: {0}")]
    SessionCreateFailed(String),

    /// 推理引擎重试耗尽
    #[error("Agent query failed after {attempts} attempts: {cause}")]
    Agent { attempts: u32, cause: ProviderError },

    /// 结构化生成重试耗尽
    #[error("Structured generation failed after {attempts} attempts: {cause}")]
    StructuredGeneration { attempts: u32, cause: ProviderError },

    /// 入参校验失败；只由边界校验函数产生，管线内部默认入参已清洗
    #[error("Validation failed: {issues:?}")]
    Validation { issues: Vec<String> },
}

impl From<SessionError> for HearingError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::NotFound(id) => HearingError::SessionNotFound(id),
            SessionError::Expired(id) => HearingError::SessionExpired(id),
            SessionError::CreateFailed(msg) => HearingError::SessionCreateFailed(msg),
        }
    }
}
