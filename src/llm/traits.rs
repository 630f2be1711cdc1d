//! 模型供应商抽象
//!
//! 推理引擎（带远端会话上下文的 Agent）与结构化生成模型各一个 trait，均以 Arc<dyn ...> 注入；
//! 访问令牌获取独立为 TokenProvider，便于本地开发与测试替换。

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

/// 供应商调用错误（HTTP 状态 / 传输 / 空响应 / 响应解析 / 鉴权）
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProviderError {
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("Transport error: {0}")]
    Transport(String),

    /// 模型返回了空文本；上层按瞬时失败计入重试
    #[error("Empty response from model")]
    EmptyResponse,

    #[error("Response decode error: {0}")]
    Decode(String),

    #[error("Auth error: {0}")]
    Auth(String),
}

/// 推理引擎：在远端会话上下文中执行一次查询，返回拼接后的全文
#[async_trait]
pub trait ReasoningEngine: Send + Sync {
    async fn query(
        &self,
        user_id: &str,
        session_id: &str,
        message: &str,
    ) -> Result<String, ProviderError>;
}

/// 结构化生成模型：按给定 JSON 响应 schema 生成文本（期望为合法 JSON）
#[async_trait]
pub trait StructuredModel: Send + Sync {
    async fn generate(&self, response_schema: &Value, prompt: &str)
        -> Result<String, ProviderError>;
}

/// 访问令牌提供者：每次外呼前现取一枚 Bearer Token，不在本地缓存
#[async_trait]
pub trait TokenProvider: Send + Sync {
    async fn access_token(&self) -> Result<String, ProviderError>;
}
