//! Mock 模型客户端（用于测试，无需凭证）
//!
//! 以预置脚本逐次出队应答，并记录调用次数与最近一次入参，便于断言重试行为与 schema 构造。
//! 队列耗尽后返回空串，上层会按空响应处理。

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use crate::llm::{ProviderError, ReasoningEngine, StructuredModel};

/// 脚本化推理引擎
#[derive(Default)]
pub struct MockReasoningEngine {
    replies: Mutex<VecDeque<Result<String, ProviderError>>>,
    calls: AtomicU32,
    last_prompt: Mutex<Option<String>>,
}

impl MockReasoningEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_ok(&self, reply: impl Into<String>) {
        self.replies.lock().unwrap().push_back(Ok(reply.into()));
    }

    pub fn push_err(&self, err: ProviderError) {
        self.replies.lock().unwrap().push_back(Err(err));
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.last_prompt.lock().unwrap().clone()
    }
}

#[async_trait]
impl ReasoningEngine for MockReasoningEngine {
    async fn query(
        &self,
        _user_id: &str,
        _session_id: &str,
        message: &str,
    ) -> Result<String, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_prompt.lock().unwrap() = Some(message.to_string());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(String::new()))
    }
}

/// 脚本化结构化生成模型，额外记录最近一次 responseSchema
#[derive(Default)]
pub struct MockStructuredModel {
    replies: Mutex<VecDeque<Result<String, ProviderError>>>,
    calls: AtomicU32,
    last_schema: Mutex<Option<Value>>,
    last_prompt: Mutex<Option<String>>,
}

impl MockStructuredModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_ok(&self, reply: impl Into<String>) {
        self.replies.lock().unwrap().push_back(Ok(reply.into()));
    }

    pub fn push_err(&self, err: ProviderError) {
        self.replies.lock().unwrap().push_back(Err(err));
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_schema(&self) -> Option<Value> {
        self.last_schema.lock().unwrap().clone()
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.last_prompt.lock().unwrap().clone()
    }
}

#[async_trait]
impl StructuredModel for MockStructuredModel {
    async fn generate(
        &self,
        response_schema: &Value,
        prompt: &str,
    ) -> Result<String, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_schema.lock().unwrap() = Some(response_schema.clone());
        *self.last_prompt.lock().unwrap() = Some(prompt.to_string());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(String::new()))
    }
}
