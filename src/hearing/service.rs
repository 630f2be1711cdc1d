//! 问询服务装配
//!
//! HearingService 持有推理引擎、结构化生成模型与会话存储三个注入点；
//! from_config 按配置装配 Vertex 客户端，缺必填配置时装配直接失败。

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;

use crate::config::AppConfig;
use crate::llm::{
    create_token_provider, GenAiClient, ReasoningEngine, StructuredModel, VertexAgentClient,
};
use crate::retry::RetryPolicy;
use crate::session::{SessionStore, VertexSessionStore};

/// 问询编排服务
pub struct HearingService {
    pub(crate) engine: Arc<dyn ReasoningEngine>,
    pub(crate) model: Arc<dyn StructuredModel>,
    pub(crate) sessions: Arc<dyn SessionStore>,
    pub(crate) retry: RetryPolicy,
}

impl std::fmt::Debug for HearingService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HearingService")
            .field("retry", &self.retry)
            .finish_non_exhaustive()
    }
}

impl HearingService {
    /// 显式注入三个依赖（测试与自定义装配用）；重试策略取默认值
    pub fn new(
        engine: Arc<dyn ReasoningEngine>,
        model: Arc<dyn StructuredModel>,
        sessions: Arc<dyn SessionStore>,
    ) -> Self {
        Self {
            engine,
            model,
            sessions,
            retry: RetryPolicy::default(),
        }
    }

    /// 覆盖模型调用的重试策略（测试中缩短退避用）
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// 按配置装配 Vertex 客户端与远端会话存储
    pub fn from_config(cfg: &AppConfig) -> anyhow::Result<Self> {
        let engine_ref = cfg
            .vertex
            .engine_ref()
            .context("vertex engine reference not configured (set vertex.resource_name or vertex.project_id/location/engine_id)")?;

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(cfg.http.request_timeout_secs))
            .build()
            .context("failed to build HTTP client")?;

        let token = create_token_provider(http.clone());

        // genai 项目缺省沿用引擎项目；区域缺省走 global 端点
        let genai_project = cfg
            .genai
            .project
            .clone()
            .unwrap_or_else(|| engine_ref.project_id.clone());
        let genai_location = cfg
            .genai
            .location
            .clone()
            .unwrap_or_else(|| "global".to_string());

        tracing::info!(
            "Using reasoning engine {} and model {} ({})",
            engine_ref.engine_id,
            cfg.genai.model,
            genai_location
        );

        let engine = Arc::new(VertexAgentClient::new(
            http.clone(),
            engine_ref.location.clone(),
            engine_ref.resource_name(),
            token.clone(),
        ));
        let model = Arc::new(GenAiClient::new(
            http.clone(),
            genai_project,
            genai_location,
            cfg.genai.model.clone(),
            token.clone(),
        ));
        let sessions = Arc::new(
            VertexSessionStore::new(http, engine_ref, token).with_ttl_days(cfg.session.ttl_days),
        );

        Ok(Self {
            engine,
            model,
            sessions,
            retry: cfg.retry.policy(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_config_requires_engine_reference() {
        let cfg = AppConfig::default();
        let err = HearingService::from_config(&cfg).unwrap_err();
        assert!(err.to_string().contains("engine reference"));
    }

    #[test]
    fn test_from_config_builds_with_resource_name() {
        let mut cfg = AppConfig::default();
        cfg.vertex.resource_name =
            Some("projects/p1/locations/asia-northeast1/reasoningEngines/e1".to_string());
        let svc = HearingService::from_config(&cfg).unwrap();
        assert_eq!(svc.retry, RetryPolicy::default());
    }
}
