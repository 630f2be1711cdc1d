//! 访问令牌获取
//!
//! 两种实现：环境变量静态令牌（本地开发）与 GCE 元数据服务器（线上运行环境）。

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;

use crate::llm::{ProviderError, TokenProvider};

/// GCE 元数据服务器的令牌端点
const METADATA_TOKEN_URL: &str =
    "http://metadata.google.internal/computeMetadata/v1/instance/service-accounts/default/token";

/// 静态令牌（来自环境变量或显式传入）
pub struct StaticTokenProvider {
    token: String,
}

impl StaticTokenProvider {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

#[async_trait]
impl TokenProvider for StaticTokenProvider {
    async fn access_token(&self) -> Result<String, ProviderError> {
        if self.token.is_empty() {
            return Err(ProviderError::Auth("empty access token".to_string()));
        }
        Ok(self.token.clone())
    }
}

#[derive(Debug, Deserialize)]
struct MetadataTokenResponse {
    access_token: String,
}

/// 元数据服务器令牌（GCE / Cloud Run）
pub struct MetadataTokenProvider {
    http: reqwest::Client,
}

impl MetadataTokenProvider {
    pub fn new(http: reqwest::Client) -> Self {
        Self { http }
    }
}

#[async_trait]
impl TokenProvider for MetadataTokenProvider {
    async fn access_token(&self) -> Result<String, ProviderError> {
        let resp = self
            .http
            .get(METADATA_TOKEN_URL)
            .header("Metadata-Flavor", "Google")
            .send()
            .await
            .map_err(|e| ProviderError::Transport(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(ProviderError::Auth(format!(
                "metadata server returned {}: {}",
                status, body
            )));
        }

        let token: MetadataTokenResponse = resp
            .json()
            .await
            .map_err(|e| ProviderError::Decode(e.to_string()))?;
        Ok(token.access_token)
    }
}

/// 根据环境选择令牌来源：GOOGLE_ACCESS_TOKEN 存在则用静态令牌，否则走元数据服务器
pub fn create_token_provider(http: reqwest::Client) -> Arc<dyn TokenProvider> {
    match std::env::var("GOOGLE_ACCESS_TOKEN") {
        Ok(token) if !token.is_empty() => {
            tracing::info!("Using static access token from environment");
            Arc::new(StaticTokenProvider::new(token))
        }
        _ => {
            tracing::info!("Using GCE metadata server for access tokens");
            Arc::new(MetadataTokenProvider::new(http))
        }
    }
}
