//! 应用配置：从 config/default.toml 与环境变量加载
//!
//! 加载顺序：先读 TOML 文件，再用环境变量 `FPH__*` 覆盖（双下划线表示嵌套，如 `FPH__SESSION__TTL_DAYS=3`）。

use std::path::PathBuf;

use serde::Deserialize;

use crate::retry::RetryPolicy;
use crate::session::{EngineRef, SESSION_TTL_DAYS};

/// 应用配置根（对应 config/default.toml 的顶层）
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    #[serde(default)]
    pub vertex: VertexSection,
    #[serde(default)]
    pub genai: GenAiSection,
    #[serde(default)]
    pub session: SessionSection,
    #[serde(default)]
    pub retry: RetrySection,
    #[serde(default)]
    pub http: HttpSection,
}

/// [vertex] 段：推理引擎资源定位
///
/// 可给完整 resource_name，也可给 project_id / location / engine_id 三段
#[derive(Debug, Clone, Deserialize, Default)]
pub struct VertexSection {
    /// 完整资源名 projects/{p}/locations/{l}/reasoningEngines/{id}
    pub resource_name: Option<String>,
    pub project_id: Option<String>,
    pub location: Option<String>,
    pub engine_id: Option<String>,
}

impl VertexSection {
    /// 三段式配置优先于完整资源名
    pub fn engine_ref(&self) -> Option<EngineRef> {
        if let (Some(p), Some(l), Some(e)) = (&self.project_id, &self.location, &self.engine_id) {
            return Some(EngineRef::new(p.as_str(), l.as_str(), e.as_str()));
        }
        self.resource_name.as_deref().and_then(EngineRef::parse)
    }
}

/// [genai] 段：结构化生成模型
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GenAiSection {
    /// 未设置时退回 vertex.project_id
    pub project: Option<String>,
    /// 未设置时走 global 端点
    pub location: Option<String>,
    #[serde(default = "default_genai_model")]
    pub model: String,
}

impl Default for GenAiSection {
    fn default() -> Self {
        Self {
            project: None,
            location: None,
            model: default_genai_model(),
        }
    }
}

fn default_genai_model() -> String {
    crate::llm::DEFAULT_GENAI_MODEL.to_string()
}

/// [session] 段：会话 TTL
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SessionSection {
    /// 会话保存天数，到期由远端自动删除
    #[serde(default = "default_ttl_days")]
    pub ttl_days: u64,
}

impl Default for SessionSection {
    fn default() -> Self {
        Self {
            ttl_days: default_ttl_days(),
        }
    }
}

fn default_ttl_days() -> u64 {
    SESSION_TTL_DAYS
}

/// [retry] 段：模型调用的重试策略
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RetrySection {
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,
}

impl RetrySection {
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.max_retries,
            self.initial_delay_ms,
            self.backoff_multiplier,
        )
    }
}

impl Default for RetrySection {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            initial_delay_ms: default_initial_delay_ms(),
            backoff_multiplier: default_backoff_multiplier(),
        }
    }
}

fn default_max_retries() -> u32 {
    2
}

fn default_initial_delay_ms() -> u64 {
    1000
}

fn default_backoff_multiplier() -> f64 {
    2.0
}

/// [http] 段：外部调用超时
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpSection {
    /// 单次外部请求的硬超时（秒），超时按瞬时失败计入重试
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for HttpSection {
    fn default() -> Self {
        Self {
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

fn default_request_timeout_secs() -> u64 {
    30
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            vertex: VertexSection::default(),
            genai: GenAiSection::default(),
            session: SessionSection::default(),
            retry: RetrySection::default(),
            http: HttpSection::default(),
        }
    }
}

/// 从 config 目录加载配置，环境变量 FPH__* 可覆盖
///
/// 1. 按顺序查找 config/default.toml、../config/default.toml、default.toml，找到则作为第一源
/// 2. 若传入 config_path 且文件存在，则追加该文件（可覆盖前面的键）
/// 3. 最后叠加环境变量 FPH__*（双下划线表示嵌套键）
pub fn load_config(config_path: Option<PathBuf>) -> Result<AppConfig, config::ConfigError> {
    let mut builder = config::Config::builder();

    let default_names = ["config/default", "../config/default", "default"];
    for name in default_names {
        let path = format!("{}.toml", name);
        if std::path::Path::new(&path).exists() {
            builder = builder.add_source(config::File::with_name(name).required(false));
            break;
        }
    }

    if let Some(ref path) = config_path {
        if path.exists() {
            builder = builder.add_source(config::File::from(path.clone()).required(false));
        }
    }

    builder = builder.add_source(
        config::Environment::with_prefix("FPH")
            .separator("__")
            .try_parsing(true),
    );

    let c = builder.build()?;
    c.try_deserialize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_defaults() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.session.ttl_days, 10);
        assert_eq!(cfg.retry.max_retries, 2);
        assert_eq!(cfg.retry.initial_delay_ms, 1000);
        assert_eq!(cfg.retry.backoff_multiplier, 2.0);
        assert_eq!(cfg.http.request_timeout_secs, 30);
        assert_eq!(cfg.genai.model, "gemini-2.0-flash");
        assert!(cfg.vertex.engine_ref().is_none());
    }

    #[test]
    fn test_load_config_reads_toml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hearing.toml");
        fs::write(
            &path,
            r#"
[vertex]
resource_name = "projects/fp-demo/locations/us-central1/reasoningEngines/eng-1"

[session]
ttl_days = 3

[retry]
max_retries = 5
initial_delay_ms = 200

[http]
request_timeout_secs = 10
"#,
        )
        .unwrap();

        let cfg = load_config(Some(path)).unwrap();
        let engine = cfg.vertex.engine_ref().unwrap();
        assert_eq!(
            engine.resource_name(),
            "projects/fp-demo/locations/us-central1/reasoningEngines/eng-1"
        );
        assert_eq!(cfg.session.ttl_days, 3);
        assert_eq!(cfg.retry.max_retries, 5);
        assert_eq!(cfg.retry.initial_delay_ms, 200);
        // 未设置的键保持默认
        assert_eq!(cfg.retry.backoff_multiplier, 2.0);
        assert_eq!(cfg.http.request_timeout_secs, 10);
        assert_eq!(cfg.genai.model, "gemini-2.0-flash");
    }

    #[test]
    fn test_engine_ref_prefers_explicit_parts() {
        let section = VertexSection {
            resource_name: Some("projects/a/locations/b/reasoningEngines/c".to_string()),
            project_id: Some("p2".to_string()),
            location: Some("asia-northeast1".to_string()),
            engine_id: Some("e2".to_string()),
        };
        let engine = section.engine_ref().unwrap();
        assert_eq!(
            engine.resource_name(),
            "projects/p2/locations/asia-northeast1/reasoningEngines/e2"
        );
    }

    #[test]
    fn test_retry_section_policy_matches_defaults() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.retry.policy(), RetryPolicy::default());
    }
}
