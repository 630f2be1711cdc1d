//! FP Hearing - 理财规划问询编排服务
//!
//! 模块划分：
//! - **config**: 应用配置加载（TOML + 环境变量）
//! - **hearing**: 问询编排（解读管线、一致性追问循环、直接入库）
//! - **llm**: 模型供应商抽象与实现（Vertex 推理引擎 / 结构化生成 / Mock）
//! - **observability**: tracing 订阅器初始化
//! - **retry**: 指数退避重试执行器
//! - **session**: 远端会话生命周期（创建 / 追加，TTL 到期惰性发现）

pub mod config;
pub mod hearing;
pub mod llm;
pub mod observability;
pub mod retry;
pub mod session;

pub use hearing::{HearingError, HearingService};
pub use retry::{with_retry, RetryError, RetryPolicy};
