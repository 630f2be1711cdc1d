//! 模型供应商层：推理引擎与结构化生成模型的抽象与实现（Vertex / Mock）

pub mod auth;
pub mod genai;
pub mod mock;
pub mod traits;
pub mod vertex_agent;

pub use auth::{create_token_provider, MetadataTokenProvider, StaticTokenProvider};
pub use genai::{GenAiClient, DEFAULT_GENAI_MODEL};
pub use mock::{MockReasoningEngine, MockStructuredModel};
pub use traits::{ProviderError, ReasoningEngine, StructuredModel, TokenProvider};
pub use vertex_agent::{SseTextCollector, VertexAgentClient};
