//! 问询编排层：解读管线、一致性追问循环与直接入库路径
//!
//! HearingService 持有推理引擎、结构化模型与会话存储三个注入点，三条操作路径
//! 共用同一份重试策略。错误集合封闭，调用方可以穷尽匹配。

pub mod direct;
pub mod error;
pub mod interpret;
pub mod prompts;
pub mod questions;
pub mod service;
pub mod types;

pub use error::HearingError;
pub use questions::MAX_QUESTION_ROUNDS;
pub use service::HearingService;
pub use types::{
    AdditionalQuestionsRequest, AdditionalQuestionsResponse, AnswerCount, AnswerFormat,
    AnswerMethod, DirectDataRequest, DirectDataResponse, Estimation, EstimationValue,
    InterpretedDataRequest, InterpretedDataResponse, OutputSchema, Question, SchemaProperty,
    MAX_CONTENT_LENGTH,
};
