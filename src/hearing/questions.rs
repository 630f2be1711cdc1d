//! 一致性检查与追加问题生成
//!
//! 推理引擎审视会话内已收集的数据（矛盾、必备维度覆盖），结构化模型把分析转成
//! 零或多个追加问题。轮数达到上限时无条件完成，不发起任何外部调用；上游模型
//! 永不满足也不会把用户拖进无限追问。

use serde::Deserialize;
use uuid::Uuid;

use crate::hearing::prompts;
use crate::hearing::types::{
    AdditionalQuestionsRequest, AdditionalQuestionsResponse, AnswerCount, AnswerFormat,
    AnswerMethod, Question,
};
use crate::hearing::{HearingError, HearingService};
use crate::llm::ProviderError;
use crate::retry::with_retry;
use crate::session::is_valid_uuid_v4;

/// 追问轮数上限，到达后强制完成
pub const MAX_QUESTION_ROUNDS: u32 = 3;

impl HearingService {
    /// 检查会话数据的一致性与充分性，必要时生成追加问题
    pub async fn check_and_ask(
        &self,
        request: AdditionalQuestionsRequest,
    ) -> Result<AdditionalQuestionsResponse, HearingError> {
        // 会话 id 必须是 UUID v4，否则按不存在处理
        if !is_valid_uuid_v4(&request.session_id) {
            tracing::warn!("Rejecting malformed session id: {}", request.session_id);
            return Err(HearingError::SessionNotFound(request.session_id));
        }

        // 轮数上限：直接判完，不触达任何外部服务
        if request.question_count >= MAX_QUESTION_ROUNDS {
            tracing::info!(
                "Question round cap reached ({}/{}), forcing completion for session {}",
                request.question_count,
                MAX_QUESTION_ROUNDS,
                request.session_id
            );
            return Ok(AdditionalQuestionsResponse::HearingCompleted {
                question_count: request.question_count,
            });
        }

        // 一致性与充分性分析
        let consistency_prompt = prompts::build_consistency_prompt();
        let engine = &self.engine;
        let user_id = request.user_id.as_str();
        let session_id = request.session_id.as_str();
        let prompt = consistency_prompt.as_str();
        let analysis = with_retry(self.retry, || async move {
            let text = engine.query(user_id, session_id, prompt).await?;
            if text.trim().is_empty() {
                return Err(ProviderError::EmptyResponse);
            }
            Ok(text)
        })
        .await
        .map_err(|e| HearingError::Agent {
            attempts: e.attempts,
            cause: e.last_error,
        })?;

        // 问题生成，解析放在重试闭包内
        let response_schema = prompts::questions_response_schema();
        let question_prompt = prompts::build_question_prompt(&analysis);
        let model = &self.model;
        let schema = &response_schema;
        let gen_prompt = question_prompt.as_str();
        let raw_questions = with_retry(self.retry, || async move {
            let text = model.generate(schema, gen_prompt).await?;
            if text.trim().is_empty() {
                return Err(ProviderError::EmptyResponse);
            }
            parse_questions_response(&text)
        })
        .await
        .map_err(|e| HearingError::StructuredGeneration {
            attempts: e.attempts,
            cause: e.last_error,
        })?;

        // 零问题即数据充分，轮数保持不变
        if raw_questions.is_empty() {
            tracing::info!(
                "No additional questions needed for session {}",
                request.session_id
            );
            return Ok(AdditionalQuestionsResponse::HearingCompleted {
                question_count: request.question_count,
            });
        }

        let questions: Vec<Question> = raw_questions
            .into_iter()
            .map(RawQuestion::into_question)
            .collect();
        tracing::info!(
            "Generated {} additional questions for session {}",
            questions.len(),
            request.session_id
        );
        Ok(AdditionalQuestionsResponse::AdditionalQuestionsRequired {
            questions,
            question_count: request.question_count + 1,
        })
    }
}

/// 模型输出的原始问题，id 在转换时由服务端分配
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawQuestion {
    text: String,
    suggested_answer_count: AnswerCount,
    suggested_answer_format: AnswerFormat,
    requires_ai_interpretation: bool,
    #[serde(default)]
    options: Option<Vec<String>>,
}

impl RawQuestion {
    fn into_question(self) -> Question {
        Question {
            id: Uuid::new_v4().to_string(),
            text: self.text,
            answer_method: AnswerMethod {
                answer_count: self.suggested_answer_count,
                answer_format: self.suggested_answer_format,
                requires_ai_interpretation: self.requires_ai_interpretation,
                options: self.options,
            },
        }
    }
}

#[derive(Debug, Deserialize)]
struct QuestionsPayload {
    #[serde(default)]
    questions: Vec<RawQuestion>,
}

/// 解析问题生成输出：{ questions: [...] }，字段缺省按空列表
fn parse_questions_response(text: &str) -> Result<Vec<RawQuestion>, ProviderError> {
    let payload: QuestionsPayload = serde_json::from_str(text)
        .map_err(|e| ProviderError::Decode(format!("invalid JSON: {}", e)))?;
    Ok(payload.questions)
}
