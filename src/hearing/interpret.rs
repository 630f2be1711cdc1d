//! 解读管线
//!
//! 自由文本 → 推理引擎分析 → 结构化生成 → 写入会话。两段模型调用各自独立重试，
//! 空响应与解析失败都按瞬时失败计入重试；会话是否仍存活推迟到 append 时发现。

use std::collections::BTreeMap;

use serde_json::{json, Map, Value};

use crate::hearing::prompts;
use crate::hearing::types::{Estimation, InterpretedDataRequest, InterpretedDataResponse};
use crate::hearing::{HearingError, HearingService};
use crate::llm::ProviderError;
use crate::retry::with_retry;

impl HearingService {
    /// 解读用户自由文本并写入会话
    pub async fn interpret(
        &self,
        request: InterpretedDataRequest,
    ) -> Result<InterpretedDataResponse, HearingError> {
        tracing::info!("Interpreting content for session {}", request.session_id);

        // 第一段：推理引擎分析
        let agent_prompt =
            prompts::build_agent_prompt(&request.content, &request.estimation_targets);
        let engine = &self.engine;
        let user_id = request.user_id.as_str();
        let session_id = request.session_id.as_str();
        let prompt = agent_prompt.as_str();
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

        // 第二段：结构化生成，解析放在重试闭包内
        let response_schema = prompts::structuring_response_schema(
            &request.output_schema,
            &request.estimation_targets,
        );
        let structuring_prompt = prompts::build_structuring_prompt(
            &analysis,
            &request.estimation_targets,
            &request.output_schema,
        );
        let model = &self.model;
        let schema = &response_schema;
        let gen_prompt = structuring_prompt.as_str();
        let (structured_data, estimations) = with_retry(self.retry, || async move {
            let text = model.generate(schema, gen_prompt).await?;
            if text.trim().is_empty() {
                return Err(ProviderError::EmptyResponse);
            }
            parse_structuring_response(&text)
        })
        .await
        .map_err(|e| HearingError::StructuredGeneration {
            attempts: e.attempts,
            cause: e.last_error,
        })?;

        // 入库：失败即会话不存在（过期会话已被远端删除）
        let processed_at = chrono::Utc::now().to_rfc3339();
        let payload = json!({
            "interpretedData": structured_data,
            "estimations": estimations,
            "processedAt": processed_at,
        });
        self.sessions
            .append_session_data(&request.session_id, &payload, Some("hearing"))
            .await?;

        tracing::info!("Interpreted data stored for session {}", request.session_id);
        Ok(InterpretedDataResponse {
            success: true,
            session_id: request.session_id,
            structured_data,
            estimations,
            processed_at,
        })
    }
}

/// 解析结构化生成输出：{ structuredData, estimations }，两者缺省或为 null 时取空表
fn parse_structuring_response(
    text: &str,
) -> Result<(Map<String, Value>, BTreeMap<String, Estimation>), ProviderError> {
    let value: Value = serde_json::from_str(text)
        .map_err(|e| ProviderError::Decode(format!("invalid JSON: {}", e)))?;

    let structured_data = match value.get("structuredData") {
        None | Some(Value::Null) => Map::new(),
        Some(Value::Object(map)) => map.clone(),
        Some(other) => {
            return Err(ProviderError::Decode(format!(
                "structuredData must be an object, got: {}",
                other
            )))
        }
    };

    let estimations = match value.get("estimations") {
        None | Some(Value::Null) => BTreeMap::new(),
        Some(v) => serde_json::from_value(v.clone())
            .map_err(|e| ProviderError::Decode(format!("invalid estimations: {}", e)))?,
    };

    Ok((structured_data, estimations))
}
