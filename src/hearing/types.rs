//! 问询接口的请求 / 响应类型
//!
//! 字段在 JSON 线上使用 camelCase，与既有前端契约一致。
//! 校验只发生在进程边界（validate），管线内部默认入参已清洗。

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::hearing::HearingError;
use crate::session::{is_valid_uuid_v4, SessionId};

/// 单字段内容的字符数上限
pub const MAX_CONTENT_LENGTH: usize = 5000;

/// 输出 schema 中的属性描述
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SchemaProperty {
    #[serde(rename = "type")]
    pub property_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// 结构化输出 schema（顶层必须为 object）
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OutputSchema {
    #[serde(rename = "type", default = "object_type")]
    pub schema_type: String,
    pub properties: BTreeMap<String, SchemaProperty>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<String>,
}

fn object_type() -> String {
    "object".to_string()
}

/// 推定值：模型可能返回数字或字符串
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum EstimationValue {
    Number(f64),
    Text(String),
}

/// 对单个目标字段的推定结果
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Estimation {
    pub value: EstimationValue,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,
}

/// 回答数量：单选 / 多选
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnswerCount {
    Single,
    Multiple,
}

/// 回答形式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerFormat {
    Radio,
    Pulldown,
    Numeric,
    ShortText,
    LongText,
}

/// 问题的作答方式
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AnswerMethod {
    pub answer_count: AnswerCount,
    pub answer_format: AnswerFormat,
    /// 自由文本回答是否还需要再走一次解读管线
    pub requires_ai_interpretation: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
}

/// 追加问题（id 为服务端生成的 UUID v4）
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: String,
    pub text: String,
    pub answer_method: AnswerMethod,
}

/// 解读管线请求
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterpretedDataRequest {
    pub user_id: String,
    pub session_id: SessionId,
    /// 用户的自由文本输入（上游已清洗）
    pub content: String,
    /// 需要模型推定的目标字段名
    pub estimation_targets: Vec<String>,
    pub output_schema: OutputSchema,
}

impl InterpretedDataRequest {
    /// 边界校验：在进程边界调用一次
    pub fn validate(&self) -> Result<(), HearingError> {
        let mut issues = Vec::new();
        if self.user_id.trim().is_empty() {
            issues.push("userId must not be empty".to_string());
        }
        if !is_valid_uuid_v4(&self.session_id) {
            issues.push("sessionId must be a UUID v4".to_string());
        }
        if self.content.trim().is_empty() {
            issues.push("content must not be empty".to_string());
        }
        if self.content.chars().count() > MAX_CONTENT_LENGTH {
            issues.push(format!("content exceeds {} characters", MAX_CONTENT_LENGTH));
        }
        if self.estimation_targets.is_empty() {
            issues.push("estimationTargets must not be empty".to_string());
        }
        if self.output_schema.schema_type != "object" {
            issues.push("outputSchema.type must be \"object\"".to_string());
        }
        if issues.is_empty() {
            Ok(())
        } else {
            Err(HearingError::Validation { issues })
        }
    }
}

/// 解读管线响应
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterpretedDataResponse {
    pub success: bool,
    pub session_id: SessionId,
    pub structured_data: Map<String, Value>,
    pub estimations: BTreeMap<String, Estimation>,
    /// RFC 3339 时间戳
    pub processed_at: String,
}

/// 追加问题请求
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdditionalQuestionsRequest {
    pub user_id: String,
    pub session_id: SessionId,
    /// 已完成的追问轮数（0 起）
    pub question_count: u32,
}

impl AdditionalQuestionsRequest {
    pub fn validate(&self) -> Result<(), HearingError> {
        let mut issues = Vec::new();
        if self.user_id.trim().is_empty() {
            issues.push("userId must not be empty".to_string());
        }
        if !is_valid_uuid_v4(&self.session_id) {
            issues.push("sessionId must be a UUID v4".to_string());
        }
        if issues.is_empty() {
            Ok(())
        } else {
            Err(HearingError::Validation { issues })
        }
    }
}

/// 追加问题响应：status 区分继续追问与问询完成
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "status")]
pub enum AdditionalQuestionsResponse {
    /// 仍需向用户追问；question_count 为含本轮的累计轮数
    #[serde(rename = "additional_questions_required", rename_all = "camelCase")]
    AdditionalQuestionsRequired {
        questions: Vec<Question>,
        question_count: u32,
    },
    /// 数据充分或轮数达到上限，问询结束；question_count 保持入参值
    #[serde(rename = "hearing_completed", rename_all = "camelCase")]
    HearingCompleted { question_count: u32 },
}

/// 直接入库请求（跳过模型调用）
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectDataRequest {
    /// 缺省时先创建会话
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<SessionId>,
    pub user_id: String,
    /// 已清洗的键值负载
    pub data: Map<String, Value>,
}

impl DirectDataRequest {
    pub fn validate(&self) -> Result<(), HearingError> {
        let mut issues = Vec::new();
        if self.user_id.trim().is_empty() {
            issues.push("userId must not be empty".to_string());
        }
        if let Some(id) = &self.session_id {
            if !is_valid_uuid_v4(id) {
                issues.push("sessionId must be a UUID v4".to_string());
            }
        }
        if self.data.is_empty() {
            issues.push("data must not be empty".to_string());
        }
        if issues.is_empty() {
            Ok(())
        } else {
            Err(HearingError::Validation { issues })
        }
    }
}

/// 直接入库响应
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectDataResponse {
    pub success: bool,
    pub session_id: SessionId,
    pub stored_at: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn schema() -> OutputSchema {
        let mut properties = BTreeMap::new();
        properties.insert(
            "annual_income".to_string(),
            SchemaProperty {
                property_type: "number".to_string(),
                description: Some("年收入（万元）".to_string()),
            },
        );
        OutputSchema {
            schema_type: "object".to_string(),
            properties,
            required: vec!["annual_income".to_string()],
        }
    }

    #[test]
    fn test_answer_format_wire_names() {
        assert_eq!(
            serde_json::to_value(AnswerFormat::ShortText).unwrap(),
            json!("short_text")
        );
        assert_eq!(
            serde_json::from_value::<AnswerFormat>(json!("long_text")).unwrap(),
            AnswerFormat::LongText
        );
        assert_eq!(
            serde_json::to_value(AnswerCount::Multiple).unwrap(),
            json!("multiple")
        );
    }

    #[test]
    fn test_questions_response_status_tags() {
        let completed = AdditionalQuestionsResponse::HearingCompleted { question_count: 2 };
        assert_eq!(
            serde_json::to_value(&completed).unwrap(),
            json!({ "status": "hearing_completed", "questionCount": 2 })
        );

        let required = AdditionalQuestionsResponse::AdditionalQuestionsRequired {
            questions: vec![],
            question_count: 1,
        };
        let value = serde_json::to_value(&required).unwrap();
        assert_eq!(value["status"], "additional_questions_required");
        assert_eq!(value["questionCount"], 1);
    }

    #[test]
    fn test_question_wire_is_camel_case() {
        let question = Question {
            id: "q1".to_string(),
            text: "预计退休年龄？".to_string(),
            answer_method: AnswerMethod {
                answer_count: AnswerCount::Single,
                answer_format: AnswerFormat::Numeric,
                requires_ai_interpretation: false,
                options: None,
            },
        };
        let value = serde_json::to_value(&question).unwrap();
        assert_eq!(value["answerMethod"]["answerCount"], "single");
        assert_eq!(value["answerMethod"]["answerFormat"], "numeric");
        assert_eq!(value["answerMethod"]["requiresAiInterpretation"], false);
        assert!(value["answerMethod"].get("options").is_none());
    }

    #[test]
    fn test_estimation_value_number_or_text() {
        let n: Estimation = serde_json::from_value(json!({ "value": 60 })).unwrap();
        assert_eq!(n.value, EstimationValue::Number(60.0));
        assert_eq!(n.reasoning, None);

        let t: Estimation =
            serde_json::from_value(json!({ "value": "60岁", "reasoning": "用户提出" })).unwrap();
        assert_eq!(t.value, EstimationValue::Text("60岁".to_string()));
        assert_eq!(t.reasoning.as_deref(), Some("用户提出"));
    }

    #[test]
    fn test_interpret_request_validate_collects_issues() {
        let request = InterpretedDataRequest {
            user_id: " ".to_string(),
            session_id: "not-a-uuid".to_string(),
            content: "x".repeat(MAX_CONTENT_LENGTH + 1),
            estimation_targets: vec![],
            output_schema: OutputSchema {
                schema_type: "array".to_string(),
                properties: BTreeMap::new(),
                required: vec![],
            },
        };
        let err = request.validate().unwrap_err();
        match err {
            HearingError::Validation { issues } => {
                assert_eq!(issues.len(), 5);
            }
            other => panic!("expected Validation, got {:?}", other),
        }
    }

    #[test]
    fn test_interpret_request_validate_accepts_valid() {
        let request = InterpretedDataRequest {
            user_id: "user-1".to_string(),
            session_id: uuid::Uuid::new_v4().to_string(),
            content: "我今年35岁".to_string(),
            estimation_targets: vec!["retirement_age".to_string()],
            output_schema: schema(),
        };
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_direct_request_validate() {
        let mut data = Map::new();
        data.insert("age".to_string(), json!(35));
        let ok = DirectDataRequest {
            session_id: None,
            user_id: "user-1".to_string(),
            data: data.clone(),
        };
        assert!(ok.validate().is_ok());

        let bad = DirectDataRequest {
            session_id: Some("xyz".to_string()),
            user_id: "".to_string(),
            data: Map::new(),
        };
        let err = bad.validate().unwrap_err();
        assert!(matches!(err, HearingError::Validation { issues } if issues.len() == 3));
    }

    #[test]
    fn test_output_schema_deserializes_with_default_type() {
        let value = json!({
            "properties": { "age": { "type": "number" } },
            "required": ["age"]
        });
        let schema: OutputSchema = serde_json::from_value(value).unwrap();
        assert_eq!(schema.schema_type, "object");
        assert_eq!(schema.properties["age"].property_type, "number");
    }
}
