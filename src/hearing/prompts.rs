//! 提示词与响应 schema 构造
//!
//! 推理提示给推理引擎（自由文本分析），结构化提示与 responseSchema 给生成模型。
//! estimations 的 schema 覆盖且 require 全部推定目标，与 outputSchema 是否声明该字段无关。

use serde_json::{json, Map, Value};

use crate::hearing::types::OutputSchema;

/// 推理引擎提示：结合会话上下文解读用户输入，并对目标字段给出推定
pub fn build_agent_prompt(content: &str, estimation_targets: &[String]) -> String {
    format!(
        "你是理财规划问询助手。请结合本会话中已收集的信息，对用户的最新输入做综合解读。\n\n\
         ## 用户输入\n{}\n\n\
         ## 需要推定的字段\n{}\n\n\
         ## 要求\n\
         - 提取输入中明确给出的事实\n\
         - 对每个推定字段，结合会话上下文给出估计值与依据\n\
         - 指出与既有信息矛盾之处（如有）\n\
         请用自然语言输出完整的分析。",
        content,
        estimation_targets.join("、")
    )
}

/// 结构化提示：把推理引擎的分析转换为符合 schema 的 JSON
pub fn build_structuring_prompt(
    analysis: &str,
    estimation_targets: &[String],
    schema: &OutputSchema,
) -> String {
    let fields: Vec<&str> = schema.properties.keys().map(String::as_str).collect();
    format!(
        "以下是对用户理财信息的分析结果，请严格按照给定的 JSON schema 输出结构化数据。\n\n\
         ## 分析结果\n{}\n\n\
         ## 结构化字段\n{}\n\n\
         ## 推定字段\n{}\n\n\
         ## 要求\n\
         - structuredData 只填写分析中有依据的字段\n\
         - estimations 必须覆盖每一个推定字段：value 给出估计值，reasoning 给出依据\n\
         - 只输出 JSON，不要附加说明",
        analysis,
        fields.join("、"),
        estimation_targets.join("、")
    )
}

/// 结构化生成的 responseSchema：{ structuredData: 按 outputSchema, estimations: 按推定目标 }
pub fn structuring_response_schema(schema: &OutputSchema, estimation_targets: &[String]) -> Value {
    let mut structured_props = Map::new();
    for (name, prop) in &schema.properties {
        let mut p = Map::new();
        p.insert("type".to_string(), json!(prop.property_type));
        if let Some(desc) = &prop.description {
            p.insert("description".to_string(), json!(desc));
        }
        structured_props.insert(name.clone(), Value::Object(p));
    }

    let mut estimation_props = Map::new();
    for target in estimation_targets {
        estimation_props.insert(
            target.clone(),
            json!({
                "type": "object",
                "properties": {
                    "value": { "type": "string", "description": "估计值" },
                    "reasoning": { "type": "string", "description": "推定依据" }
                },
                "required": ["value"]
            }),
        );
    }

    json!({
        "type": "object",
        "properties": {
            "structuredData": {
                "type": "object",
                "properties": structured_props,
                "required": schema.required,
            },
            "estimations": {
                "type": "object",
                "properties": estimation_props,
                "required": estimation_targets,
            }
        },
        "required": ["structuredData", "estimations"]
    })
}

/// 一致性检查提示：让推理引擎审视会话中已收集的数据
pub fn build_consistency_prompt() -> String {
    "你是理财规划问询助手。请审视本会话中已收集的全部数据：\n\
     1. 是否存在相互矛盾的信息（如收入与支出明显不符、退休年龄与当前年龄冲突）\n\
     2. 制定理财规划所需的关键信息是否齐备（家庭构成、收入支出、资产负债、退休目标、风险偏好等）\n\
     请用自然语言给出分析：指出矛盾点与缺失项；若信息充分且一致，请明确说明。"
        .to_string()
}

/// 追加问题提示：根据一致性分析产出问题列表（无需追问时输出空列表）
pub fn build_question_prompt(analysis: &str) -> String {
    format!(
        "以下是对当前会话数据的一致性分析，请据此生成需要向用户追加确认的问题。\n\n\
         ## 分析结果\n{}\n\n\
         ## 要求\n\
         - 每个问题只针对一个矛盾点或缺失项\n\
         - 为每个问题选择合适的作答形式（radio / pulldown / numeric / short_text / long_text）\n\
         - 单选或多选题必须给出 options\n\
         - 自由文本且需要 AI 再解读时将 requiresAiInterpretation 设为 true\n\
         - 数据已充分且一致时输出空的 questions 列表\n\
         只输出 JSON。",
        analysis
    )
}

/// 追加问题的 responseSchema
pub fn questions_response_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "questions": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "text": { "type": "string", "description": "问题文本" },
                        "suggestedAnswerCount": {
                            "type": "string",
                            "enum": ["single", "multiple"]
                        },
                        "suggestedAnswerFormat": {
                            "type": "string",
                            "enum": ["radio", "pulldown", "numeric", "short_text", "long_text"]
                        },
                        "requiresAiInterpretation": { "type": "boolean" },
                        "options": { "type": "array", "items": { "type": "string" } }
                    },
                    "required": [
                        "text",
                        "suggestedAnswerCount",
                        "suggestedAnswerFormat",
                        "requiresAiInterpretation"
                    ]
                }
            }
        },
        "required": ["questions"]
    })
}
