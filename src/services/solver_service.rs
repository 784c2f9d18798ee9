//! 解题服务 - 业务能力层
//!
//! 只负责"解一道题"的能力：构造提示词、调用推理服务、解码回复。
//! 不出现 Vec<Question>，不关心课程与持久化。

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::clients::LlmClient;
use crate::models::Question;
use crate::utils::logging::truncate_text;

/// 解题能力
#[async_trait]
pub trait QuestionSolver: Send + Sync {
    /// 解一道题
    ///
    /// # 返回
    /// `Ok(None)` 表示调用成功但没有得到可用答案。
    async fn solve(&self, question: &Question) -> Result<Option<String>>;
}

/// 基于 LLM 的解题实现
pub struct LlmSolver {
    client: Arc<LlmClient>,
}

impl LlmSolver {
    pub fn new(client: Arc<LlmClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl QuestionSolver for LlmSolver {
    async fn solve(&self, question: &Question) -> Result<Option<String>> {
        let prompt = build_solve_prompt(question);
        let raw = self.client.chat(&prompt, None).await?;
        Ok(extract_answer(&raw))
    }
}

/// 构造解题提示词
fn build_solve_prompt(question: &Question) -> String {
    format!(
        "You are an expert tutor. Please solve the following question.\n\
         Type: {}\n\
         Question: {}\n\
         Options: {}\n\n\
         Return the answer in JSON format with a single key \"answer\".\n\
         For multiple choice, return the option content (not just A/B/C).\n\
         For completion/judgment, return the text answer.\n\
         Example: {{\"answer\": \"Correct Answer\"}}",
        question.question_type,
        question.title,
        question.options_as_text()
    )
}

#[derive(Debug, Deserialize)]
struct SolverReply {
    #[serde(default)]
    answer: Value,
    #[serde(default)]
    reasoning: Option<String>,
}

/// 从模型回复中提取答案文本
///
/// 优先按 `{"answer": ...}` 解码（answer 可以是字符串或列表）；
/// 解码失败时整段回复按纯文本使用；空回复返回 `None`。
fn extract_answer(raw: &str) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    let body = strip_code_fence(raw);
    match serde_json::from_str::<SolverReply>(body) {
        Ok(reply) => {
            if let Some(reasoning) = &reply.reasoning {
                debug!("模型推理过程: {}", truncate_text(reasoning, 120));
            }
            let text = answer_value_to_text(&reply.answer);
            let text = text.trim();
            if text.is_empty() {
                None
            } else {
                Some(text.to_string())
            }
        }
        Err(_) => {
            warn!(
                "无法按 JSON 解析模型回复，按纯文本处理: {}",
                truncate_text(raw, 80)
            );
            Some(raw.to_string())
        }
    }
}

fn answer_value_to_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect::<Vec<_>>()
            .join(" "),
        other => other.to_string(),
    }
}

/// 剥离 ``` 围栏（模型偶尔会把 JSON 包进代码块）
fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    if let Some(rest) = trimmed.strip_prefix("```") {
        let rest = rest.strip_prefix("json").unwrap_or(rest);
        let rest = rest.trim_start_matches(['\r', '\n']);
        if let Some(body) = rest.strip_suffix("```") {
            return body.trim();
        }
    }
    trimmed
}
