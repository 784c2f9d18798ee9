use serde::{Deserialize, Serialize};

/// 题目类型
///
/// 平台侧的取值固定为小写字符串；未知取值一律归入 `Unknown`，
/// 不因为单个脏字段导致整份文件解码失败。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionType {
    Single,
    Multiple,
    Judgment,
    Completion,
    #[default]
    #[serde(other)]
    Unknown,
}

impl QuestionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionType::Single => "single",
            QuestionType::Multiple => "multiple",
            QuestionType::Judgment => "judgment",
            QuestionType::Completion => "completion",
            QuestionType::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for QuestionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 选项字段的两种线上形态：整块文本（按行分隔）或字符串列表
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Options {
    Text(String),
    List(Vec<String>),
}

/// 单道题目
///
/// 抓取侧可能缺 id（`None`），此类题目只追加、不参与按 id 合并。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    #[serde(
        default,
        deserialize_with = "deserialize_opt_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<String>,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Options>,
    #[serde(default, rename = "type")]
    pub question_type: QuestionType,
}

impl Question {
    /// 将选项展开为行列表
    ///
    /// 文本形态按 `\n` 切分，列表形态原样返回，缺省返回空列表。
    pub fn option_lines(&self) -> Vec<String> {
        match &self.options {
            None => Vec::new(),
            Some(Options::Text(s)) => s.split('\n').map(str::to_string).collect(),
            Some(Options::List(v)) => v.clone(),
        }
    }

    /// 选项拼接为一段文本（用于构造提示词）
    pub fn options_as_text(&self) -> String {
        match &self.options {
            None => String::new(),
            Some(Options::Text(s)) => s.clone(),
            Some(Options::List(v)) => v.join("\n"),
        }
    }
}

/// 一门课程的题目快照
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuestionSet {
    #[serde(default)]
    pub finished: bool,
    #[serde(default)]
    pub questions: Vec<Question>,
}

/// 题目 id 可能是字符串也可能是数字，统一反序列化为字符串
fn deserialize_opt_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::Visitor;
    use std::fmt;

    struct IdVisitor;

    impl<'de> Visitor<'de> for IdVisitor {
        type Value = Option<String>;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a string or integer question id")
        }

        fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(Some(value.to_string()))
        }

        fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(Some(value.to_string()))
        }

        fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(Some(value.to_string()))
        }

        fn visit_unit<E>(self) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(None)
        }
    }

    deserializer.deserialize_any(IdVisitor)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_question_id_accepts_string_and_integer() {
        let q: Question = serde_json::from_str(r#"{"id": "1001", "title": "t"}"#).unwrap();
        assert_eq!(q.id.as_deref(), Some("1001"));

        let q: Question = serde_json::from_str(r#"{"id": 1001, "title": "t"}"#).unwrap();
        assert_eq!(q.id.as_deref(), Some("1001"));

        let q: Question = serde_json::from_str(r#"{"title": "t"}"#).unwrap();
        assert_eq!(q.id, None);

        let q: Question = serde_json::from_str(r#"{"id": null, "title": "t"}"#).unwrap();
        assert_eq!(q.id, None);
    }

    #[test]
    fn test_question_id_serializes_as_string() {
        let q: Question = serde_json::from_str(r#"{"id": 42, "title": "t"}"#).unwrap();
        let json = serde_json::to_string(&q).unwrap();
        assert!(json.contains(r#""id":"42""#));
    }

    #[test]
    fn test_options_both_wire_shapes() {
        let q: Question =
            serde_json::from_str(r#"{"title": "t", "options": "A. 一\nB. 二"}"#).unwrap();
        assert_eq!(q.option_lines(), vec!["A. 一", "B. 二"]);

        let q: Question =
            serde_json::from_str(r#"{"title": "t", "options": ["A. 一", "B. 二"]}"#).unwrap();
        assert_eq!(q.option_lines(), vec!["A. 一", "B. 二"]);

        let q: Question = serde_json::from_str(r#"{"title": "t"}"#).unwrap();
        assert!(q.option_lines().is_empty());
    }

    #[test]
    fn test_unknown_question_type_tolerated() {
        let q: Question =
            serde_json::from_str(r#"{"title": "t", "type": "essay"}"#).unwrap();
        assert_eq!(q.question_type, QuestionType::Unknown);

        let q: Question = serde_json::from_str(r#"{"title": "t", "type": "multiple"}"#).unwrap();
        assert_eq!(q.question_type, QuestionType::Multiple);
    }

    #[test]
    fn test_question_set_defaults() {
        let set: QuestionSet = serde_json::from_str(r#"{}"#).unwrap();
        assert!(!set.finished);
        assert!(set.questions.is_empty());
    }
}
