use serde::{Deserialize, Serialize};

use super::question::QuestionType;

/// 一条已解出的答案
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Answer {
    pub id: String,
    pub answer: String,
    #[serde(default, rename = "type")]
    pub question_type: QuestionType,
}

/// 一门课程的答案文件
///
/// `completed` 是派生字段：每次落盘前按当前题目列表重新计算，
/// 读入时的取值仅供展示，不参与任何判断。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnswerSheet {
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub answers: Vec<Answer>,
}

/// 磁盘上的两种历史格式：裸答案数组（旧版）或带 completed 的对象（现行）
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum AnswerFile {
    Sheet(AnswerSheet),
    Legacy(Vec<Answer>),
}

impl AnswerSheet {
    /// 解析答案文件，新旧格式都接受
    ///
    /// # 返回
    /// 解码失败返回 `None`，由调用方决定如何降级。
    pub fn parse(raw: &str) -> Option<AnswerSheet> {
        match serde_json::from_str::<AnswerFile>(raw) {
            Ok(AnswerFile::Sheet(sheet)) => Some(sheet),
            Ok(AnswerFile::Legacy(answers)) => Some(AnswerSheet {
                completed: false,
                answers,
            }),
            Err(_) => None,
        }
    }
}
