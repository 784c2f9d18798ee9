//! 答案存储 - 业务能力层
//!
//! 维护每门课程的 answers.json：
//! - 断点续跑：已有答案的题目不再请求推理服务
//! - 每得到一条新答案立即整体落盘
//! - `completed` 在每次落盘前按当前题目列表重新推导

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{error, info, warn};

use crate::infrastructure::{LockTable, Storage};
use crate::models::{Answer, AnswerSheet, Question};
use crate::services::solver_service::QuestionSolver;
use crate::utils::logging::truncate_text;

/// 一轮解题的统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SolveStats {
    pub solved: usize,
    pub failed: usize,
    pub total: usize,
}

/// 答案存储
pub struct AnswerStore {
    storage: Arc<dyn Storage>,
    locks: LockTable,
    interval: Duration,
}

impl AnswerStore {
    /// # 参数
    /// - `interval`: 每次推理调用前的固定间隔
    pub fn new(storage: Arc<dyn Storage>, interval: Duration) -> Self {
        Self {
            storage,
            locks: LockTable::new(),
            interval,
        }
    }

    fn answers_key(course_id: &str) -> String {
        format!("{}/answers.json", course_id)
    }

    /// 读取课程答案，旧版裸列表与现行格式都接受
    ///
    /// 缺失或损坏时返回空答案表。
    pub fn load(&self, course_id: &str) -> Result<AnswerSheet> {
        let key = Self::answers_key(course_id);
        match self.storage.get(&key)? {
            None => Ok(AnswerSheet::default()),
            Some(raw) => match AnswerSheet::parse(&raw) {
                Some(sheet) => Ok(sheet),
                None => {
                    error!("答案文件损坏，按空表处理 ({})", key);
                    Ok(AnswerSheet::default())
                }
            },
        }
    }

    /// 落盘答案，`completed` 按题目列表重新推导
    ///
    /// # 返回
    /// 推导出的 `completed` 值。
    pub fn save(
        &self,
        course_id: &str,
        answers: &[Answer],
        questions: &[Question],
    ) -> Result<bool> {
        let completed = recompute_completed(questions, answers);
        let sheet = AnswerSheet {
            completed,
            answers: answers.to_vec(),
        };
        let json = serde_json::to_string_pretty(&sheet).context("序列化答案失败")?;

        let lock = self.locks.acquire(course_id);
        let _guard = lock.lock().unwrap();
        self.storage.atomic_replace(&Self::answers_key(course_id), &json)?;
        Ok(completed)
    }

    /// 为缺答案的题目逐一求解
    ///
    /// 已有答案的题目直接跳过；每次调用推理服务前等待固定间隔；
    /// 单题失败只记日志，继续后面的题目。
    pub async fn get_or_solve(
        &self,
        course_id: &str,
        questions: &[Question],
        solver: &dyn QuestionSolver,
    ) -> Result<SolveStats> {
        let sheet = self.load(course_id)?;
        let mut answers = sheet.answers;
        let mut have: HashSet<String> = answers.iter().map(|a| a.id.clone()).collect();

        let mut stats = SolveStats {
            total: questions.len(),
            ..SolveStats::default()
        };

        info!(
            "开始解题: 课程 {}，共 {} 题，已有 {} 条答案",
            course_id,
            questions.len(),
            answers.len()
        );

        for q in questions {
            let Some(id) = q.id.as_deref() else { continue };
            if have.contains(id) {
                continue;
            }

            // 固定间隔，避免触发频率限制
            tokio::time::sleep(self.interval).await;

            match solver.solve(q).await {
                Ok(Some(text)) if !text.trim().is_empty() => {
                    info!("✓ 解出题目 {}: {}", id, truncate_text(&text, 50));
                    answers.push(Answer {
                        id: id.to_string(),
                        answer: text,
                        question_type: q.question_type,
                    });
                    have.insert(id.to_string());
                    stats.solved += 1;

                    if let Err(e) = self.save(course_id, &answers, questions) {
                        error!("保存答案失败 ({}): {}", course_id, e);
                    }
                }
                Ok(_) => {
                    warn!("题目 {} 未得到可用答案", id);
                    stats.failed += 1;
                }
                Err(e) => {
                    error!("解题失败 {}: {}", id, e);
                    stats.failed += 1;
                }
            }
        }

        info!(
            "解题完成: 新增 {} 条，失败 {} 条，答案总数 {}",
            stats.solved,
            stats.failed,
            answers.len()
        );
        Ok(stats)
    }
}

/// 每道有 id 的题目都有对应答案时视为完成（空课程按完成处理）
fn recompute_completed(questions: &[Question], answers: &[Answer]) -> bool {
    let have: HashSet<&str> = answers.iter().map(|a| a.id.as_str()).collect();
    questions
        .iter()
        .filter_map(|q| q.id.as_deref())
        .all(|id| have.contains(id))
}
