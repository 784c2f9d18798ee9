//! 单课程处理器 - 编排层
//!
//! ## 职责
//!
//! 本模块按课程推进流水线的前两个阶段：
//!
//! 1. **解析阶段** `parse_course`：把题目里内嵌的图片替换为识别出的
//!    文本，产物写入 plain_questions.json
//! 2. **解题阶段** `solve_course`：对缺答案的题目逐一调用推理服务，
//!    产物写入 answers.json
//!
//! 两个阶段都可以随时中断：每个成果立即落盘，重跑只补缺口。

use anyhow::Result;
use tracing::{error, info, warn};

use crate::services::solver_service::QuestionSolver;
use crate::services::{AnswerStore, ImageTextService, QuestionStore, SolveStats};

/// 解析一门课程题目里的图片内容
///
/// 只处理已标记采集完成的课程；解析结果整体写入 plain_questions.json。
///
/// # 返回
/// 实际被改写的题目数。
pub async fn parse_course(
    questions: &QuestionStore,
    images: &ImageTextService,
    course_id: &str,
) -> Result<usize> {
    let set = questions.load(course_id)?;
    if !set.finished {
        warn!("课程 {} 尚未标记采集完成，跳过解析", course_id);
        return Ok(0);
    }
    if set.questions.is_empty() {
        info!("课程 {} 没有题目，跳过解析", course_id);
        return Ok(0);
    }

    info!(
        "开始解析课程 {} 的图片内容，共 {} 题",
        course_id,
        set.questions.len()
    );

    let mut plain = set.clone();
    let mut changed = 0usize;
    for question in plain.questions.iter_mut() {
        if images.enrich_question(question).await {
            changed += 1;
        }
    }

    // 没有图片的题目原样进入解析产物，下游只读这一份文件
    questions.save_plain(course_id, &plain)?;
    info!("课程 {} 解析完成: {} 题被改写", course_id, changed);
    Ok(changed)
}

/// 为一门课程推导缺失的答案
///
/// 以解析产物为输入；缺少解析文件时直接返回并提示先运行解析阶段。
pub async fn solve_course(
    questions: &QuestionStore,
    answers: &AnswerStore,
    solver: &dyn QuestionSolver,
    course_id: &str,
) -> Result<SolveStats> {
    let plain = questions.load_plain(course_id)?;
    if plain.questions.is_empty() {
        error!(
            "课程 {} 缺少解析产物 plain_questions.json，请先运行解析阶段",
            course_id
        );
        return Ok(SolveStats::default());
    }

    answers
        .get_or_solve(course_id, &plain.questions, solver)
        .await
}
