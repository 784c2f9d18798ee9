//! 跨实例匹配服务 - 业务能力层
//!
//! 同一套题在不同课程实例里选项顺序可能被打乱。本服务以一门已经
//! 完全解析的课程（模板，位于 sets/ 下）为来源，把答案和图片解析
//! 结果按内容对应关系转移到新抓取的目标课程，全程不发起外部调用。
//!
//! 匹配规则：题干去标签后分桶，桶内取第一个选项内容集合相等的
//! 候选；答案逐字母换算到目标选项顺序并升序排列；解析文本按位置
//! 对应转移并重新打标签。

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use anyhow::{Context, Result};
use regex::Regex;
use tracing::{info, warn};

use crate::models::{Answer, Options, Question, QuestionSet};
use crate::services::answer_store::AnswerStore;
use crate::services::question_store::QuestionStore;

/// 一门课程的匹配统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MatchStats {
    /// 成功转移答案的题数
    pub matched: usize,
    /// 目标题目总数
    pub total: usize,
}

/// 跨实例匹配服务
pub struct MatchingService {
    questions: Arc<QuestionStore>,
    answers: Arc<AnswerStore>,
    tag_re: Regex,
    label_re: Regex,
    letters_re: Regex,
}

impl MatchingService {
    pub fn new(questions: Arc<QuestionStore>, answers: Arc<AnswerStore>) -> Result<Self> {
        Ok(Self {
            questions,
            answers,
            tag_re: Regex::new(r"<[^>]+>").context("编译标签正则失败")?,
            label_re: Regex::new(r"^[A-Za-z][.,、\s]+").context("编译选项标签正则失败")?,
            letters_re: Regex::new(r"^[A-Z]+$").context("编译答案字母正则失败")?,
        })
    }

    /// 把模板课程的答案与解析文本转移到目标课程
    ///
    /// 模板读取 `sets/{course_id}` 下的三个文件，结果写入目标课程的
    /// answers.json 和 plain_questions.json。单题匹配失败只跳过该题。
    ///
    /// # 返回
    /// 成功转移答案的题数与目标题目总数。
    pub fn process_course(&self, course_id: &str) -> Result<MatchStats> {
        let template_id = format!("sets/{}", course_id);

        // ========== 加载模板侧 ==========
        let tpl_set = self.questions.load(&template_id)?;
        if tpl_set.questions.is_empty() {
            warn!("课程 {} 缺少模板题目，跳过匹配", course_id);
            return Ok(MatchStats::default());
        }

        let tpl_plain = self.questions.load_plain(&template_id)?;
        let tpl_plain_by_id: HashMap<&str, &Question> = tpl_plain
            .questions
            .iter()
            .filter_map(|q| q.id.as_deref().map(|id| (id, q)))
            .collect();

        let tpl_answers_by_id: HashMap<String, Answer> = self
            .answers
            .load(&template_id)?
            .answers
            .into_iter()
            .map(|a| (a.id.clone(), a))
            .collect();

        // ========== 加载目标侧 ==========
        let tgt_set = self.questions.load(course_id)?;
        if tgt_set.questions.is_empty() {
            warn!("课程 {} 没有目标题目，跳过匹配", course_id);
            return Ok(MatchStats::default());
        }

        let mut tgt_answers = self.answers.load(course_id)?.answers;
        let mut answer_index: HashMap<String, usize> = tgt_answers
            .iter()
            .enumerate()
            .map(|(i, a)| (a.id.clone(), i))
            .collect();

        let mut tgt_plain = self.questions.load_plain(course_id)?.questions;
        let mut plain_index: HashMap<String, usize> = tgt_plain
            .iter()
            .enumerate()
            .filter_map(|(i, q)| q.id.clone().map(|id| (id, i)))
            .collect();

        // 模板题目按去标签题干分桶
        let mut buckets: HashMap<String, Vec<&Question>> = HashMap::new();
        for q in &tpl_set.questions {
            buckets
                .entry(self.clean_text(&q.title))
                .or_default()
                .push(q);
        }

        let mut stats = MatchStats {
            total: tgt_set.questions.len(),
            ..MatchStats::default()
        };

        for tgt_q in &tgt_set.questions {
            let matched = buckets
                .get(&self.clean_text(&tgt_q.title))
                .and_then(|cands| {
                    cands
                        .iter()
                        .find(|tpl| self.compare_options(tpl, tgt_q))
                        .copied()
                });

            if let (Some(tpl_q), Some(tgt_id)) = (matched, tgt_q.id.as_deref()) {
                if let Some(tpl_id) = tpl_q.id.as_deref() {
                    // 答案转移
                    if let Some(tpl_ans) = tpl_answers_by_id.get(tpl_id) {
                        if let Some(mapped) = self.map_answer(&tpl_ans.answer, tpl_q, tgt_q) {
                            let entry = Answer {
                                id: tgt_id.to_string(),
                                answer: mapped,
                                question_type: tgt_q.question_type,
                            };
                            match answer_index.get(tgt_id) {
                                Some(&i) => tgt_answers[i] = entry,
                                None => {
                                    answer_index.insert(tgt_id.to_string(), tgt_answers.len());
                                    tgt_answers.push(entry);
                                }
                            }
                            stats.matched += 1;
                        }
                    }

                    // 解析文本转移
                    if let Some(tpl_plain_q) = tpl_plain_by_id.get(tpl_id) {
                        let transferred = self.transfer_plain(tpl_q, tpl_plain_q, tgt_q);
                        match plain_index.get(tgt_id) {
                            Some(&i) => tgt_plain[i] = transferred,
                            None => {
                                plain_index.insert(tgt_id.to_string(), tgt_plain.len());
                                tgt_plain.push(transferred);
                            }
                        }
                    }
                }
            }

            // 解析文件必须覆盖每道目标题目，没拿到转移结果的保留原文
            match tgt_q.id.as_deref() {
                Some(id) if plain_index.contains_key(id) => {}
                Some(id) => {
                    plain_index.insert(id.to_string(), tgt_plain.len());
                    tgt_plain.push(tgt_q.clone());
                }
                None => tgt_plain.push(tgt_q.clone()),
            }
        }

        let completed = self
            .answers
            .save(course_id, &tgt_answers, &tgt_set.questions)?;
        self.questions.save_plain(
            course_id,
            &QuestionSet {
                finished: true,
                questions: tgt_plain,
            },
        )?;

        info!(
            "课程 {} 匹配完成: 转移 {}/{} 条答案, completed={}",
            course_id, stats.matched, stats.total, completed
        );
        Ok(stats)
    }

    /// 去掉标记标签并裁剪首尾空白
    fn clean_text(&self, text: &str) -> String {
        self.tag_re.replace_all(text, "").trim().to_string()
    }

    /// 选项的内容部分：去标签、去开头的展示用字母标签
    fn option_content(&self, option: &str) -> String {
        let cleaned = self.clean_text(option);
        self.label_re.replace(&cleaned, "").trim().to_string()
    }

    /// 选项数量相同且内容集合相等视为同一道题
    fn compare_options(&self, tpl: &Question, tgt: &Question) -> bool {
        let tpl_opts = tpl.option_lines();
        let tgt_opts = tgt.option_lines();
        if tpl_opts.len() != tgt_opts.len() {
            return false;
        }

        let tpl_set: HashSet<String> = tpl_opts.iter().map(|o| self.option_content(o)).collect();
        let tgt_set: HashSet<String> = tgt_opts.iter().map(|o| self.option_content(o)).collect();
        tpl_set == tgt_set
    }

    /// 把模板答案换算到目标选项顺序
    ///
    /// 非纯大写字母的答案（填空、判断）原样返回；字母答案逐字符取
    /// 模板选项内容，在目标里找到对应位置标签，升序拼接。任何一个
    /// 字符换算不出来就放弃整条转移，不写出残缺答案。
    fn map_answer(&self, source: &str, tpl: &Question, tgt: &Question) -> Option<String> {
        if source.is_empty() {
            return None;
        }
        if !self.letters_re.is_match(source) {
            return Some(source.to_string());
        }

        let tpl_opts = tpl.option_lines();
        let target_label: HashMap<String, char> = tgt
            .option_lines()
            .iter()
            .enumerate()
            .map(|(i, opt)| (self.option_content(opt), position_label(i)))
            .collect();

        let mut labels = Vec::with_capacity(source.len());
        for ch in source.chars() {
            let idx = (ch as usize) - ('A' as usize);
            let content = self.option_content(tpl_opts.get(idx)?);
            labels.push(*target_label.get(&content)?);
        }
        labels.sort_unstable();
        Some(labels.into_iter().collect())
    }

    /// 生成目标题目的解析版：标题取模板解析结果，选项按位置换算
    fn transfer_plain(&self, tpl_raw: &Question, tpl_plain: &Question, tgt: &Question) -> Question {
        let mut out = tgt.clone();
        out.title = tpl_plain.title.clone();
        out.options = Some(Options::List(
            self.map_parsed_options(tpl_raw, tpl_plain, tgt),
        ));
        out
    }

    /// 按位置对应把模板的解析选项换算到目标顺序
    ///
    /// 原始模板、解析模板、原始目标三方选项数量不一致时位置对应不
    /// 成立，退回模板解析选项原文。目标选项在模板里找不到对应内容
    /// 时保留目标原文，但标签一律按目标位置重打。
    fn map_parsed_options(
        &self,
        tpl_raw: &Question,
        tpl_plain: &Question,
        tgt: &Question,
    ) -> Vec<String> {
        let raw_opts = tpl_raw.option_lines();
        let plain_opts = tpl_plain.option_lines();
        let tgt_opts = tgt.option_lines();

        if raw_opts.len() != plain_opts.len() || raw_opts.len() != tgt_opts.len() {
            return plain_opts;
        }

        let enriched: HashMap<String, &String> = raw_opts
            .iter()
            .zip(plain_opts.iter())
            .map(|(raw, plain)| (self.option_content(raw), plain))
            .collect();

        tgt_opts
            .iter()
            .enumerate()
            .map(|(i, raw)| {
                let text = enriched
                    .get(&self.option_content(raw))
                    .copied()
                    .unwrap_or(raw);
                self.relabel_option(text, position_label(i))
            })
            .collect()
    }

    /// 去掉旧标签，按目标位置重新打标签
    fn relabel_option(&self, text: &str, label: char) -> String {
        format!("{}. {}", label, self.option_content(text))
    }
}

/// 第 i 个选项的位置标签（0 -> A，1 -> B，……）
fn position_label(i: usize) -> char {
    char::from_u32('A' as u32 + i as u32).unwrap_or('?')
}
