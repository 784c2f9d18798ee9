//! 题目存储 - 业务能力层
//!
//! 负责每门课程题目快照的合并写入与读取：
//! - 按 id 去重合并，内容变化才替换
//! - 只有实际新增/更新时才落盘
//! - 同一课程的写入由进程内锁串行化，文件本身原子替换

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{debug, error, info};

use crate::infrastructure::{LockTable, Storage};
use crate::models::{Question, QuestionSet};

/// 一次合并写入的统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpsertStats {
    pub added: usize,
    pub updated: usize,
}

impl UpsertStats {
    pub fn changed(&self) -> bool {
        self.added > 0 || self.updated > 0
    }
}

/// 题目存储
pub struct QuestionStore {
    storage: Arc<dyn Storage>,
    locks: LockTable,
}

impl QuestionStore {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self {
            storage,
            locks: LockTable::new(),
        }
    }

    fn questions_key(course_id: &str) -> String {
        format!("{}/questions.json", course_id)
    }

    fn plain_key(course_id: &str) -> String {
        format!("{}/plain_questions.json", course_id)
    }

    /// 合并一批抓取到的题目
    ///
    /// 已有 id 且 title/type/options 任一不同时整条替换（位置不变）；
    /// 新 id 追加；缺 id 的题目一律追加，不参与合并。
    ///
    /// # 返回
    /// 新增与更新的条数；两者皆零时不产生任何写入。
    pub fn upsert(&self, course_id: &str, questions: &[Question]) -> Result<UpsertStats> {
        let mut stats = UpsertStats::default();
        if questions.is_empty() {
            return Ok(stats);
        }

        let lock = self.locks.acquire(course_id);
        let _guard = lock.lock().unwrap();

        let key = Self::questions_key(course_id);
        let mut set = self.read_set(&key)?;

        let mut id_to_index: HashMap<String, usize> = set
            .questions
            .iter()
            .enumerate()
            .filter_map(|(i, q)| q.id.clone().map(|id| (id, i)))
            .collect();

        for q in questions {
            match &q.id {
                None => {
                    set.questions.push(q.clone());
                    stats.added += 1;
                }
                Some(id) => {
                    if let Some(&idx) = id_to_index.get(id) {
                        let existing = &set.questions[idx];
                        let changed = existing.title != q.title
                            || existing.question_type != q.question_type
                            || existing.options != q.options;
                        if changed {
                            set.questions[idx] = q.clone();
                            stats.updated += 1;
                            debug!("题目 {} 内容变化，已替换", id);
                        }
                    } else {
                        id_to_index.insert(id.clone(), set.questions.len());
                        set.questions.push(q.clone());
                        stats.added += 1;
                    }
                }
            }
        }

        if stats.changed() {
            self.write_set(&key, &set)?;
            info!(
                "课程 {} 保存题目: 新增 {}, 更新 {}",
                course_id, stats.added, stats.updated
            );
        }
        Ok(stats)
    }

    /// 标记课程采集完成
    ///
    /// 只在第一次调用时改写文件，重复调用不产生写入。
    pub fn mark_finished(&self, course_id: &str) -> Result<()> {
        let lock = self.locks.acquire(course_id);
        let _guard = lock.lock().unwrap();

        let key = Self::questions_key(course_id);
        let mut set = self.read_set(&key)?;

        if !set.finished {
            set.finished = true;
            self.write_set(&key, &set)?;
            info!("课程 {} 已标记采集完成", course_id);
        } else {
            info!("课程 {} 此前已标记完成", course_id);
        }
        Ok(())
    }

    /// 读取课程题目快照，缺失或损坏时返回空默认值
    pub fn load(&self, course_id: &str) -> Result<QuestionSet> {
        self.read_set(&Self::questions_key(course_id))
    }

    /// 读取解析后的题目（plain_questions.json）
    pub fn load_plain(&self, course_id: &str) -> Result<QuestionSet> {
        self.read_set(&Self::plain_key(course_id))
    }

    /// 写入解析后的题目
    pub fn save_plain(&self, course_id: &str, set: &QuestionSet) -> Result<()> {
        let lock = self.locks.acquire(course_id);
        let _guard = lock.lock().unwrap();
        self.write_set(&Self::plain_key(course_id), set)
    }

    fn read_set(&self, key: &str) -> Result<QuestionSet> {
        match self.storage.get(key)? {
            None => Ok(QuestionSet::default()),
            Some(raw) => match serde_json::from_str(&raw) {
                Ok(set) => Ok(set),
                Err(e) => {
                    error!("题目文件损坏，按空集处理 ({}): {}", key, e);
                    Ok(QuestionSet::default())
                }
            },
        }
    }

    fn write_set(&self, key: &str, set: &QuestionSet) -> Result<()> {
        let json = serde_json::to_string_pretty(set).context("序列化题目失败")?;
        self.storage.atomic_replace(key, &json)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::MemoryStorage;
    use crate::models::{Options, QuestionType};

    fn make_store() -> (Arc<dyn Storage>, QuestionStore) {
        let storage: Arc<dyn Storage> = Arc::new(MemoryStorage::new());
        let store = QuestionStore::new(storage.clone());
        (storage, store)
    }

    fn question(id: &str, title: &str, options: &str) -> Question {
        Question {
            id: Some(id.to_string()),
            title: title.to_string(),
            options: Some(Options::Text(options.to_string())),
            question_type: QuestionType::Single,
        }
    }

    #[test]
    fn test_upsert_is_idempotent() {
        let (storage, store) = make_store();
        let qs = vec![
            question("1", "第一题", "A. 甲\nB. 乙"),
            question("2", "第二题", "A. 对\nB. 错"),
        ];

        let stats = store.upsert("2001", &qs).unwrap();
        assert_eq!(stats, UpsertStats { added: 2, updated: 0 });
        let snapshot = storage.get("2001/questions.json").unwrap().unwrap();

        // 相同输入再来一遍：无变化、文件不动
        let stats = store.upsert("2001", &qs).unwrap();
        assert_eq!(stats, UpsertStats::default());
        assert_eq!(
            storage.get("2001/questions.json").unwrap().unwrap(),
            snapshot
        );
    }

    #[test]
    fn test_upsert_replaces_on_each_tracked_field() {
        let (_, store) = make_store();
        store
            .upsert("2001", &[question("1", "原标题", "A. 甲\nB. 乙")])
            .unwrap();

        // title 变化
        let stats = store
            .upsert("2001", &[question("1", "新标题", "A. 甲\nB. 乙")])
            .unwrap();
        assert_eq!(stats, UpsertStats { added: 0, updated: 1 });

        // options 变化
        let stats = store
            .upsert("2001", &[question("1", "新标题", "A. 甲\nB. 丙")])
            .unwrap();
        assert_eq!(stats, UpsertStats { added: 0, updated: 1 });

        // type 变化
        let mut q = question("1", "新标题", "A. 甲\nB. 丙");
        q.question_type = QuestionType::Multiple;
        let stats = store.upsert("2001", &[q]).unwrap();
        assert_eq!(stats, UpsertStats { added: 0, updated: 1 });

        // 文本形态与列表形态的选项按结构比较，行内容相同也算变化
        let mut q = question("1", "新标题", "");
        q.options = Some(Options::List(vec!["A. 甲".into(), "B. 丙".into()]));
        q.question_type = QuestionType::Multiple;
        let stats = store.upsert("2001", &[q]).unwrap();
        assert_eq!(stats, UpsertStats { added: 0, updated: 1 });
    }

    #[test]
    fn test_update_keeps_position() {
        let (_, store) = make_store();
        store
            .upsert(
                "2001",
                &[
                    question("1", "第一题", "A"),
                    question("2", "第二题", "B"),
                    question("3", "第三题", "C"),
                ],
            )
            .unwrap();

        store.upsert("2001", &[question("2", "改过的第二题", "B")]).unwrap();

        let set = store.load("2001").unwrap();
        let ids: Vec<_> = set.questions.iter().map(|q| q.id.clone().unwrap()).collect();
        assert_eq!(ids, vec!["1", "2", "3"]);
        assert_eq!(set.questions[1].title, "改过的第二题");
    }

    #[test]
    fn test_missing_id_always_appended() {
        let (_, store) = make_store();
        let anonymous = Question {
            id: None,
            title: "没有 id 的题".to_string(),
            options: None,
            question_type: QuestionType::Completion,
        };

        store.upsert("2001", &[anonymous.clone()]).unwrap();
        let stats = store.upsert("2001", &[anonymous]).unwrap();
        assert_eq!(stats, UpsertStats { added: 1, updated: 0 });
        assert_eq!(store.load("2001").unwrap().questions.len(), 2);
    }

    #[test]
    fn test_mark_finished_writes_once() {
        let (storage, store) = make_store();
        store.upsert("2001", &[question("1", "题", "A")]).unwrap();

        store.mark_finished("2001").unwrap();
        assert!(store.load("2001").unwrap().finished);
        let snapshot = storage.get("2001/questions.json").unwrap().unwrap();

        store.mark_finished("2001").unwrap();
        assert_eq!(
            storage.get("2001/questions.json").unwrap().unwrap(),
            snapshot
        );
    }

    #[test]
    fn test_corrupt_file_treated_as_empty() {
        let (storage, store) = make_store();
        storage.put("2001/questions.json", "{ 这不是 json").unwrap();

        let set = store.load("2001").unwrap();
        assert_eq!(set, QuestionSet::default());

        // 之后的合并照常工作并覆盖损坏内容
        let stats = store.upsert("2001", &[question("1", "题", "A")]).unwrap();
        assert_eq!(stats, UpsertStats { added: 1, updated: 0 });
        assert_eq!(store.load("2001").unwrap().questions.len(), 1);
    }

    #[test]
    fn test_plain_round_trip() {
        let (_, store) = make_store();
        let set = QuestionSet {
            finished: true,
            questions: vec![question("1", "解析后的题", "A. 甲")],
        };
        store.save_plain("2001", &set).unwrap();
        assert_eq!(store.load_plain("2001").unwrap(), set);
        // 与 questions.json 互不影响
        assert_eq!(store.load("2001").unwrap(), QuestionSet::default());
    }
}
