//! 流水线调度 - 编排层
//!
//! ## 职责
//!
//! 本模块是整个应用的入口，负责装配各层组件并按序推进三个阶段。
//!
//! ## 核心功能
//!
//! 1. **应用初始化**：建立存储、装配服务；未配置推理服务密钥时
//!    自动降级为仅匹配模式
//! 2. **课程扫描**：遍历数据目录下的课程目录（模板目录 sets 除外）
//! 3. **阶段推进**：对每门课程依次运行解析、解题；随后对每个有
//!    对应目标课程的模板运行匹配
//! 4. **全局统计**：汇总解题与匹配结果
//!
//! ## 设计特点
//!
//! - **资源所有者**：唯一持有存储与各服务实例的模块
//! - **单阶段失败不中断**：某门课程某个阶段出错只记日志，继续下一项
//! - **向下委托**：课程级细节交给 course_processor 与各服务

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{error, info, warn};

use crate::clients::{HttpImageFetcher, LlmClient, LlmImageExtractor};
use crate::config::Config;
use crate::infrastructure::{FileStorage, Storage};
use crate::orchestrator::course_processor;
use crate::services::{
    AnswerStore, ImageTextService, LlmSolver, MatchingService, QuestionStore,
};
use crate::utils::logging;
use crate::utils::RetryPolicy;

/// 应用主结构
pub struct App {
    config: Config,
    questions: Arc<QuestionStore>,
    answers: Arc<AnswerStore>,
    images: Option<Arc<ImageTextService>>,
    solver: Option<Arc<LlmSolver>>,
    matcher: MatchingService,
}

impl App {
    /// 初始化应用
    ///
    /// 未配置 LLM_API_KEY 时解析、解题两个阶段停用，只保留匹配阶段，
    /// 匹配不依赖任何外部服务。
    pub async fn initialize(config: Config) -> Result<Self> {
        let storage: Arc<dyn Storage> = Arc::new(FileStorage::new(&config.data_dir));
        let questions = Arc::new(QuestionStore::new(storage.clone()));
        let answers = Arc::new(AnswerStore::new(
            storage.clone(),
            Duration::from_millis(config.solve_interval_ms),
        ));

        let (images, solver) = if config.llm_api_key.is_empty() {
            warn!("⚠️ 未配置 LLM_API_KEY，解析与解题阶段停用");
            (None, None)
        } else {
            let client = Arc::new(LlmClient::new(&config));
            let fetcher = Arc::new(HttpImageFetcher::new(RetryPolicy::new(
                config.download_retry_count,
                Duration::from_millis(config.download_retry_delay_ms),
            ))?);
            let extractor = Arc::new(LlmImageExtractor::new(client.clone()));
            let images = ImageTextService::new(
                storage.clone(),
                fetcher,
                extractor,
                Duration::from_millis(config.parse_interval_ms),
            )?;
            (
                Some(Arc::new(images)),
                Some(Arc::new(LlmSolver::new(client))),
            )
        };

        let matcher = MatchingService::new(questions.clone(), answers.clone())?;

        Ok(Self {
            config,
            questions,
            answers,
            images,
            solver,
            matcher,
        })
    }

    /// 运行流水线主逻辑
    pub async fn run(&self) -> Result<()> {
        logging::log_startup(&self.config.data_dir, self.solver.is_some());

        let courses = self.scan_courses().await?;
        if courses.is_empty() {
            warn!("⚠️ 数据目录下没有课程，程序结束");
            return Ok(());
        }
        info!("✓ 找到 {} 门课程", courses.len());

        // ========== 解析 + 解题 ==========
        let mut solved = 0usize;
        for course_id in &courses {
            if let Some(images) = &self.images {
                if let Err(e) =
                    course_processor::parse_course(&self.questions, images, course_id).await
                {
                    error!("课程 {} 解析阶段失败: {}", course_id, e);
                }
            }

            if let Some(solver) = &self.solver {
                match course_processor::solve_course(
                    &self.questions,
                    &self.answers,
                    solver.as_ref(),
                    course_id,
                )
                .await
                {
                    Ok(stats) => solved += stats.solved,
                    Err(e) => error!("课程 {} 解题阶段失败: {}", course_id, e),
                }
            }
        }

        // ========== 跨实例匹配 ==========
        let mut matched = 0usize;
        for course_id in self.scan_templates(&courses).await? {
            match self.matcher.process_course(&course_id) {
                Ok(stats) => matched += stats.matched,
                Err(e) => error!("课程 {} 匹配阶段失败: {}", course_id, e),
            }
        }

        logging::print_final_stats(courses.len(), solved, matched);
        Ok(())
    }

    /// 扫描数据目录下的课程目录（模板目录 sets 除外）
    async fn scan_courses(&self) -> Result<Vec<String>> {
        let dir = Path::new(&self.config.data_dir);
        if !dir.is_dir() {
            return Ok(Vec::new());
        }

        let mut courses = Vec::new();
        let mut entries = tokio::fs::read_dir(dir).await.context("读取数据目录失败")?;
        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_dir() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().to_string();
            if name != "sets" {
                courses.push(name);
            }
        }

        courses.sort();
        Ok(courses)
    }

    /// 扫描模板目录，只保留目标课程同样存在的课程号
    async fn scan_templates(&self, courses: &[String]) -> Result<Vec<String>> {
        let sets_dir = Path::new(&self.config.data_dir).join("sets");
        if !sets_dir.is_dir() {
            info!("没有模板目录，跳过匹配阶段");
            return Ok(Vec::new());
        }

        let known: HashSet<&str> = courses.iter().map(String::as_str).collect();
        let mut templates = Vec::new();
        let mut entries = tokio::fs::read_dir(&sets_dir)
            .await
            .context("读取模板目录失败")?;
        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_dir() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().to_string();
            if known.contains(name.as_str()) {
                templates.push(name);
            }
        }

        templates.sort();
        Ok(templates)
    }
}
