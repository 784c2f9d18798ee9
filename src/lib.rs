//! # Question Solve Transfer
//!
//! 课程题目的离线处理流水线：图片内容解析、自动解题、跨实例答案转移
//!
//! ## 架构设计
//!
//! 本系统采用严格的四层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持久化与并发原语，不含业务语义
//! - `Storage` - 键值持久化接口（get / put / atomic_replace）
//! - `LockTable` - 按课程号粒度的进程内互斥
//!
//! ### ② 外部客户端层（Clients）
//! - `clients/` - 封装对外部服务的调用，只暴露能力
//! - `LlmClient` - OpenAI 兼容接口的对话与图片识别调用
//! - `HttpImageFetcher` - 带重试的图片下载
//! - `LlmImageExtractor` - 图片转文本
//!
//! ### ③ 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，每个服务管一类数据
//! - `QuestionStore` - 题目快照的合并与落盘
//! - `ImageTextService` - 图片引用到识别文本的全局缓存
//! - `LlmSolver` - 单题求解
//! - `AnswerStore` - 答案的断点续跑与完成度推导
//! - `MatchingService` - 跨实例答案与解析文本转移
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/pipeline` - 装配组件，按序推进三个阶段
//! - `orchestrator/course_processor` - 单门课程的解析与解题
//!
//! ## 模块结构

pub mod clients;
pub mod config;
pub mod error;
pub mod infrastructure;

pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;

// 重新导出常用类型
pub use config::Config;
pub use error::{StoreError, StoreResult};
pub use infrastructure::{FileStorage, LockTable, MemoryStorage, Storage};
pub use models::{Answer, AnswerSheet, Options, Question, QuestionSet, QuestionType};
pub use orchestrator::App;
pub use services::{
    AnswerStore, ImageTextService, LlmSolver, MatchStats, MatchingService, QuestionStore,
    SolveStats, UpsertStats,
};
