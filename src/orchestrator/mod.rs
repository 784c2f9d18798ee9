//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责流程调度和全局统计，是整个系统的"指挥中心"。
//!
//! ## 模块划分
//!
//! ### `pipeline` - 流水线调度器
//! - 管理应用生命周期（初始化、运行）
//! - 装配存储与各服务实例
//! - 扫描课程目录与模板目录
//! - 按序推进解析、解题、匹配三个阶段
//! - 输出全局统计信息
//!
//! ### `course_processor` - 单课程处理器
//! - 解析阶段：把一门课程题目里的图片替换为识别文本
//! - 解题阶段：为一门课程缺答案的题目逐一求解
//! - 输出单门课程的统计信息
//!
//! ## 层次关系
//!
//! ```text
//! pipeline (处理 Vec<课程>)
//!     ↓
//! course_processor (处理单门课程)
//!     ↓
//! services (能力层：question_store / image / solver / answer_store / matching)
//!     ↓
//! clients (外部服务客户端：LLM / 图片下载)
//!     ↓
//! infrastructure (基础设施：Storage / LockTable)
//! ```
//!
//! ## 设计原则
//!
//! 1. **单一职责**：pipeline 管批量，course_processor 管单个
//! 2. **资源隔离**：只有编排层装配并持有服务实例
//! 3. **向下依赖**：编排层 → services → clients → infrastructure
//! 4. **无业务逻辑**：只做调度和统计，不做具体业务判断

pub mod course_processor;
pub mod pipeline;

// 重新导出主要类型
pub use pipeline::App;
