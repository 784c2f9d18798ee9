/// 日志工具模块
///
/// 提供 tracing 初始化与日志格式化的辅助函数
use tracing::info;
use tracing_subscriber::EnvFilter;

/// 初始化全局日志订阅者
///
/// 默认 info 级别，可通过 `RUST_LOG` 环境变量覆盖。
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// 记录程序启动信息
///
/// # 参数
/// - `data_dir`: 数据目录
/// - `llm_ready`: 是否配置了 LLM
pub fn log_startup(data_dir: &str, llm_ready: bool) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 离线题目处理流水线");
    info!("📂 数据目录: {}", data_dir);
    if llm_ready {
        info!("🤖 LLM 已配置，解析与解题阶段启用");
    } else {
        info!("⚠️ 未配置 LLM API Key，仅执行答案迁移阶段");
    }
    info!("{}", "=".repeat(60));
}

/// 打印最终统计信息
///
/// # 参数
/// - `courses`: 处理的课程数
/// - `solved`: 新解出的答案数
/// - `matched`: 迁移的答案数
pub fn print_final_stats(courses: usize, solved: usize, matched: usize) {
    info!("\n{}", "=".repeat(60));
    info!("📊 全部处理完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("✅ 课程: {}", courses);
    info!("✅ 新解答案: {}", solved);
    info!("✅ 迁移答案: {}", matched);
    info!("{}", "=".repeat(60));
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度
///
/// # 返回
/// 返回截断后的文本
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}

/// 取文本末尾若干字符，用于缩短 URL 显示
pub fn tail_text(text: &str, max_len: usize) -> String {
    let total = text.chars().count();
    if total > max_len {
        let skipped: String = text.chars().skip(total - max_len).collect();
        format!("...{}", skipped)
    } else {
        text.to_string()
    }
}
