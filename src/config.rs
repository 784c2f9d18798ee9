use serde::Deserialize;
use tracing::warn;

/// 程序配置文件
///
/// 读取顺序：config.toml（可选）→ 环境变量覆盖 → 内置默认值。
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// 数据目录（每门课程一个子目录，模板位于 sets/ 下）
    pub data_dir: String,
    // --- LLM 配置 ---
    /// 推理服务密钥，留空时解析与解题阶段停用
    pub llm_api_key: String,
    pub llm_api_base_url: String,
    pub llm_model_name: String,
    pub llm_temperature: f32,
    // --- 节奏控制 ---
    /// 每次解题调用前的固定间隔（毫秒）
    pub solve_interval_ms: u64,
    /// 每次图片识别后的固定间隔（毫秒）
    pub parse_interval_ms: u64,
    /// 图片下载重试次数
    pub download_retry_count: usize,
    /// 图片下载重试间隔（毫秒）
    pub download_retry_delay_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: "data".to_string(),
            llm_api_key: String::new(),
            llm_api_base_url: "https://generativelanguage.googleapis.com/v1beta/openai/".to_string(),
            llm_model_name: "gemini-2.0-flash".to_string(),
            llm_temperature: 0.7,
            solve_interval_ms: 2000,
            parse_interval_ms: 1000,
            download_retry_count: 3,
            download_retry_delay_ms: 1000,
        }
    }
}

impl Config {
    /// 加载配置：先读工作目录下的 config.toml，再用环境变量覆盖
    ///
    /// 文件缺失或解析失败都退回默认配置，不让启动失败。
    pub fn load() -> Self {
        let base = match std::fs::read_to_string("config.toml") {
            Ok(raw) => match toml::from_str(&raw) {
                Ok(config) => config,
                Err(e) => {
                    warn!("config.toml 解析失败，使用默认配置: {}", e);
                    Self::default()
                }
            },
            Err(_) => Self::default(),
        };
        base.apply_env()
    }

    /// 只用环境变量和默认值构建配置
    pub fn from_env() -> Self {
        Self::default().apply_env()
    }

    fn apply_env(self) -> Self {
        Self {
            data_dir: std::env::var("DATA_DIR").unwrap_or(self.data_dir),
            llm_api_key: std::env::var("LLM_API_KEY").unwrap_or(self.llm_api_key),
            llm_api_base_url: std::env::var("LLM_API_BASE_URL").unwrap_or(self.llm_api_base_url),
            llm_model_name: std::env::var("LLM_MODEL_NAME").unwrap_or(self.llm_model_name),
            llm_temperature: std::env::var("LLM_TEMPERATURE").ok().and_then(|v| v.parse().ok()).unwrap_or(self.llm_temperature),
            solve_interval_ms: std::env::var("SOLVE_INTERVAL_MS").ok().and_then(|v| v.parse().ok()).unwrap_or(self.solve_interval_ms),
            parse_interval_ms: std::env::var("PARSE_INTERVAL_MS").ok().and_then(|v| v.parse().ok()).unwrap_or(self.parse_interval_ms),
            download_retry_count: std::env::var("DOWNLOAD_RETRY_COUNT").ok().and_then(|v| v.parse().ok()).unwrap_or(self.download_retry_count),
            download_retry_delay_ms: std::env::var("DOWNLOAD_RETRY_DELAY_MS").ok().and_then(|v| v.parse().ok()).unwrap_or(self.download_retry_delay_ms),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: Config = toml::from_str(r#"data_dir = "course_data""#).unwrap();
        assert_eq!(config.data_dir, "course_data");
        assert_eq!(config.llm_model_name, "gemini-2.0-flash");
        assert_eq!(config.solve_interval_ms, 2000);
        assert!(config.llm_api_key.is_empty());
    }
}
