//! 图片文本提取客户端 - 客户端层
//!
//! 把图片内容转成纯文本（含公式的转 LaTeX），由 Vision 模型完成。

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;

use super::llm_client::LlmClient;

const EXTRACT_PROMPT: &str = "Identify the content of this image. \
If it contains mathematical formulas, convert them to LaTeX format. \
Return only the plain text result. Do not modify any content within the image, \
including the original language (e.g., Chinese).";

/// 图片文本提取能力
#[async_trait]
pub trait ImageTextExtractor: Send + Sync {
    /// 提取图片中的文本内容
    async fn extract(&self, image: &[u8]) -> Result<String>;
}

/// 基于 Vision 模型的生产实现
pub struct LlmImageExtractor {
    client: Arc<LlmClient>,
}

impl LlmImageExtractor {
    pub fn new(client: Arc<LlmClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ImageTextExtractor for LlmImageExtractor {
    async fn extract(&self, image: &[u8]) -> Result<String> {
        self.client.chat_with_image(EXTRACT_PROMPT, image).await
    }
}
