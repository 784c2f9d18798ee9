//! 图片下载客户端 - 客户端层
//!
//! 只负责"按 URL 取回图片字节"这一件事，重试策略由调用方注入。

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use tracing::debug;

use crate::utils::RetryPolicy;

/// 图片下载能力
#[async_trait]
pub trait ImageFetcher: Send + Sync {
    /// 下载图片，返回原始字节
    async fn fetch(&self, url: &str) -> Result<Vec<u8>>;
}

/// 基于 reqwest 的生产实现
pub struct HttpImageFetcher {
    client: reqwest::Client,
    policy: RetryPolicy,
}

impl HttpImageFetcher {
    /// 创建下载客户端
    ///
    /// # 参数
    /// - `policy`: 重试策略（次数与间隔）
    pub fn new(policy: RetryPolicy) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()?;
        Ok(Self { client, policy })
    }
}

#[async_trait]
impl ImageFetcher for HttpImageFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        let client = &self.client;
        let bytes = self
            .policy
            .run("图片下载", move || async move {
                let response = client.get(url).send().await?;
                if !response.status().is_success() {
                    anyhow::bail!("HTTP 状态码 {}", response.status());
                }
                Ok(response.bytes().await?.to_vec())
            })
            .await?;
        debug!("图片下载完成: {} 字节", bytes.len());
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 测试真实下载
    ///
    /// 运行方式：
    /// ```bash
    /// cargo test test_fetch_live -- --ignored --nocapture
    /// ```
    #[tokio::test]
    #[ignore]
    async fn test_fetch_live() {
        let _ = tracing_subscriber::fmt::try_init();

        let fetcher = HttpImageFetcher::new(RetryPolicy::default()).unwrap();
        let bytes = fetcher
            .fetch("https://upload.wikimedia.org/wikipedia/commons/thumb/3/3a/Cat03.jpg/1200px-Cat03.jpg")
            .await
            .unwrap();
        println!("下载到 {} 字节", bytes.len());
        assert!(!bytes.is_empty());
    }
}
