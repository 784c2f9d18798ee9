use std::future::Future;
use std::time::Duration;

use anyhow::{anyhow, Result};
use tokio::time::sleep;
use tracing::warn;

/// 有界重试策略
///
/// 次数与间隔由调用方注入，测试时把间隔设为零即可免等待。
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: usize,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: usize, delay: Duration) -> Self {
        Self {
            max_attempts,
            delay,
        }
    }

    /// 重复执行一个异步操作直到成功或次数耗尽
    ///
    /// # 参数
    /// - `what`: 操作名称，用于日志
    /// - `op`: 待执行的操作
    ///
    /// # 返回
    /// 最后一次失败的错误
    pub async fn run<T, F, Fut>(&self, what: &str, mut op: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut last_err = None;
        for attempt in 1..=self.max_attempts {
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) => {
                    warn!("{} 失败 (尝试 {}/{}): {}", what, attempt, self.max_attempts, e);
                    last_err = Some(e);
                    if attempt < self.max_attempts {
                        sleep(self.delay).await;
                    }
                }
            }
        }
        Err(last_err.unwrap_or_else(|| anyhow!("{} 失败: 重试次数为 0", what)))
    }
}
