//! 重试执行器 - 业务能力层
//!
//! 对任意异步操作做有限次重试，等待时间指数增长并封顶。
//! 不保存任何状态，可以被多个流程同时使用。

use std::future::Future;
use std::time::Duration;

use tokio::time::sleep;
use tracing::{info, warn};

use crate::config::RetryConfig;
use crate::error::{AppError, AppResult};

/// 重试执行器
#[derive(Debug, Clone)]
pub struct RetryExecutor {
    base_delay: Duration,
    max_delay: Duration,
}

impl Default for RetryExecutor {
    fn default() -> Self {
        Self::new(Duration::from_millis(1_000), Duration::from_millis(10_000))
    }
}

impl RetryExecutor {
    pub fn new(base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            base_delay,
            max_delay,
        }
    }

    pub fn from_config(config: &RetryConfig) -> Self {
        Self::new(
            Duration::from_millis(config.base_delay_ms),
            Duration::from_millis(config.max_delay_ms),
        )
    }

    /// 第 `attempt` 次（从 0 开始）失败后的等待: `min(base * 2^attempt, max)`
    pub fn backoff_delay(&self, attempt: usize) -> Duration {
        let factor = 2u32.saturating_pow(attempt.min(u32::MAX as usize) as u32);
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }

    /// 执行 `action`，最多 `max_retries + 1` 次
    ///
    /// # 参数
    /// - `label`: 操作名称，用于日志与最终错误
    /// - `max_retries`: 首次失败后的额外尝试次数
    /// - `action`: 每次调用都产生一个新的 future
    ///
    /// # 返回
    /// 第一次成功的结果；全部失败时返回 `RetryExhausted`，携带最后一次错误
    pub async fn run<T, F, Fut>(&self, label: &str, max_retries: usize, mut action: F) -> AppResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = AppResult<T>>,
    {
        let total = max_retries + 1;
        let mut attempt = 0;

        loop {
            info!("🔁 {} (尝试 {}/{})", label, attempt + 1, total);

            match action().await {
                Ok(value) => return Ok(value),
                Err(e) if attempt < max_retries => {
                    let delay = self.backoff_delay(attempt);
                    warn!(
                        "{} 失败 (尝试 {}/{}): {}，{}ms 后重试",
                        label,
                        attempt + 1,
                        total,
                        e,
                        delay.as_millis()
                    );
                    sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => {
                    warn!("❌ {} 失败 (尝试 {}/{}): {}", label, attempt + 1, total, e);
                    return Err(AppError::RetryExhausted {
                        label: label.to_string(),
                        attempts: total,
                        source: Box::new(e),
                    });
                }
            }
        }
    }
}
