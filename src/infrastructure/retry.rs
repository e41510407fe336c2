//! 重试策略 - 基础设施层
//!
//! 有限次数 + 指数退避 + 取消信号，所有外部调用都经过这里

use crate::config::Config;
use crate::error::{AppError, AppResult};
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::warn;

/// 重试策略
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// 最多尝试次数（包含第一次）
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, initial_backoff: Duration, max_backoff: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            initial_backoff,
            max_backoff,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.max_attempts,
            Duration::from_millis(config.initial_backoff_ms),
            Duration::from_millis(config.max_backoff_ms),
        )
    }

    /// 第 `attempt` 次失败后（从 1 开始）的等待时间
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.initial_backoff
            .saturating_mul(factor)
            .min(self.max_backoff)
    }

    /// 执行操作，可重试的错误按退避时间重试
    ///
    /// # 参数
    /// - `operation`: 操作名称（用于日志和错误信息）
    /// - `cancel`: 取消信号，请求进行中和等待期间都会响应
    /// - `call`: 单次尝试
    ///
    /// # 返回
    /// 次数用尽时返回 `Transport`，取消时返回 `Cancelled`
    pub async fn run<T, F, Fut>(
        &self,
        operation: &str,
        cancel: &CancellationToken,
        mut call: F,
    ) -> AppResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = AppResult<T>>,
    {
        let mut attempt = 0;
        loop {
            if cancel.is_cancelled() {
                return Err(AppError::cancelled(operation));
            }
            attempt += 1;

            let result = tokio::select! {
                _ = cancel.cancelled() => return Err(AppError::cancelled(operation)),
                result = call() => result,
            };

            let err = match result {
                Ok(value) => return Ok(value),
                Err(e) if !e.is_retryable() => return Err(e),
                Err(e) => e,
            };

            if attempt >= self.max_attempts {
                return Err(AppError::Transport {
                    operation: operation.to_string(),
                    attempts: attempt,
                    source: Box::new(err),
                });
            }

            let wait = self.backoff(attempt);
            warn!(
                "{} 失败 (尝试 {}/{}): {}，{} 毫秒后重试...",
                operation,
                attempt,
                self.max_attempts,
                err,
                wait.as_millis()
            );

            tokio::select! {
                _ = cancel.cancelled() => return Err(AppError::cancelled(operation)),
                _ = sleep(wait) => {}
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(8, Duration::from_millis(500), Duration::from_secs(30))
    }
}
