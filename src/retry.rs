//! 指数退避重试执行器
//!
//! with_retry 按 RetryPolicy 执行异步操作：失败后等待 initial_delay_ms * backoff_multiplier^k 再试，
//! 共 max_retries + 1 次尝试；全部失败时返回 RetryError（保留最后一次错误与实际尝试次数）。
//! 执行器不理解错误语义，是否值得重试由调用方决定包不包这一层。

use std::fmt;
use std::future::Future;
use std::time::Duration;

/// 重试策略：重试次数上限、首次退避毫秒数、退避倍率
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// 首次尝试之外的重试次数（0 表示只试一次）
    pub max_retries: u32,
    /// 第一次重试前的等待毫秒数
    pub initial_delay_ms: u64,
    /// 每次重试后等待时间的放大倍率（>= 1.0）
    pub backoff_multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            initial_delay_ms: 1000,
            backoff_multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32, initial_delay_ms: u64, backoff_multiplier: f64) -> Self {
        Self {
            max_retries,
            initial_delay_ms,
            backoff_multiplier,
        }
    }

    /// 总尝试次数 = 首次 + 重试
    pub fn total_attempts(&self) -> u32 {
        self.max_retries + 1
    }

    /// 第 retry_index 次重试前的等待时长（0 起）：initial * multiplier^retry_index
    pub fn delay_for(&self, retry_index: u32) -> Duration {
        let ms = self.initial_delay_ms as f64 * self.backoff_multiplier.powi(retry_index as i32);
        Duration::from_millis(ms as u64)
    }
}

/// 重试耗尽：attempts 为实际尝试次数（max_retries + 1），last_error 为最后一次失败原因
#[derive(Debug, Clone, PartialEq)]
pub struct RetryError<E> {
    pub attempts: u32,
    pub last_error: E,
}

impl<E: fmt::Display> fmt::Display for RetryError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "operation failed after {} attempts: {}",
            self.attempts, self.last_error
        )
    }
}

impl<E: fmt::Display + fmt::Debug> std::error::Error for RetryError<E> {}

/// 按策略重试异步操作
///
/// 成功立即返回，不再等待；失败后以 tokio::time::sleep 挂起（不阻塞线程、不持锁），
/// 间隔按倍率增长；全部尝试失败返回 RetryError。
pub async fn with_retry<T, E, F, Fut>(
    policy: RetryPolicy,
    mut operation: F,
) -> Result<T, RetryError<E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: fmt::Display,
{
    let total = policy.total_attempts();
    let mut attempt: u32 = 0;
    loop {
        attempt += 1;
        match operation().await {
            Ok(value) => return Ok(value),
            Err(e) => {
                if attempt >= total {
                    tracing::warn!("All {} attempts failed: {}", attempt, e);
                    return Err(RetryError {
                        attempts: attempt,
                        last_error: e,
                    });
                }
                let delay = policy.delay_for(attempt - 1);
                tracing::warn!(
                    "Attempt {}/{} failed: {}, retrying in {}ms",
                    attempt,
                    total,
                    e,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn fast_policy(max_retries: u32) -> RetryPolicy {
        RetryPolicy::new(max_retries, 1, 2.0)
    }

    #[tokio::test]
    async fn test_success_first_attempt_single_call() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = calls.clone();
        let result: Result<u32, RetryError<String>> = with_retry(fast_policy(2), move || {
            let c = c.clone();
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Ok(42)
            }
        })
        .await;
        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_success_after_two_failures() {
        // 失败两次后第三次成功：恰好 3 次调用，返回成功值
        let calls = Arc::new(AtomicU32::new(0));
        let c = calls.clone();
        let result = with_retry(fast_policy(2), move || {
            let c = c.clone();
            async move {
                let n = c.fetch_add(1, Ordering::SeqCst) + 1;
                if n < 3 {
                    Err(format!("boom {}", n))
                } else {
                    Ok(n)
                }
            }
        })
        .await;
        assert_eq!(result.unwrap(), 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_exhaustion_reports_attempts_and_last_error() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = calls.clone();
        let result: Result<(), RetryError<String>> = with_retry(fast_policy(2), move || {
            let c = c.clone();
            async move {
                let n = c.fetch_add(1, Ordering::SeqCst) + 1;
                Err(format!("failure {}", n))
            }
        })
        .await;
        let err = result.unwrap_err();
        assert_eq!(err.attempts, 3);
        assert_eq!(err.last_error, "failure 3");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_zero_retries_single_attempt() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = calls.clone();
        let result: Result<(), RetryError<String>> = with_retry(fast_policy(0), move || {
            let c = c.clone();
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Err("nope".to_string())
            }
        })
        .await;
        assert_eq!(result.unwrap_err().attempts, 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_delay_sequence_doubles_from_initial() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_for(0), Duration::from_millis(1000));
        assert_eq!(policy.delay_for(1), Duration::from_millis(2000));
        assert_eq!(policy.delay_for(2), Duration::from_millis(4000));
    }

    #[test]
    fn test_delay_strictly_increasing_for_multiplier_above_one() {
        let policy = RetryPolicy::new(5, 250, 1.5);
        let mut prev = policy.delay_for(0);
        for k in 1..5 {
            let d = policy.delay_for(k);
            assert!(d > prev, "delay must grow: {:?} -> {:?}", prev, d);
            prev = d;
        }
    }

    #[test]
    fn test_constant_delay_for_multiplier_one() {
        let policy = RetryPolicy::new(3, 500, 1.0);
        assert_eq!(policy.delay_for(0), Duration::from_millis(500));
        assert_eq!(policy.delay_for(2), Duration::from_millis(500));
    }

    #[test]
    fn test_total_attempts() {
        assert_eq!(RetryPolicy::default().total_attempts(), 3);
        assert_eq!(RetryPolicy::new(0, 1, 2.0).total_attempts(), 1);
    }

    #[test]
    fn test_retry_error_display_mentions_attempts() {
        let err = RetryError {
            attempts: 3,
            last_error: "timeout".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("3 attempts"));
        assert!(msg.contains("timeout"));
    }
}
