//! 单调时钟与定长等待。
//!
//! 采集静置、重连退避、发现报文间隔都通过 [`Clock`] 等待，
//! 测试中用 [`ManualClock`] 替换，无需真实耗时。

use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// 单调时钟抽象。
#[async_trait]
pub trait Clock: Send + Sync {
    /// 自进程（或时钟）启动以来的时长。
    fn elapsed(&self) -> Duration;

    /// 定长等待；一旦进入必定完整执行。
    async fn sleep(&self, duration: Duration);
}

/// 基于 tokio 的系统时钟。
#[derive(Debug, Clone)]
pub struct SystemClock {
    started_at: tokio::time::Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            started_at: tokio::time::Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Clock for SystemClock {
    fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }

    async fn sleep(&self, duration: Duration) {
        if duration.is_zero() {
            return;
        }
        tokio::time::sleep(duration).await;
    }
}

/// 手动推进的时钟：`sleep` 立即返回并把时间向前推进。
#[derive(Debug, Default)]
pub struct ManualClock {
    now_ms: AtomicU64,
    slept_ms: AtomicU64,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// 不经过 `sleep` 直接推进时间。
    pub fn advance(&self, duration: Duration) {
        self.now_ms
            .fetch_add(duration.as_millis() as u64, Ordering::SeqCst);
    }

    /// 通过 `sleep` 累计等待的总时长。
    pub fn total_slept(&self) -> Duration {
        Duration::from_millis(self.slept_ms.load(Ordering::SeqCst))
    }
}

#[async_trait]
impl Clock for ManualClock {
    fn elapsed(&self) -> Duration {
        Duration::from_millis(self.now_ms.load(Ordering::SeqCst))
    }

    async fn sleep(&self, duration: Duration) {
        let ms = duration.as_millis() as u64;
        self.slept_ms.fetch_add(ms, Ordering::SeqCst);
        self.now_ms.fetch_add(ms, Ordering::SeqCst);
    }
}
