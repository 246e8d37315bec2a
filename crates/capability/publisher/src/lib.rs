//! # 定时发布能力模块
//!
//! 单一控制循环：保持连接 → 传输维护 → 到期则采集、标定并发布一条状态报文 → 固定停顿。
//! 连接状态、发布计数、上次发布时刻都由 [`Publisher`] 独占，周期之间不重叠。

use domain::{Clock, Reading};
use soil_calibration::calibrate;
use soil_link::{LinkError, LinkManager, MqttTransport};
use soil_sdi12::{Acquirer, Sdi12Bus};
use soil_telemetry::{
    record_acquisition, record_acquisition_failure, record_publish_failure,
    record_reading_published,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::{info, warn};

/// 发布节奏。
#[derive(Debug, Clone)]
pub struct PublishTiming {
    /// 两次采集之间的间隔（首次采集在启动后一个间隔）。
    pub interval: Duration,
    /// 每轮循环末尾的停顿。
    pub loop_pause: Duration,
}

impl Default for PublishTiming {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(10_000),
            loop_pause: Duration::from_millis(100),
        }
    }
}

/// 单个采集周期的结果。
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    /// 已发布的有效读数。
    Published(Reading),
    /// 采集失败，记录被置零，不发布。
    InvalidReading(Reading),
    /// 读数有效但发布失败，计数不变，本周期不重试。
    PublishFailed(Reading),
}

/// 发布驱动。
pub struct Publisher<B, T> {
    acquirer: Acquirer<B>,
    link: LinkManager<T>,
    clock: Arc<dyn Clock>,
    timing: PublishTiming,
    last_publish: Duration,
    readings_published: u64,
}

impl<B: Sdi12Bus, T: MqttTransport> Publisher<B, T> {
    pub fn new(
        acquirer: Acquirer<B>,
        link: LinkManager<T>,
        clock: Arc<dyn Clock>,
        timing: PublishTiming,
    ) -> Self {
        Self {
            acquirer,
            link,
            clock,
            timing,
            last_publish: Duration::ZERO,
            readings_published: 0,
        }
    }

    /// 成功发布的读数数量。
    pub fn readings_published(&self) -> u64 {
        self.readings_published
    }

    pub fn last_publish(&self) -> Duration {
        self.last_publish
    }

    pub fn link(&self) -> &LinkManager<T> {
        &self.link
    }

    pub fn link_mut(&mut self) -> &mut LinkManager<T> {
        &mut self.link
    }

    /// 一轮控制循环；到期执行采集时返回该周期结果。
    pub async fn step(&mut self) -> Option<TickOutcome> {
        if !self.link.is_connected() {
            self.link.ensure_connected().await;
        }
        self.link.service().await;
        // 维护期间发现断线，先恢复连接再采集
        if !self.link.is_connected() {
            self.link.ensure_connected().await;
        }

        let now = self.clock.elapsed();
        let outcome = if now.saturating_sub(self.last_publish) >= self.timing.interval {
            self.last_publish = now;
            Some(self.tick().await)
        } else {
            None
        };

        self.clock.sleep(self.timing.loop_pause).await;
        outcome
    }

    /// 一次采集 + 发布。
    pub async fn tick(&mut self) -> TickOutcome {
        record_acquisition();
        let acquisition = self.acquirer.acquire().await;
        let reading = match acquisition.result {
            Ok(raw) => calibrate(raw, acquisition.started_at),
            Err(err) => {
                record_acquisition_failure();
                warn!(
                    target: "soil.publisher",
                    error = %err,
                    started_at_ms = acquisition.started_at.as_millis() as u64,
                    "acquisition_failed"
                );
                return TickOutcome::InvalidReading(Reading::invalid(acquisition.started_at));
            }
        };

        match self.link.publish_state(&reading).await {
            Ok(()) => {
                self.readings_published += 1;
                record_reading_published();
                info!(
                    target: "soil.publisher",
                    readings_published = self.readings_published,
                    vwc_raw = reading.vwc_raw,
                    vwc_calibrated = reading.vwc_calibrated,
                    temperature = reading.temperature,
                    ec_raw = reading.ec_raw,
                    ec_simple = reading.ec_simple,
                    ec_epsilon = reading.ec_epsilon,
                    "state_published"
                );
                TickOutcome::Published(reading)
            }
            Err(err) => {
                record_publish_failure();
                let kind = match &err {
                    LinkError::Transport(_) => "transport",
                    LinkError::Contract(_) => "encode",
                };
                warn!(
                    target: "soil.publisher",
                    error = %err,
                    kind = kind,
                    link_state = self.link.state().as_str(),
                    "state_publish_failed"
                );
                TickOutcome::PublishFailed(reading)
            }
        }
    }

    /// 循环执行 [`Self::step`] 直到收到退出标记；标记只在两轮之间检查。
    pub async fn run(&mut self, shutdown: &AtomicBool) {
        info!(
            target: "soil.publisher",
            interval_ms = self.timing.interval.as_millis() as u64,
            loop_pause_ms = self.timing.loop_pause.as_millis() as u64,
            "publisher_started"
        );
        while !shutdown.load(Ordering::SeqCst) {
            self.step().await;
        }
        info!(
            target: "soil.publisher",
            readings_published = self.readings_published,
            "publisher_stopped"
        );
    }

    /// 退出：发布离线标记并断开连接。
    pub async fn shutdown(&mut self) -> Result<(), LinkError> {
        self.link.shutdown().await
    }
}
