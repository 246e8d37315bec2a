//! 单传感器采集流程
//!
//! `0M!` → 静置 → `0D0!` → 静置 → 排空响应 → 解析。
//! 传感器不提供中断，两次静置都是定长等待，采集对调用方而言是同步的。

use crate::bus::Sdi12Bus;
use crate::command::{Command, Sdi12Address};
use crate::error::{AcquisitionError, ParseError};
use crate::response::parse_response;
use domain::{Clock, RawFields};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// 采集时序参数
#[derive(Debug, Clone)]
pub struct AcquisitionTiming {
    /// 发送 `M!` 后的静置时间（覆盖传感器内部转换时间）
    pub measure_settle: Duration,
    /// 发送 `D0!` 后的静置时间
    pub data_settle: Duration,
    /// 单次响应缓冲上限
    pub max_response_len: usize,
}

impl Default for AcquisitionTiming {
    fn default() -> Self {
        Self {
            measure_settle: Duration::from_millis(1000),
            data_settle: Duration::from_millis(1000),
            max_response_len: 128,
        }
    }
}

/// 单次采集结果及其开始时刻
#[derive(Debug)]
pub struct Acquisition {
    pub started_at: Duration,
    pub result: Result<RawFields, AcquisitionError>,
}

/// SDI-12 采集器
pub struct Acquirer<B> {
    bus: B,
    address: Sdi12Address,
    timing: AcquisitionTiming,
    clock: Arc<dyn Clock>,
}

impl<B: Sdi12Bus> Acquirer<B> {
    pub fn new(bus: B, clock: Arc<dyn Clock>, timing: AcquisitionTiming) -> Self {
        Self {
            bus,
            address: Sdi12Address::default(),
            timing,
            clock,
        }
    }

    pub fn bus(&self) -> &B {
        &self.bus
    }

    /// 执行一次完整采集。
    pub async fn acquire(&mut self) -> Acquisition {
        let started_at = self.clock.elapsed();
        let result = self.run_cycle().await;
        Acquisition { started_at, result }
    }

    async fn run_cycle(&mut self) -> Result<RawFields, AcquisitionError> {
        self.bus
            .send_command(Command::StartMeasurement(self.address))
            .await?;
        self.clock.sleep(self.timing.measure_settle).await;

        self.bus
            .send_command(Command::SendData(self.address, 0))
            .await?;
        self.clock.sleep(self.timing.data_settle).await;

        let response = self.drain()?;
        debug!(
            target: "soil.sdi12",
            response = %String::from_utf8_lossy(&response).trim_end(),
            len = response.len(),
            "response_received"
        );
        Ok(parse_response(&response)?)
    }

    /// 排空当前可读字节，直到总线报告无数据。
    ///
    /// 缓冲达到上限时仍有待读字节视为响应过长，整条响应作废。
    fn drain(&mut self) -> Result<Vec<u8>, AcquisitionError> {
        let limit = self.timing.max_response_len;
        let mut buffer = Vec::with_capacity(limit);
        while self.bus.bytes_available()? > 0 {
            if buffer.len() >= limit {
                return Err(ParseError::ResponseTooLong { len: limit }.into());
            }
            match self.bus.read_byte()? {
                Some(byte) => buffer.push(byte),
                None => break,
            }
        }
        Ok(buffer)
    }
}
