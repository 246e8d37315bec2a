//! 串口 SDI-12 适配器
//!
//! 通过 USB/RS-232 SDI-12 转换器访问总线：1200 波特、7 数据位、偶校验、1 停止位。
//! 每条命令前先清空输入缓冲，再发送 break（≥12ms）与 marking（≥8.33ms）。
//!
//! ## 使用示例
//!
//! ```rust,ignore
//! let bus = SerialSdi12Bus::open(&SerialConfig::new("/dev/ttyUSB0"))?;
//! let mut acquirer = Acquirer::new(bus, clock, AcquisitionTiming::default());
//! let raw = acquirer.acquire().await?;
//! ```

use crate::bus::Sdi12Bus;
use crate::command::Command;
use crate::error::Sdi12Error;
use async_trait::async_trait;
use serialport::{ClearBuffer, DataBits, FlowControl, Parity, SerialPort, StopBits};
use std::io::{Read, Write};
use std::time::Duration;
use tracing::debug;

/// break 持续时间
const BREAK_DURATION: Duration = Duration::from_millis(13);
/// break 之后的 marking 时间
const MARKING_DURATION: Duration = Duration::from_millis(9);

/// 串口配置
#[derive(Debug, Clone)]
pub struct SerialConfig {
    /// 设备路径
    pub port: String,
    /// 波特率（SDI-12 固定为 1200）
    pub baud_rate: u32,
    /// 单次读写超时
    pub timeout: Duration,
}

impl SerialConfig {
    pub fn new(port: impl Into<String>) -> Self {
        Self {
            port: port.into(),
            baud_rate: 1200,
            timeout: Duration::from_millis(100),
        }
    }
}

/// 串口 SDI-12 总线
pub struct SerialSdi12Bus {
    port: Box<dyn SerialPort>,
}

impl SerialSdi12Bus {
    /// 打开并配置串口
    pub fn open(config: &SerialConfig) -> Result<Self, Sdi12Error> {
        let port = serialport::new(&config.port, config.baud_rate)
            .data_bits(DataBits::Seven)
            .parity(Parity::Even)
            .stop_bits(StopBits::One)
            .flow_control(FlowControl::None)
            .timeout(config.timeout)
            .open()?;
        debug!(
            target: "soil.sdi12",
            port = %config.port,
            baud_rate = config.baud_rate,
            "serial_port_opened"
        );
        Ok(Self { port })
    }
}

#[async_trait]
impl Sdi12Bus for SerialSdi12Bus {
    async fn send_command(&mut self, command: Command) -> Result<(), Sdi12Error> {
        self.port.clear(ClearBuffer::Input)?;

        self.port.set_break()?;
        tokio::time::sleep(BREAK_DURATION).await;
        self.port.clear_break()?;
        tokio::time::sleep(MARKING_DURATION).await;

        let text = command.to_string();
        self.port.write_all(text.as_bytes())?;
        self.port.flush()?;
        debug!(target: "soil.sdi12", command = %text, "command_sent");
        Ok(())
    }

    fn bytes_available(&mut self) -> Result<usize, Sdi12Error> {
        Ok(self.port.bytes_to_read()? as usize)
    }

    fn read_byte(&mut self) -> Result<Option<u8>, Sdi12Error> {
        let mut byte = [0u8; 1];
        match self.port.read(&mut byte) {
            Ok(1) => Ok(Some(byte[0])),
            Ok(_) => Ok(None),
            Err(err) if err.kind() == std::io::ErrorKind::TimedOut => Ok(None),
            Err(err) => Err(Sdi12Error::Io(err)),
        }
    }
}
