//! SDI-12 地址与命令

use std::fmt;

/// 传感器地址；总线上只挂一个传感器，固定为 `0`。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sdi12Address(char);

impl Default for Sdi12Address {
    fn default() -> Self {
        Self('0')
    }
}

impl fmt::Display for Sdi12Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 采集所用的命令
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// `aM!` 启动测量
    StartMeasurement(Sdi12Address),
    /// `aDn!` 读取第 n 组数据
    SendData(Sdi12Address, u8),
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::StartMeasurement(address) => write!(f, "{}M!", address),
            Command::SendData(address, index) => write!(f, "{}D{}!", address, index),
        }
    }
}
