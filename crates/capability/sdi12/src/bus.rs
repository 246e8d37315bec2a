//! SDI-12 总线抽象
//!
//! 半双工：发送命令后由传感器异步回送字符，调用方按需排空。

use crate::command::Command;
use crate::error::Sdi12Error;
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};

/// 字节级 SDI-12 总线
#[async_trait]
pub trait Sdi12Bus: Send {
    /// 发送命令（适配器负责 break / marking 时序）
    async fn send_command(&mut self, command: Command) -> Result<(), Sdi12Error>;

    /// 当前待读取的字节数
    fn bytes_available(&mut self) -> Result<usize, Sdi12Error>;

    /// 读取一个字节；没有数据时返回 `None`
    fn read_byte(&mut self) -> Result<Option<u8>, Sdi12Error>;
}

/// 脚本化总线：按命令文本回放预置响应，用于测试与无硬件运行。
#[derive(Debug, Default)]
pub struct ScriptedBus {
    queued: HashMap<String, VecDeque<Vec<u8>>>,
    sticky: HashMap<String, Vec<u8>>,
    pending: VecDeque<u8>,
    sent: Vec<String>,
    fail_next_send: Option<String>,
}

impl ScriptedBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// 典型读数：测量应答 `00013` 与一组基质读数。
    pub fn demo() -> Self {
        let address = Default::default();
        Self::new()
            .with_reply(Command::StartMeasurement(address), "00013\r\n")
            .with_reply(Command::SendData(address, 0), "0+1975.3+22.4+412.0\r\n")
    }

    /// 每次收到该命令都回送同一响应。
    pub fn with_reply(mut self, command: Command, reply: impl Into<Vec<u8>>) -> Self {
        self.sticky.insert(command.to_string(), reply.into());
        self
    }

    /// 只回送一次的响应，优先于固定响应。
    pub fn push_reply(&mut self, command: Command, reply: impl Into<Vec<u8>>) {
        self.queued
            .entry(command.to_string())
            .or_default()
            .push_back(reply.into());
    }

    /// 下一次发送返回串口错误。
    pub fn fail_next_send(&mut self, message: impl Into<String>) {
        self.fail_next_send = Some(message.into());
    }

    /// 已发送的命令文本（按顺序）。
    pub fn sent(&self) -> &[String] {
        &self.sent
    }
}

#[async_trait]
impl Sdi12Bus for ScriptedBus {
    async fn send_command(&mut self, command: Command) -> Result<(), Sdi12Error> {
        if let Some(message) = self.fail_next_send.take() {
            return Err(Sdi12Error::Serial(message));
        }
        let text = command.to_string();
        self.pending.clear();
        let reply = self
            .queued
            .get_mut(&text)
            .and_then(VecDeque::pop_front)
            .or_else(|| self.sticky.get(&text).cloned());
        if let Some(reply) = reply {
            self.pending.extend(reply);
        }
        self.sent.push(text);
        Ok(())
    }

    fn bytes_available(&mut self) -> Result<usize, Sdi12Error> {
        Ok(self.pending.len())
    }

    fn read_byte(&mut self) -> Result<Option<u8>, Sdi12Error> {
        Ok(self.pending.pop_front())
    }
}
