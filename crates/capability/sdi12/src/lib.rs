//! # SDI-12 采集能力模块
//!
//! 单传感器、单地址（`0`）的半双工请求/响应协议：
//! - **命令**：`0M!` 启动测量，`0D0!` 读取数据
//! - **解析**：去掉地址回显后按 `+` 切分三个数值字段
//! - **总线**：串口适配器与脚本化总线
//!
//! ## 架构设计
//!
//! ```text
//! Publisher（定时触发）
//!       │
//!       ▼
//! Acquirer ── Clock（定长静置）
//!       │
//!       ├── SerialSdi12Bus
//!       └── ScriptedBus
//!       │
//!       ▼
//! parse_response → RawFields
//! ```

mod acquire;
mod bus;
mod command;
mod error;
mod response;
mod serial;

pub use acquire::{Acquirer, Acquisition, AcquisitionTiming};
pub use bus::{ScriptedBus, Sdi12Bus};
pub use command::{Command, Sdi12Address};
pub use error::{AcquisitionError, ParseError, Sdi12Error};
pub use response::{EXPECTED_FIELDS, FIELD_SEPARATOR, Fields, fields, parse_decimal, parse_response};
pub use serial::{SerialConfig, SerialSdi12Bus};
