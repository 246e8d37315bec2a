//! SDI-12 错误类型定义

/// 总线通信错误
#[derive(Debug, thiserror::Error)]
pub enum Sdi12Error {
    /// IO 错误
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// 串口错误
    #[error("serial error: {0}")]
    Serial(String),
}

impl From<serialport::Error> for Sdi12Error {
    fn from(err: serialport::Error) -> Self {
        Sdi12Error::Serial(err.to_string())
    }
}

/// 数据响应解析错误
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    /// 响应长度不足（不超过 1 字节，仅有地址回显或为空）
    #[error("response too short: {len} bytes")]
    ResponseTooShort { len: usize },

    /// 字段分隔符数量不对
    #[error("expected {} field separators, found {found}", crate::response::EXPECTED_FIELDS)]
    FieldCount { found: usize },

    /// 缓冲已满仍有待读字节，响应被截断
    #[error("response exceeds {len} bytes")]
    ResponseTooLong { len: usize },
}

/// 单次采集失败
#[derive(Debug, thiserror::Error)]
pub enum AcquisitionError {
    #[error("bus error: {0}")]
    Bus(#[from] Sdi12Error),

    #[error("parse error: {0}")]
    Parse(#[from] ParseError),
}
