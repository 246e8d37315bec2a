//! 数据响应解析
//!
//! 响应格式：`<地址><+值><+值><+值>\r\n`，例如 `0+123.4+25.6+789.0\r\n`。
//! 去掉地址回显后按 `+` 切分，恰好 3 个分隔符才视为有效。

use crate::error::ParseError;
use domain::RawFields;

/// 字段分隔符
pub const FIELD_SEPARATOR: char = '+';

/// 单次采集期望的字段数量
pub const EXPECTED_FIELDS: usize = 3;

/// `+` 分隔字段的惰性迭代器，每个分隔符产出其后的一个字段。
///
/// 第一个分隔符之前的内容被丢弃。
#[derive(Debug, Clone)]
pub struct Fields<'a> {
    inner: std::str::Split<'a, char>,
}

impl<'a> Iterator for Fields<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }
}

/// 切分去掉地址后的响应体。
pub fn fields(body: &str) -> Fields<'_> {
    let mut inner = body.split(FIELD_SEPARATOR);
    inner.next();
    Fields { inner }
}

/// 解析原始响应字节。
pub fn parse_response(response: &[u8]) -> Result<RawFields, ParseError> {
    if response.len() <= 1 {
        return Err(ParseError::ResponseTooShort {
            len: response.len(),
        });
    }
    let body = String::from_utf8_lossy(&response[1..]);
    let parts: Vec<&str> = fields(&body).collect();
    if parts.len() != EXPECTED_FIELDS {
        return Err(ParseError::FieldCount { found: parts.len() });
    }
    Ok(RawFields {
        vwc_raw: parse_decimal(parts[0]),
        temperature: parse_decimal(parts[1]),
        ec_raw: parse_decimal(parts[2]),
    })
}

/// 与区域设置无关的宽松十进制解析。
///
/// 取去除空白后最长的数值前缀；没有数值前缀时返回 0（与真实的 0 读数无法区分）。
pub fn parse_decimal(text: &str) -> f64 {
    let text = text.trim();
    let end = text
        .char_indices()
        .find(|(_, c)| !matches!(c, '0'..='9' | '+' | '-' | '.' | 'e' | 'E'))
        .map(|(index, _)| index)
        .unwrap_or(text.len());
    let candidate = &text[..end];
    for len in (1..=candidate.len()).rev() {
        if let Ok(value) = candidate[..len].parse::<f64>() {
            return if value.is_finite() { value } else { 0.0 };
        }
    }
    0.0
}
