use crate::ContractError;
use domain::Reading;
use std::fmt::Write;

/// 状态报文字段，顺序固定。
pub const STATE_KEYS: [&str; 6] = [
    "vwc_raw",
    "vwc_calibrated",
    "temperature",
    "ec_raw",
    "ec_simple",
    "ec_epsilon",
];

/// 编码状态报文：扁平 JSON 对象，每个数值保留两位小数（`123.40`）。
///
/// serde_json 不保留尾随零，这里手工拼接。无效记录与非有限值拒绝编码。
pub fn encode_state(reading: &Reading) -> Result<String, ContractError> {
    if !reading.valid {
        return Err(ContractError::InvalidReading);
    }
    let values = [
        reading.vwc_raw,
        reading.vwc_calibrated,
        reading.temperature,
        reading.ec_raw,
        reading.ec_simple,
        reading.ec_epsilon,
    ];

    let mut payload = String::with_capacity(160);
    payload.push('{');
    for (index, (key, value)) in STATE_KEYS.into_iter().zip(values).enumerate() {
        if !value.is_finite() {
            return Err(ContractError::NonFinite(key));
        }
        if index > 0 {
            payload.push(',');
        }
        write!(payload, "\"{}\":{:.2}", key, value)
            .map_err(|err| ContractError::Encode(err.to_string()))?;
    }
    payload.push('}');
    Ok(payload)
}
