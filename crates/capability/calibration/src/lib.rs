//! 厂家标定多项式：原始计数 → 体积含水量 / 电导率。
//!
//! 纯函数，无状态、无 I/O、无失败路径。

use domain::{RawFields, Reading};
use std::time::Duration;

/// 三次多项式 `a3·x³ + a2·x² + a1·x + a0`。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cubic {
    pub a3: f64,
    pub a2: f64,
    pub a1: f64,
    pub a0: f64,
}

impl Cubic {
    /// Horner 求值；有限输入只会得到有限值或同号无穷，不会出现 `inf - inf`。
    pub fn eval(&self, x: f64) -> f64 {
        ((self.a3 * x + self.a2) * x + self.a1) * x + self.a0
    }
}

/// 基质（非土壤）体积含水量多项式，结果为 m³/m³。
pub const VWC_SOILLESS: Cubic = Cubic {
    a3: 6.771e-10,
    a2: -5.105e-6,
    a1: 1.302e-2,
    a0: -10.848,
};

/// 介电常数中间项多项式，平方后得到 ec_epsilon。
pub const EC_PERMITTIVITY: Cubic = Cubic {
    a3: 2.887e-9,
    a2: -2.080e-5,
    a1: 5.276e-2,
    a0: -43.39,
};

/// ec_simple 的固定换算系数。
pub const EC_SIMPLE_DIVISOR: f64 = 500.0;

/// 体积含水量百分比，钳位到 [0, 100]。
pub fn vwc(raw: f64) -> f64 {
    let percent = VWC_SOILLESS.eval(raw) * 100.0;
    if percent.is_nan() {
        return 0.0;
    }
    percent.clamp(0.0, 100.0)
}

/// 线性近似电导率：`raw_ec / 500`。
pub fn ec_simple(raw_ec: f64) -> f64 {
    raw_ec / EC_SIMPLE_DIVISOR
}

/// 介电常数项的平方，恒非负。
pub fn ec_epsilon(raw: f64) -> f64 {
    let permittivity = EC_PERMITTIVITY.eval(raw);
    if permittivity.is_nan() {
        return 0.0;
    }
    permittivity * permittivity
}

/// 由原始字段构造有效记录。
///
/// ec_epsilon 的输入是 VWC 通道的原始计数，而不是 EC 通道。
pub fn calibrate(raw: RawFields, timestamp: Duration) -> Reading {
    Reading {
        vwc_raw: raw.vwc_raw,
        vwc_calibrated: vwc(raw.vwc_raw),
        temperature: raw.temperature,
        ec_raw: raw.ec_raw,
        ec_simple: ec_simple(raw.ec_raw),
        ec_epsilon: ec_epsilon(raw.vwc_raw),
        valid: true,
        timestamp,
    }
}
