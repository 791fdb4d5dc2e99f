use crate::trading::indicator::atr::Atr;

/// SuperTrend 单bar输出：趋势线数值与方向（1上升 / -1下降）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SuperTrendValue {
    pub value: f64,
    pub direction: i8,
}

/// SuperTrend 指标
///
/// HL2 ± multiplier*ATR 构成基础轨道，轨道按趋势方向继承收紧；
/// 初始方向为下降趋势，趋势线在下降趋势中走上轨、上升趋势中走下轨。
#[derive(Debug, Clone)]
pub struct SuperTrend {
    multiplier: f64,
    atr: Atr,
    prev_upper: f64,
    prev_lower: f64,
    prev_close: f64,
    // 前一根趋势线是否贴在上轨（即处于下降趋势）
    prev_on_upper: bool,
    initialized: bool,
}

impl SuperTrend {
    pub fn new(atr_length: usize, multiplier: f64) -> anyhow::Result<Self> {
        Ok(Self {
            multiplier,
            atr: Atr::new(atr_length)?,
            prev_upper: 0.0,
            prev_lower: 0.0,
            prev_close: 0.0,
            prev_on_upper: true,
            initialized: false,
        })
    }

    pub fn next(&mut self, high: f64, low: f64, close: f64) -> SuperTrendValue {
        let hl2 = (high + low) / 2.0;
        let atr = self.atr.next(high, low, close);
        let basic_upper = hl2 + self.multiplier * atr;
        let basic_lower = hl2 - self.multiplier * atr;

        if !self.initialized {
            self.prev_upper = basic_upper;
            self.prev_lower = basic_lower;
            self.prev_close = close;
            self.prev_on_upper = true;
            self.initialized = true;
            return SuperTrendValue {
                value: basic_upper,
                direction: -1,
            };
        }

        // 轨道继承：只有在基础轨道更严格或价格已突破时才更新
        let upper = if basic_upper < self.prev_upper || self.prev_close > self.prev_upper {
            basic_upper
        } else {
            self.prev_upper
        };
        let lower = if basic_lower > self.prev_lower || self.prev_close < self.prev_lower {
            basic_lower
        } else {
            self.prev_lower
        };

        let (direction, value, on_upper) = if self.prev_on_upper {
            // 下降趋势中，收盘价突破上轨则反转
            if close > upper {
                (1, lower, false)
            } else {
                (-1, upper, true)
            }
        } else {
            // 上升趋势中，收盘价跌破下轨则反转
            if close < lower {
                (-1, upper, true)
            } else {
                (1, lower, false)
            }
        };

        self.prev_upper = upper;
        self.prev_lower = lower;
        self.prev_close = close;
        self.prev_on_upper = on_upper;

        SuperTrendValue { value, direction }
    }
}
