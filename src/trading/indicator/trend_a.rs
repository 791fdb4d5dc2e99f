use ta::indicators::ExponentialMovingAverage;
use ta::Next;

use crate::trading::market::Bar;

/// Trend Indicator A-V2 单bar输出
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrendAValue {
    /// 趋势强度：100 * (haClose - haOpen) / (haHigh - haLow)
    pub strength: f64,
    /// 1 上升趋势 / -1 下降趋势
    pub direction: i8,
}

/// Trend Indicator A-V2（平滑 Heikin Ashi 云）
///
/// Heikin Ashi 四价各自做一级EMA平滑后计算实体占比作为趋势强度。
#[derive(Debug, Clone)]
pub struct TrendA {
    ema_open: ExponentialMovingAverage,
    ema_close: ExponentialMovingAverage,
    ema_high: ExponentialMovingAverage,
    ema_low: ExponentialMovingAverage,
    prev_ha: Option<(f64, f64)>, // (ha_open, ha_close)
}

impl TrendA {
    pub fn new(ma_period: usize) -> anyhow::Result<Self> {
        Ok(Self {
            ema_open: ExponentialMovingAverage::new(ma_period)?,
            ema_close: ExponentialMovingAverage::new(ma_period)?,
            ema_high: ExponentialMovingAverage::new(ma_period)?,
            ema_low: ExponentialMovingAverage::new(ma_period)?,
            prev_ha: None,
        })
    }

    pub fn next(&mut self, bar: &Bar) -> TrendAValue {
        let ha_close = (bar.open + bar.high + bar.low + bar.close) / 4.0;
        let ha_open = match self.prev_ha {
            Some((prev_open, prev_close)) => (prev_open + prev_close) / 2.0,
            None => (bar.open + bar.close) / 2.0,
        };
        let ha_high = bar.high.max(ha_open).max(ha_close);
        let ha_low = bar.low.min(ha_open).min(ha_close);
        self.prev_ha = Some((ha_open, ha_close));

        let smoothed_open = self.ema_open.next(ha_open);
        let smoothed_close = self.ema_close.next(ha_close);
        let smoothed_high = self.ema_high.next(ha_high);
        let smoothed_low = self.ema_low.next(ha_low);

        let strength =
            100.0 * (smoothed_close - smoothed_open) / (smoothed_high - smoothed_low + 1e-9);
        TrendAValue {
            strength,
            direction: if strength > 0.0 { 1 } else { -1 },
        }
    }
}
