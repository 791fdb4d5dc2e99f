use ta::indicators::ExponentialMovingAverage;
use ta::Next;

/// ATR (Average True Range)
///
/// True Range 用 span=period 的EMA平滑（等价 pandas `ewm(span=period, adjust=False)`）。
#[derive(Debug, Clone)]
pub struct Atr {
    ema: ExponentialMovingAverage,
    prev_close: Option<f64>,
}

impl Atr {
    pub fn new(period: usize) -> anyhow::Result<Self> {
        Ok(Self {
            ema: ExponentialMovingAverage::new(period)?,
            prev_close: None,
        })
    }

    fn true_range(&self, high: f64, low: f64) -> f64 {
        match self.prev_close {
            Some(prev_close) => {
                let range1 = high - low;
                let range2 = (high - prev_close).abs();
                let range3 = (low - prev_close).abs();
                range1.max(range2).max(range3)
            }
            None => high - low,
        }
    }

    pub fn next(&mut self, high: f64, low: f64, close: f64) -> f64 {
        let tr = self.true_range(high, low);
        let atr = self.ema.next(tr);
        self.prev_close = Some(close);
        atr
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_atr_first_bar_is_high_low_range() {
        let mut atr = Atr::new(10).unwrap();
        assert_relative_eq!(atr.next(12.0, 10.0, 11.0), 2.0);
    }

    #[test]
    fn test_atr_uses_prev_close_gap() {
        let mut atr = Atr::new(1).unwrap();
        atr.next(12.0, 10.0, 11.0);
        // 跳空：TR = max(10.5-10.0, |10.5-11.0|, |10.0-11.0|) = 1.0，period=1时EMA直接取TR
        assert_relative_eq!(atr.next(10.5, 10.0, 10.2), 1.0);
    }

    #[test]
    fn test_atr_constant_range_converges() {
        let mut atr = Atr::new(5).unwrap();
        let mut value = 0.0;
        for _ in 0..50 {
            value = atr.next(11.0, 10.0, 10.5);
        }
        assert_relative_eq!(value, 1.0, epsilon = 1e-9);
    }
}
