use crate::trading::indicator::rma::Rma;

/// Wilder RSI
///
/// 涨跌幅拆分后分别做 Wilder 平滑，rs = avg_gain / (avg_loss + 1e-9)。
/// 第一根K线没有前收盘价，涨跌幅按0处理。
#[derive(Debug, Clone)]
pub struct Rsi {
    avg_gain: Rma,
    avg_loss: Rma,
    prev_close: Option<f64>,
}

impl Rsi {
    pub fn new(period: usize) -> Self {
        Self {
            avg_gain: Rma::new(period),
            avg_loss: Rma::new(period),
            prev_close: None,
        }
    }

    pub fn next(&mut self, close: f64) -> f64 {
        let delta = match self.prev_close {
            Some(prev) => close - prev,
            None => 0.0,
        };
        self.prev_close = Some(close);

        let gain = if delta > 0.0 { delta } else { 0.0 };
        let loss = if delta < 0.0 { -delta } else { 0.0 };

        let avg_gain = self.avg_gain.next(gain);
        let avg_loss = self.avg_loss.next(loss);

        let rs = avg_gain / (avg_loss + 1e-9);
        100.0 - (100.0 / (1.0 + rs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rsi_all_gains_approaches_100() {
        let mut rsi = Rsi::new(6);
        let mut value = 0.0;
        for i in 1..=30 {
            value = rsi.next(100.0 + i as f64);
        }
        assert!(value > 99.0, "单边上涨RSI应接近100，实际{}", value);
    }

    #[test]
    fn test_rsi_all_losses_approaches_0() {
        let mut rsi = Rsi::new(6);
        let mut value = 50.0;
        for i in 1..=30 {
            value = rsi.next(100.0 - i as f64);
        }
        assert!(value < 1.0, "单边下跌RSI应接近0，实际{}", value);
    }

    #[test]
    fn test_rsi_flat_series() {
        let mut rsi = Rsi::new(6);
        let mut value = 0.0;
        for _ in 0..10 {
            value = rsi.next(100.0);
        }
        // 无涨无跌时 rs = 0
        assert!(value < 1e-6);
    }
}
