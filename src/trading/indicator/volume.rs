/// 量能比率指标
///
/// 当前成交量与最近N根（含当前）成交量均值的比值，
/// 放量/缩量阈值的判断留给信号层。
#[derive(Debug, Clone)]
pub struct VolumeRatioIndicator {
    window: Vec<f64>,
    period: usize,
}

impl VolumeRatioIndicator {
    pub fn new(period: usize) -> Self {
        Self {
            window: Vec::with_capacity(period),
            period: period.max(1),
        }
    }

    pub fn next(&mut self, volume: f64) -> f64 {
        self.window.push(volume);
        if self.window.len() > self.period {
            self.window.remove(0);
        }
        let avg = self.window.iter().sum::<f64>() / self.window.len() as f64;
        if avg > 0.0 {
            volume / avg
        } else {
            1.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_volume_ratio_constant_volume() {
        let mut indicator = VolumeRatioIndicator::new(5);
        let mut ratio = 0.0;
        for _ in 0..10 {
            ratio = indicator.next(1000.0);
        }
        assert_relative_eq!(ratio, 1.0);
    }

    #[test]
    fn test_volume_ratio_spike() {
        let mut indicator = VolumeRatioIndicator::new(5);
        for _ in 0..5 {
            indicator.next(1000.0);
        }
        // 窗口变为 [1000,1000,1000,1000,5000]，均值1800
        let ratio = indicator.next(5000.0);
        assert_relative_eq!(ratio, 5000.0 / 1800.0);
        assert!(ratio > 1.5);
    }

    #[test]
    fn test_volume_ratio_zero_average() {
        let mut indicator = VolumeRatioIndicator::new(3);
        assert_relative_eq!(indicator.next(0.0), 1.0);
    }
}
