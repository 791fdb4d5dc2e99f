/// Wilder 平滑均线
///
/// 等价于 pandas 的 `ewm(alpha=1/period, adjust=False)`：
/// 第一个值直接作为初始值，之后按 (value + (period-1)*prev) / period 递推。
#[derive(Debug, Clone)]
pub struct Rma {
    period: usize,
    current: Option<f64>,
}

impl Rma {
    pub fn new(period: usize) -> Self {
        Self {
            period: period.max(1),
            current: None,
        }
    }

    pub fn next(&mut self, value: f64) -> f64 {
        let new_value = match self.current {
            None => value,
            Some(prev) => (value + (self.period as f64 - 1.0) * prev) / self.period as f64,
        };
        self.current = Some(new_value);
        new_value
    }

    pub fn reset(&mut self) {
        self.current = None;
    }
}
