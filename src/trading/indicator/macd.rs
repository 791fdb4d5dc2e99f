use ta::indicators::MovingAverageConvergenceDivergence;
use ta::Next;

/// MACD 单bar输出（DIF/DEA）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MacdValue {
    pub dif: f64,
    pub dea: f64,
}

/// 按收盘价序列批量计算MACD
pub fn calculate_macd(
    closes: &[f64],
    fast_period: usize,
    slow_period: usize,
    signal_period: usize,
) -> anyhow::Result<Vec<MacdValue>> {
    let mut macd = MovingAverageConvergenceDivergence::new(fast_period, slow_period, signal_period)?;
    Ok(closes
        .iter()
        .map(|&close| {
            let output = macd.next(close);
            MacdValue {
                dif: output.macd,
                dea: output.signal,
            }
        })
        .collect())
}
