use ta::indicators::ExponentialMovingAverage;
use ta::Next;

use crate::app_config::QqeModConfig;
use crate::trading::indicator::rsi::Rsi;

/// QQE MOD 指标输出：1 看多 / -1 看空 / 0 无信号
pub type QqeDirection = i8;

/// 单组QQE bands计算结果
struct QqeBands {
    /// QQE趋势线（多头时为long band，空头时为short band）
    trend_line: Vec<f64>,
    /// 平滑后的RSI
    smoothed_rsi: Vec<f64>,
}

/// 计算一组QQE bands：Wilder RSI → EMA平滑 → 动态ATR轨道
fn calculate_qqe_bands(
    closes: &[f64],
    rsi_length: usize,
    smoothing: usize,
    qqe_factor: f64,
) -> anyhow::Result<QqeBands> {
    let wilders_length = rsi_length * 2 - 1;

    let mut rsi = Rsi::new(rsi_length);
    let mut rsi_smoother = ExponentialMovingAverage::new(smoothing)?;
    let mut atr_smoother = ExponentialMovingAverage::new(wilders_length)?;

    let n = closes.len();
    let mut smoothed_rsi = Vec::with_capacity(n);
    let mut long_band = vec![0.0; n];
    let mut short_band = vec![0.0; n];
    let mut trend_direction = vec![1i8; n];
    let mut trend_line = vec![0.0; n];

    let mut prev_smoothed: Option<f64> = None;
    let mut dynamic_atr = Vec::with_capacity(n);
    for &close in closes {
        let sr = rsi_smoother.next(rsi.next(close));
        // RSI变化幅度的平滑值作为RSI空间里的"ATR"
        let atr_rsi = match prev_smoothed {
            Some(prev) => (sr - prev).abs(),
            None => 0.0,
        };
        prev_smoothed = Some(sr);
        dynamic_atr.push(atr_smoother.next(atr_rsi) * qqe_factor);
        smoothed_rsi.push(sr);
    }

    for i in 0..n {
        let new_long = smoothed_rsi[i] - dynamic_atr[i];
        let new_short = smoothed_rsi[i] + dynamic_atr[i];

        if i == 0 {
            long_band[0] = new_long;
            short_band[0] = new_short;
            trend_direction[0] = 1;
        } else {
            // 多头轨道只抬不降，空头轨道只降不抬
            long_band[i] = if smoothed_rsi[i - 1] > long_band[i - 1] && smoothed_rsi[i] > long_band[i - 1]
            {
                long_band[i - 1].max(new_long)
            } else {
                new_long
            };
            short_band[i] = if smoothed_rsi[i - 1] < short_band[i - 1]
                && smoothed_rsi[i] < short_band[i - 1]
            {
                short_band[i - 1].min(new_short)
            } else {
                new_short
            };
            trend_direction[i] = if smoothed_rsi[i] > short_band[i - 1] {
                1
            } else if smoothed_rsi[i] < long_band[i - 1] {
                -1
            } else {
                trend_direction[i - 1]
            };
        }

        trend_line[i] = if trend_direction[i] == 1 {
            long_band[i]
        } else {
            short_band[i]
        };
    }

    Ok(QqeBands {
        trend_line,
        smoothed_rsi,
    })
}

/// 样本标准差的滚动窗口（min_periods=1，单样本时返回NaN）
fn rolling_mean_std(values: &[f64], window: usize) -> Vec<(f64, f64)> {
    let mut out = Vec::with_capacity(values.len());
    for i in 0..values.len() {
        let start = i.saturating_sub(window - 1);
        let slice = &values[start..=i];
        let n = slice.len() as f64;
        let mean = slice.iter().sum::<f64>() / n;
        let std = if slice.len() > 1 {
            let var = slice.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
            var.sqrt()
        } else {
            f64::NAN
        };
        out.push((mean, std));
    }
    out
}

/// 计算QQE MOD信号序列
///
/// 主QQE趋势线减50后的布林带作为信号门槛，副QQE的平滑RSI偏离中轴
/// 超过阈值且主RSI突破布林带时发出方向信号。
pub fn calculate_qqe_mod(
    closes: &[f64],
    config: &QqeModConfig,
) -> anyhow::Result<Vec<QqeDirection>> {
    let primary = calculate_qqe_bands(
        closes,
        config.rsi_length_primary,
        config.rsi_smoothing_primary,
        config.qqe_factor_primary,
    )?;
    let secondary = calculate_qqe_bands(
        closes,
        config.rsi_length_secondary,
        config.rsi_smoothing_secondary,
        config.qqe_factor_secondary,
    )?;

    let centered: Vec<f64> = primary.trend_line.iter().map(|v| v - 50.0).collect();
    let bands = rolling_mean_std(&centered, config.bollinger_length);

    let signals = closes
        .iter()
        .enumerate()
        .map(|(i, _)| {
            let (basis, std) = bands[i];
            let deviation = config.bollinger_multiplier * std;
            let upper = basis + deviation;
            let lower = basis - deviation;

            let primary_offset = primary.smoothed_rsi[i] - 50.0;
            let secondary_offset = secondary.smoothed_rsi[i] - 50.0;

            // NaN（样本不足）与任何值比较为false，信号自动为0
            if secondary_offset > config.threshold_secondary && primary_offset > upper {
                1
            } else if secondary_offset < -config.threshold_secondary && primary_offset < lower {
                -1
            } else {
                0
            }
        })
        .collect();
    Ok(signals)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_config() -> QqeModConfig {
        QqeModConfig::default()
    }

    #[test]
    fn test_qqe_mod_flat_series_is_neutral() {
        let closes = vec![100.0; 80];
        let signals = calculate_qqe_mod(&closes, &default_config()).unwrap();
        assert!(signals.iter().all(|&s| s == 0));
    }

    #[test]
    fn test_qqe_mod_strong_rally_turns_bullish() {
        let mut closes: Vec<f64> = (0..60).map(|_| 100.0).collect();
        let mut price = 100.0;
        for _ in 0..30 {
            price *= 1.03;
            closes.push(price);
        }
        let signals = calculate_qqe_mod(&closes, &default_config()).unwrap();
        assert!(
            signals.iter().rev().take(10).any(|&s| s == 1),
            "持续上涨后应出现看多信号"
        );
    }

    #[test]
    fn test_qqe_mod_strong_selloff_turns_bearish() {
        let mut closes: Vec<f64> = (0..60).map(|_| 100.0).collect();
        let mut price = 100.0;
        for _ in 0..30 {
            price *= 0.97;
            closes.push(price);
        }
        let signals = calculate_qqe_mod(&closes, &default_config()).unwrap();
        assert!(
            signals.iter().rev().take(10).any(|&s| s == -1),
            "持续下跌后应出现看空信号"
        );
    }

    #[test]
    fn test_rolling_mean_std_first_sample_nan() {
        let values = vec![1.0, 2.0, 3.0];
        let out = rolling_mean_std(&values, 3);
        assert!(out[0].1.is_nan());
        assert!((out[2].0 - 2.0).abs() < 1e-12);
        // 样本标准差 of [1,2,3] = 1
        assert!((out[2].1 - 1.0).abs() < 1e-12);
    }
}
