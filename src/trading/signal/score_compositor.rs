use ta::indicators::{BollingerBands, SimpleMovingAverage};
use ta::Next;

use crate::app_config::TechConfig;
use crate::error::AppError;
use crate::trading::indicator::kdj::calculate_kdj;
use crate::trading::indicator::macd::calculate_macd;
use crate::trading::indicator::rsi::Rsi;
use crate::trading::indicator::volume::VolumeRatioIndicator;
use crate::trading::market::Bar;
use crate::trading::signal::{Judgment, Signal};

/// 评分合成所需的最小K线数量
const MIN_BARS: usize = 10;

/// 量能均值窗口
const VOLUME_MA_PERIOD: usize = 5;

/// 三态分项状态：看多加分 / 看空加分 / 中性
#[derive(Debug, Clone, Copy, PartialEq)]
enum Lean {
    Bull,
    Bear,
    Flat,
}

/// 多指标评分合成器
///
/// 六个分项各计一票：MACD金叉死叉、KDJ超买超卖、RSI超买超卖、
/// 布林带位置、MA5/MA10金叉死叉、趋势方向（收盘价与MA20/MA60的关系）。
/// 多头票减空头票得到强度分，按阈值映射到综合判断；
/// 任一超买类危险信号会把看多降级为看多但有风险、中性降级为谨慎观望。
pub struct ScoreCompositor;

impl ScoreCompositor {
    pub fn compute(bars: &[Bar], config: &TechConfig) -> Result<Vec<Judgment>, AppError> {
        if bars.len() < MIN_BARS {
            return Err(AppError::InsufficientData(format!(
                "评分信号需要至少{}根K线，实际{}根",
                MIN_BARS,
                bars.len()
            )));
        }

        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();

        let macd = calculate_macd(
            &closes,
            config.macd.fast_period,
            config.macd.slow_period,
            config.macd.signal_period,
        )
        .map_err(|e| AppError::Config(e.to_string()))?;
        let kdj = calculate_kdj(bars, config.kdj.period, config.kdj.signal_period);

        let mut rsi = Rsi::new(config.rsi_period);
        let rsi_values: Vec<f64> = closes.iter().map(|&c| rsi.next(c)).collect();

        let mut boll = BollingerBands::new(config.boll.period, config.boll.multiplier)
            .map_err(|e| AppError::Config(e.to_string()))?;
        let mut ma_short = SimpleMovingAverage::new(config.ma.short_period)
            .map_err(|e| AppError::Config(e.to_string()))?;
        let mut ma_mid = SimpleMovingAverage::new(config.ma.mid_period)
            .map_err(|e| AppError::Config(e.to_string()))?;
        let mut ma_long = SimpleMovingAverage::new(config.ma.long_period)
            .map_err(|e| AppError::Config(e.to_string()))?;
        let mut ma_trend = SimpleMovingAverage::new(config.ma.trend_period)
            .map_err(|e| AppError::Config(e.to_string()))?;
        let mut volume_ratio = VolumeRatioIndicator::new(VOLUME_MA_PERIOD);

        let mut judgments = Vec::with_capacity(bars.len());
        let mut prev_ma_pair: Option<(f64, f64)> = None;

        for (i, bar) in bars.iter().enumerate() {
            let close = bar.close;

            // MACD金叉死叉（首根没有前值，视为中性）
            let (macd_lean, macd_label) = if i == 0 {
                (Lean::Flat, "中性")
            } else {
                let (dif, dea) = (macd[i].dif, macd[i].dea);
                let (prev_dif, prev_dea) = (macd[i - 1].dif, macd[i - 1].dea);
                if dif > dea && prev_dif <= prev_dea {
                    (Lean::Bull, "金叉(看多)")
                } else if dif < dea && prev_dif >= prev_dea {
                    (Lean::Bear, "死叉(看空)")
                } else {
                    (Lean::Flat, "中性")
                }
            };

            let j = kdj[i].j;
            let (kdj_lean, kdj_label) = if j > 80.0 {
                (Lean::Bear, "超买(警惕)")
            } else if j < 20.0 {
                (Lean::Bull, "超卖(机会)")
            } else {
                (Lean::Flat, "中性")
            };

            let rsi_value = rsi_values[i];
            let (rsi_lean, rsi_label) = if rsi_value > 70.0 {
                (Lean::Bear, "超买(警惕)")
            } else if rsi_value < 30.0 {
                (Lean::Bull, "超卖(机会)")
            } else {
                (Lean::Flat, "中性")
            };

            let bands = boll.next(close);
            let (boll_lean, boll_label) = if close > bands.upper {
                (Lean::Bear, "上轨上方(超买)")
            } else if close < bands.lower {
                (Lean::Bull, "下轨下方(超卖)")
            } else {
                (Lean::Flat, "中轨区间")
            };

            let ma5 = ma_short.next(close);
            let ma10 = ma_mid.next(close);
            let (ma_lean, ma_label) = match prev_ma_pair {
                Some((prev5, prev10)) => {
                    if ma5 > ma10 && prev5 <= prev10 {
                        (Lean::Bull, "金叉(看多)")
                    } else if ma5 < ma10 && prev5 >= prev10 {
                        (Lean::Bear, "死叉(看空)")
                    } else {
                        (Lean::Flat, "中性")
                    }
                }
                None => (Lean::Flat, "中性"),
            };
            prev_ma_pair = Some((ma5, ma10));

            // 趋势方向按顺序判断，先长均线后短均线
            let ma20 = ma_long.next(close);
            let ma60 = ma_trend.next(close);
            let (trend_lean, trend_label) = if close > ma60 {
                (Lean::Bull, "长期牛市")
            } else if close > ma20 {
                (Lean::Bull, "短期强势")
            } else if close < ma20 {
                (Lean::Bear, "短期弱势")
            } else if close < ma60 {
                (Lean::Bear, "长期熊市")
            } else {
                (Lean::Flat, "震荡行情")
            };

            // 量能趋势仅进入明细，不参与评分
            let ratio = volume_ratio.next(bar.volume);
            let volume_label = if ratio > 1.5 {
                "放量"
            } else if ratio < 0.7 {
                "缩量"
            } else {
                "正常"
            };

            let leans = [macd_lean, kdj_lean, rsi_lean, boll_lean, ma_lean, trend_lean];
            let bull = leans.iter().filter(|&&l| l == Lean::Bull).count() as i32;
            let bear = leans.iter().filter(|&&l| l == Lean::Bear).count() as i32;
            let strength = bull - bear;

            let mut signal = if strength > 3 {
                Signal::StrongBullish
            } else if strength > 1 {
                Signal::Bullish
            } else if strength >= -1 {
                Signal::Neutral
            } else if strength >= -3 {
                Signal::Bearish
            } else {
                Signal::StrongBearish
            };

            // 超买类危险信号降级（KDJ/RSI/布林带的看空票都来自超买）
            let danger = kdj_lean == Lean::Bear || rsi_lean == Lean::Bear || boll_lean == Lean::Bear;
            if danger {
                signal = match signal {
                    Signal::Bullish => Signal::BullishRisky,
                    Signal::Neutral => Signal::Caution,
                    other => other,
                };
            }

            let detail = format!(
                "MACD:{} KDJ:{} RSI:{} BOLL:{} MA:{} 量能:{} 趋势:{}",
                macd_label, kdj_label, rsi_label, boll_label, ma_label, volume_label, trend_label
            );

            judgments.push(Judgment { signal, detail });
        }

        Ok(judgments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn bars_from_closes(closes: &[f64]) -> Vec<Bar> {
        closes
            .iter()
            .enumerate()
            .map(|(i, &c)| {
                Bar::new(
                    NaiveDate::from_ymd_opt(2023, 1, 1).unwrap() + chrono::Days::new(i as u64),
                    c,
                    c * 1.01,
                    c * 0.99,
                    c,
                    1000.0,
                )
            })
            .collect()
    }

    #[test]
    fn test_insufficient_bars_is_error() {
        let bars = bars_from_closes(&[10.0; 5]);
        let err = ScoreCompositor::compute(&bars, &TechConfig::default()).unwrap_err();
        assert!(matches!(err, AppError::InsufficientData(_)));
    }

    #[test]
    fn test_flat_series_stays_out_of_strong_signals() {
        let bars = bars_from_closes(&vec![100.0; 80]);
        let judgments = ScoreCompositor::compute(&bars, &TechConfig::default()).unwrap();
        assert_eq!(judgments.len(), 80);
        for j in &judgments {
            assert!(
                !matches!(j.signal, Signal::StrongBullish | Signal::StrongBearish),
                "横盘不应出现强烈信号，实际{}",
                j.signal
            );
        }
    }

    #[test]
    fn test_rally_triggers_overbought_downgrade() {
        // 持续大涨：KDJ/RSI超买且收盘在布林上轨上方，
        // 综合判断不应停留在单纯看多或中性
        let closes: Vec<f64> = (0..80).map(|i| 100.0 * 1.02f64.powi(i)).collect();
        let bars = bars_from_closes(&closes);
        let judgments = ScoreCompositor::compute(&bars, &TechConfig::default()).unwrap();
        let tail = &judgments[judgments.len() - 10..];
        assert!(tail
            .iter()
            .all(|j| !matches!(j.signal, Signal::Bullish | Signal::Neutral)));
        assert!(tail.iter().any(|j| j.detail.contains("超买")));
    }

    #[test]
    fn test_selloff_leans_bearish() {
        let closes: Vec<f64> = (0..80).map(|i| 100.0 * 0.98f64.powi(i)).collect();
        let bars = bars_from_closes(&closes);
        let judgments = ScoreCompositor::compute(&bars, &TechConfig::default()).unwrap();
        let last = judgments.last().unwrap();
        assert!(
            matches!(
                last.signal,
                Signal::Bearish | Signal::StrongBearish | Signal::Neutral
            ),
            "持续下跌末段不应看多，实际{}",
            last.signal
        );
        assert!(last.detail.contains("趋势:"));
    }

    #[test]
    fn test_detail_contains_all_parts() {
        let bars = bars_from_closes(&vec![100.0; 30]);
        let judgments = ScoreCompositor::compute(&bars, &TechConfig::default()).unwrap();
        let detail = &judgments[15].detail;
        for part in ["MACD:", "KDJ:", "RSI:", "BOLL:", "MA:", "量能:", "趋势:"] {
            assert!(detail.contains(part), "明细缺少{}", part);
        }
    }

    #[test]
    fn test_volume_spike_noted_in_detail() {
        let mut bars = bars_from_closes(&vec![100.0; 30]);
        bars[20].volume = 10_000.0;
        let judgments = ScoreCompositor::compute(&bars, &TechConfig::default()).unwrap();
        assert!(judgments[20].detail.contains("放量"));
    }
}
