use crate::app_config::TechConfig;
use crate::error::AppError;
use crate::trading::indicator::qqe_mod::calculate_qqe_mod;
use crate::trading::indicator::super_trend::SuperTrend;
use crate::trading::indicator::trend_a::TrendA;
use crate::trading::market::Bar;
use crate::trading::signal::{Judgment, Signal};

/// 趋势指标所需的最小K线数量
const MIN_BARS: usize = 8;

/// SuperTrend 分项标签（带信号延续）
#[derive(Debug, Clone, Copy, PartialEq)]
enum SuperTrendLabel {
    Buy,
    Hold,
    Sell,
    Caution,
}

impl SuperTrendLabel {
    fn as_str(&self) -> &'static str {
        match self {
            SuperTrendLabel::Buy => "买入信号",
            SuperTrendLabel::Hold => "持有信号",
            SuperTrendLabel::Sell => "卖出信号",
            SuperTrendLabel::Caution => "谨慎观望信号",
        }
    }
}

/// 趋势三指标合成器：SuperTrend + QQE MOD + Trend A
///
/// SuperTrend信号带延续逻辑（买入→持有、卖出→谨慎观望），
/// 延续标签直接作为综合判断；否则三指标一致给出强信号，
/// 部分一致给出看多/看空，互相矛盾给出中性。
pub struct TrendCompositor;

impl TrendCompositor {
    pub fn compute(bars: &[Bar], config: &TechConfig) -> Result<Vec<Judgment>, AppError> {
        if bars.len() < MIN_BARS {
            return Err(AppError::InsufficientData(format!(
                "趋势信号需要至少{}根K线，实际{}根",
                MIN_BARS,
                bars.len()
            )));
        }

        let mut super_trend =
            SuperTrend::new(config.supertrend.atr_length, config.supertrend.multiplier)
                .map_err(|e| AppError::Config(e.to_string()))?;
        let mut trend_a = TrendA::new(config.trend_a.ma_period)
            .map_err(|e| AppError::Config(e.to_string()))?;

        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
        let qqe_directions = calculate_qqe_mod(&closes, &config.qqe)
            .map_err(|e| AppError::Config(e.to_string()))?;

        let st_directions: Vec<i8> = bars
            .iter()
            .map(|b| super_trend.next(b.high, b.low, b.close).direction)
            .collect();
        let ta_directions: Vec<i8> = bars.iter().map(|b| trend_a.next(b).direction).collect();

        // SuperTrend信号延续：方向不变时买入降级为持有、卖出降级为谨慎观望
        let mut st_labels = Vec::with_capacity(bars.len());
        for (i, &direction) in st_directions.iter().enumerate() {
            let label = if i == 0 {
                if direction == 1 {
                    SuperTrendLabel::Buy
                } else {
                    SuperTrendLabel::Sell
                }
            } else {
                let prev: SuperTrendLabel = st_labels[i - 1];
                match (prev, direction) {
                    (SuperTrendLabel::Buy | SuperTrendLabel::Hold, 1) => SuperTrendLabel::Hold,
                    (SuperTrendLabel::Sell | SuperTrendLabel::Caution, -1) => {
                        SuperTrendLabel::Caution
                    }
                    (_, 1) => SuperTrendLabel::Buy,
                    _ => SuperTrendLabel::Sell,
                }
            };
            st_labels.push(label);
        }

        let judgments = bars
            .iter()
            .enumerate()
            .map(|(i, _)| {
                let st = st_labels[i];
                let qqe = qqe_directions[i];
                let ta = ta_directions[i];

                let signal = match st {
                    // 延续标签直接使用
                    SuperTrendLabel::Hold => Signal::Hold,
                    SuperTrendLabel::Caution => Signal::Caution,
                    SuperTrendLabel::Buy if qqe == 1 && ta == 1 => Signal::Buy,
                    SuperTrendLabel::Sell if qqe == -1 && ta == -1 => Signal::Sell,
                    _ => {
                        if st == SuperTrendLabel::Buy || qqe == 1 || ta == 1 {
                            Signal::Bullish
                        } else if st == SuperTrendLabel::Sell || qqe == -1 || ta == -1 {
                            Signal::Bearish
                        } else {
                            Signal::Neutral
                        }
                    }
                };

                let qqe_label = match qqe {
                    1 => "看多信号",
                    -1 => "看空信号",
                    _ => "中性",
                };
                let ta_label = if ta == 1 { "上升趋势" } else { "下降趋势" };
                let detail = format!(
                    "SuperTrend:{} QQE_MOD:{} Trend_A:{}",
                    st.as_str(),
                    qqe_label,
                    ta_label
                );

                Judgment { signal, detail }
            })
            .collect();

        Ok(judgments)
    }
}
