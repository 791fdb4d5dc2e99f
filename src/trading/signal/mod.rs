pub mod score_compositor;
pub mod trend_compositor;

use std::fmt;

use serde::{Deserialize, Serialize};

/// 每根K线的综合判断，闭合枚举（取代自由字符串标签）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Signal {
    /// 买入信号
    #[serde(rename = "买入信号")]
    Buy,
    /// 卖出信号
    #[serde(rename = "卖出信号")]
    Sell,
    /// 持有信号（买入信号的延续）
    #[serde(rename = "持有信号")]
    Hold,
    /// 谨慎观望（卖出信号的延续，或中性但有风险）
    #[serde(rename = "谨慎观望")]
    Caution,
    #[serde(rename = "强烈看多")]
    StrongBullish,
    #[serde(rename = "看多信号")]
    Bullish,
    #[serde(rename = "看空信号")]
    Bearish,
    #[serde(rename = "强烈看空")]
    StrongBearish,
    /// 看多但有超买风险
    #[serde(rename = "看多但有风险")]
    BullishRisky,
    #[serde(rename = "中性")]
    Neutral,
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Signal::Buy => "买入信号",
            Signal::Sell => "卖出信号",
            Signal::Hold => "持有信号",
            Signal::Caution => "谨慎观望",
            Signal::StrongBullish => "强烈看多",
            Signal::Bullish => "看多信号",
            Signal::Bearish => "看空信号",
            Signal::StrongBearish => "强烈看空",
            Signal::BullishRisky => "看多但有风险",
            Signal::Neutral => "中性",
        };
        write!(f, "{}", label)
    }
}

/// 触发趋势买入/卖出的信号集合
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalSets {
    pub buy: Vec<Signal>,
    pub sell: Vec<Signal>,
}

impl Default for SignalSets {
    fn default() -> Self {
        Self {
            buy: vec![Signal::Buy, Signal::Bullish, Signal::StrongBullish],
            sell: vec![Signal::Sell, Signal::Bearish, Signal::StrongBearish],
        }
    }
}

impl SignalSets {
    pub fn is_buy(&self, signal: Signal) -> bool {
        self.buy.contains(&signal)
    }

    pub fn is_sell(&self, signal: Signal) -> bool {
        self.sell.contains(&signal)
    }
}

/// 一根K线的信号判定结果：综合判断 + 各分项指标的明细
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Judgment {
    pub signal: Signal,
    pub detail: String,
}
