use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::time_util::years_between;

/// 单标的回测统计结果
///
/// 字段顺序即CSV输出的列顺序。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestStats {
    /// 标的代码（取自数据文件名）
    pub symbol: String,
    pub initial_capital: f64,
    pub final_equity: f64,
    pub max_equity: f64,
    pub min_equity: f64,
    /// 最大回撤（负数，如 -0.25 表示 25%）
    pub max_drawdown: f64,
    /// 胜率 = 盈利卖出次数 / 完成卖出次数
    pub win_rate: f64,
    pub return_ratio: f64,
    pub annualized_return: f64,
    /// 持有年化涨幅 = 策略涨幅 / (总持有天数 / 365)
    pub hold_annualized_return: f64,
    pub total_hold_days: f64,
    pub buy_and_hold_return: f64,
    pub buy_and_hold_annualized: f64,
    pub excess_return: f64,
    pub excess_annualized: f64,
    /// 全部交易次数（含买入）
    pub trade_count: usize,
    /// 完成卖出次数
    pub sell_count: usize,
    pub win_count: usize,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub start_price: f64,
    pub end_price: f64,
    pub price_return_ratio: f64,
    /// 处于趋势持仓状态的K线数量
    pub trend_bar_count: usize,
    pub final_cash: f64,
    pub final_trend_position: f64,
    pub final_grid_position: f64,
    pub final_grid_units: usize,
    pub max_negative_cash: f64,
    pub final_cash_needed: f64,
    pub total_cash_injected: f64,
    /// 资金利用率（日均持仓市值 / 初始资金，百分比）
    pub capital_utilization_pct: f64,
    /// 持仓市值占比（百分比）
    pub position_ratio_pct: f64,
    pub grid_realized_profit: f64,
    pub grid_unrealized_profit: f64,
    pub grid_total_return: f64,
    pub trend_realized_profit: f64,
    pub trend_unrealized_profit: f64,
    pub trend_total_return: f64,
}

/// 年化收益率：(终值/初值)^(365/天数) - 1
pub fn annualized_return(
    start_date: NaiveDate,
    end_date: NaiveDate,
    final_value: f64,
    initial_capital: f64,
) -> f64 {
    let years = years_between(start_date, end_date);
    if years <= 0.0 || initial_capital <= 0.0 || final_value <= 0.0 {
        return 0.0;
    }
    (final_value / initial_capital).powf(1.0 / years) - 1.0
}

/// 最大回撤：(净值 - 滚动峰值) / 滚动峰值 的最小值（非正数）
pub fn max_drawdown(equity: &[f64]) -> f64 {
    let mut peak = f64::MIN;
    let mut worst = 0.0f64;
    for &value in equity {
        if value > peak {
            peak = value;
        }
        if peak > 0.0 {
            let drawdown = (value - peak) / peak;
            if drawdown < worst {
                worst = drawdown;
            }
        }
    }
    worst
}
