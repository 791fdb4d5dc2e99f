use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::AppError;
use crate::trading::backtest::{BacktestStats, EquityPoint, TradeRecord};

/// 数值列的格式类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellFormat {
    /// 百分比，保留两位小数
    Percent,
    /// 货币（人民币），保留两位小数
    Currency,
    Integer,
    /// 天数，保留一位小数
    Days,
    /// 普通数值，保留三位小数
    Plain,
}

impl CellFormat {
    pub fn format(&self, value: f64) -> String {
        match self {
            CellFormat::Percent => format!("{:.2}%", value * 100.0),
            CellFormat::Currency => format!("¥{:.2}", value),
            CellFormat::Integer => format!("{}", value as i64),
            CellFormat::Days => format!("{:.1}", value),
            CellFormat::Plain => format!("{:.3}", value),
        }
    }
}

/// 统计结果转为（列名，格式化值）序列，顺序即CSV列顺序
fn stats_fields(stats: &BacktestStats) -> Vec<(&'static str, String)> {
    use CellFormat::*;
    vec![
        ("股票代码", stats.symbol.clone()),
        ("初始资金", Currency.format(stats.initial_capital)),
        ("最终资产净值", Currency.format(stats.final_equity)),
        ("资产净值最大值", Currency.format(stats.max_equity)),
        ("资产净值最小值", Currency.format(stats.min_equity)),
        ("最大回撤", Percent.format(stats.max_drawdown)),
        ("胜率", Percent.format(stats.win_rate)),
        ("策略涨幅", Percent.format(stats.return_ratio)),
        ("策略年化涨幅", Percent.format(stats.annualized_return)),
        ("持有年化涨幅", Percent.format(stats.hold_annualized_return)),
        ("总持有天数", Days.format(stats.total_hold_days)),
        ("一直持有涨幅", Percent.format(stats.buy_and_hold_return)),
        ("一直持有年化涨幅", Percent.format(stats.buy_and_hold_annualized)),
        ("策略超额收益", Percent.format(stats.excess_return)),
        ("策略超额年化收益", Percent.format(stats.excess_annualized)),
        ("交易次数", Integer.format(stats.trade_count as f64)),
        ("完成卖出次数", Integer.format(stats.sell_count as f64)),
        ("盈利交易次数", Integer.format(stats.win_count as f64)),
        ("开始日期", stats.start_date.to_string()),
        ("结束日期", stats.end_date.to_string()),
        ("回测开始价格", Plain.format(stats.start_price)),
        ("回测结束价格", Plain.format(stats.end_price)),
        ("期间价格涨跌幅", Percent.format(stats.price_return_ratio)),
        ("趋势状态次数", Integer.format(stats.trend_bar_count as f64)),
        ("当前现金", Currency.format(stats.final_cash)),
        ("最终趋势持仓", Plain.format(stats.final_trend_position)),
        ("最终网格持仓", Plain.format(stats.final_grid_position)),
        ("最终网格份数", Integer.format(stats.final_grid_units as f64)),
        ("最大挪用资金", Currency.format(stats.max_negative_cash)),
        ("最终需补充资金", Currency.format(stats.final_cash_needed)),
        ("总补充资金", Currency.format(stats.total_cash_injected)),
        ("资金利用率(%)", Days.format(stats.capital_utilization_pct)),
        ("持仓市值占比(%)", Days.format(stats.position_ratio_pct)),
        ("网格已实现收益", Currency.format(stats.grid_realized_profit)),
        ("网格未兑现收益", Currency.format(stats.grid_unrealized_profit)),
        ("网格总收益", Currency.format(stats.grid_total_return)),
        ("趋势已实现收益", Currency.format(stats.trend_realized_profit)),
        ("趋势未兑现收益", Currency.format(stats.trend_unrealized_profit)),
        ("趋势总收益", Currency.format(stats.trend_total_return)),
    ]
}

/// 写单标的回测统计CSV（一行表头 + 一行格式化数值）
pub fn write_stats_csv(path: &Path, stats: &BacktestStats) -> Result<(), AppError> {
    let fields = stats_fields(stats);
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(fields.iter().map(|(name, _)| *name))?;
    writer.write_record(fields.iter().map(|(_, value)| value.as_str()))?;
    writer.flush()?;
    Ok(())
}

/// 写交易记录CSV
pub fn write_trades_csv(path: &Path, trades: &[TradeRecord]) -> Result<(), AppError> {
    let mut writer = csv::Writer::from_path(path)?;
    for trade in trades {
        writer.serialize(trade)?;
    }
    writer.flush()?;
    Ok(())
}

/// 写资产净值曲线CSV
pub fn write_equity_csv(path: &Path, equity_curve: &[EquityPoint]) -> Result<(), AppError> {
    let mut writer = csv::Writer::from_path(path)?;
    for point in equity_curve {
        writer.serialize(point)?;
    }
    writer.flush()?;
    Ok(())
}

/// 批量回测的整体统计
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryReport {
    #[serde(rename = "总股票数")]
    pub total_symbols: usize,
    #[serde(rename = "总交易次数")]
    pub total_trades: usize,
    #[serde(rename = "总盈利交易次数")]
    pub total_wins: usize,
    #[serde(rename = "平均胜率")]
    pub avg_win_rate: f64,
    #[serde(rename = "平均策略涨幅")]
    pub avg_return: f64,
    #[serde(rename = "策略涨幅中位数")]
    pub median_return: f64,
    #[serde(rename = "平均策略年化涨幅")]
    pub avg_annualized: f64,
    #[serde(rename = "平均一直持有涨幅")]
    pub avg_buy_and_hold: f64,
    #[serde(rename = "平均一直持有年化涨幅")]
    pub avg_buy_and_hold_annualized: f64,
    #[serde(rename = "平均策略超额收益")]
    pub avg_excess: f64,
    #[serde(rename = "平均策略超额年化收益")]
    pub avg_excess_annualized: f64,
    #[serde(rename = "最大策略涨幅")]
    pub max_return: f64,
    #[serde(rename = "最小策略涨幅")]
    pub min_return: f64,
    #[serde(rename = "盈利股票数")]
    pub winner_count: usize,
    #[serde(rename = "亏损股票数")]
    pub loser_count: usize,
    #[serde(rename = "盈利股票平均策略涨幅")]
    pub avg_winner_return: f64,
    #[serde(rename = "亏损股票平均亏损比")]
    pub avg_loser_return: f64,
    #[serde(rename = "平均网格收益")]
    pub avg_grid_return: f64,
    #[serde(rename = "平均趋势收益")]
    pub avg_trend_return: f64,
    #[serde(rename = "网格收益中位数")]
    pub median_grid_return: f64,
    #[serde(rename = "趋势收益中位数")]
    pub median_trend_return: f64,
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

impl SummaryReport {
    pub fn from_stats(all_stats: &[BacktestStats]) -> Self {
        let returns: Vec<f64> = all_stats.iter().map(|s| s.return_ratio).collect();
        let winners: Vec<f64> = returns.iter().cloned().filter(|&r| r > 0.0).collect();
        let losers: Vec<f64> = returns.iter().cloned().filter(|&r| r < 0.0).collect();
        let grid_returns: Vec<f64> = all_stats.iter().map(|s| s.grid_total_return).collect();
        let trend_returns: Vec<f64> = all_stats.iter().map(|s| s.trend_total_return).collect();

        Self {
            total_symbols: all_stats.len(),
            total_trades: all_stats.iter().map(|s| s.trade_count).sum(),
            total_wins: all_stats.iter().map(|s| s.win_count).sum(),
            avg_win_rate: mean(&all_stats.iter().map(|s| s.win_rate).collect::<Vec<_>>()),
            avg_return: mean(&returns),
            median_return: median(&returns),
            avg_annualized: mean(
                &all_stats
                    .iter()
                    .map(|s| s.annualized_return)
                    .collect::<Vec<_>>(),
            ),
            avg_buy_and_hold: mean(
                &all_stats
                    .iter()
                    .map(|s| s.buy_and_hold_return)
                    .collect::<Vec<_>>(),
            ),
            avg_buy_and_hold_annualized: mean(
                &all_stats
                    .iter()
                    .map(|s| s.buy_and_hold_annualized)
                    .collect::<Vec<_>>(),
            ),
            avg_excess: mean(&all_stats.iter().map(|s| s.excess_return).collect::<Vec<_>>()),
            avg_excess_annualized: mean(
                &all_stats
                    .iter()
                    .map(|s| s.excess_annualized)
                    .collect::<Vec<_>>(),
            ),
            max_return: returns.iter().cloned().fold(f64::NEG_INFINITY, f64::max),
            min_return: returns.iter().cloned().fold(f64::INFINITY, f64::min),
            winner_count: winners.len(),
            loser_count: losers.len(),
            avg_winner_return: mean(&winners),
            avg_loser_return: mean(&losers),
            avg_grid_return: mean(&grid_returns),
            avg_trend_return: mean(&trend_returns),
            median_grid_return: median(&grid_returns),
            median_trend_return: median(&trend_returns),
        }
    }
}

/// 写批量汇总报告：逐标的明细 + 整体统计两个CSV
pub fn write_summary_reports(
    output_dir: &Path,
    all_stats: &[BacktestStats],
) -> Result<(), AppError> {
    if all_stats.is_empty() {
        info!("没有统计数据，跳过汇总报告");
        return Ok(());
    }

    let detail_path = output_dir.join("汇总明细.csv");
    let mut writer = csv::Writer::from_path(&detail_path)?;
    let header = stats_fields(&all_stats[0]);
    writer.write_record(header.iter().map(|(name, _)| *name))?;
    for stats in all_stats {
        let fields = stats_fields(stats);
        writer.write_record(fields.iter().map(|(_, value)| value.as_str()))?;
    }
    writer.flush()?;

    let overall_path = output_dir.join("整体统计.csv");
    let summary = SummaryReport::from_stats(all_stats);
    let mut writer = csv::Writer::from_path(&overall_path)?;
    writer.serialize(&summary)?;
    writer.flush()?;

    info!(
        "汇总报告已生成: {} / {}",
        detail_path.display(),
        overall_path.display()
    );
    Ok(())
}
