use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::app_config::AppConfig;
use crate::error::AppError;
use crate::time_util::days_between;
use crate::trading::backtest::stats::{annualized_return, max_drawdown, BacktestStats};
use crate::trading::market::{Bar, MIN_BARS};
use crate::trading::signal::Judgment;

/// 交易动作类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TradeAction {
    /// 网格买入（初始底仓）
    #[serde(rename = "网格买入(初始底仓)")]
    InitialGridBuy,
    #[serde(rename = "网格买入")]
    GridBuy,
    #[serde(rename = "网格卖出")]
    GridSell,
    /// 趋势买入（网格冻结）
    #[serde(rename = "趋势买入(网格冻结)")]
    TrendBuy,
    #[serde(rename = "趋势卖出")]
    TrendSell,
}

/// 一条交易记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    #[serde(rename = "日期")]
    pub date: NaiveDate,
    #[serde(rename = "动作")]
    pub action: TradeAction,
    #[serde(rename = "价格")]
    pub price: f64,
    #[serde(rename = "数量")]
    pub quantity: f64,
    #[serde(rename = "金额")]
    pub amount: f64,
    /// 卖出时对应的买入价
    #[serde(rename = "买入价")]
    pub buy_price: Option<f64>,
    #[serde(rename = "盈亏")]
    pub profit: Option<f64>,
    #[serde(rename = "盈亏百分比")]
    pub profit_pct: Option<f64>,
    #[serde(rename = "是否盈利")]
    pub is_win: Option<bool>,
    #[serde(rename = "卖出原因")]
    pub reason: Option<String>,
    #[serde(rename = "网格份数")]
    pub grid_units: usize,
    #[serde(rename = "趋势持仓")]
    pub trend_position: f64,
    #[serde(rename = "网格持仓")]
    pub grid_position: f64,
    #[serde(rename = "现金")]
    pub cash: f64,
    #[serde(rename = "资产净值")]
    pub equity: f64,
}

/// 每根K线结束时的持仓状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModeState {
    #[serde(rename = "网格策略")]
    Grid,
    #[serde(rename = "趋势持仓")]
    TrendHolding,
}

/// 资产净值曲线上的一个点（每根K线一条）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquityPoint {
    #[serde(rename = "日期")]
    pub date: NaiveDate,
    #[serde(rename = "资产净值")]
    pub equity: f64,
    #[serde(rename = "现金")]
    pub cash: f64,
    #[serde(rename = "状态")]
    pub state: ModeState,
    #[serde(rename = "趋势持仓")]
    pub trend_position: f64,
    #[serde(rename = "网格持仓")]
    pub grid_position: f64,
    #[serde(rename = "网格份数")]
    pub grid_units: usize,
    #[serde(rename = "收盘价")]
    pub close_price: f64,
}

/// 回测输出：统计 + 交易记录 + 资产净值曲线
#[derive(Debug, Clone)]
pub struct BacktestOutput {
    pub stats: BacktestStats,
    pub trades: Vec<TradeRecord>,
    pub equity_curve: Vec<EquityPoint>,
}

/// 回测过程中的可变状态，单次回测独占
struct SimulationState {
    cash: f64,
    grid_position: f64,
    grid_units: usize,
    /// 未卖出的网格买入价，按买入顺序排列
    grid_buy_records: Vec<f64>,
    grid_reference_price: Option<f64>,
    initial_grid_bought: bool,
    grid_cumulative_profit: f64,
    trend_active: bool,
    trend_position: f64,
    trend_buy_price: f64,
    trend_buy_date: Option<NaiveDate>,
    trend_cumulative_profit: f64,
    max_negative_cash: f64,
    total_cash_injected: f64,
    win_count: usize,
    sell_count: usize,
    trade_count: usize,
    total_hold_days: f64,
    daily_hold_values: Vec<f64>,
}

impl SimulationState {
    fn new(initial_capital: f64) -> Self {
        Self {
            cash: initial_capital,
            grid_position: 0.0,
            grid_units: 0,
            grid_buy_records: Vec::new(),
            grid_reference_price: None,
            initial_grid_bought: false,
            grid_cumulative_profit: 0.0,
            trend_active: false,
            trend_position: 0.0,
            trend_buy_price: 0.0,
            trend_buy_date: None,
            trend_cumulative_profit: 0.0,
            max_negative_cash: 0.0,
            total_cash_injected: 0.0,
            win_count: 0,
            sell_count: 0,
            trade_count: 0,
            total_hold_days: 0.0,
            daily_hold_values: Vec::new(),
        }
    }

    fn total_position(&self) -> f64 {
        self.grid_position + self.trend_position
    }

    fn equity_at(&self, price: f64) -> f64 {
        self.cash + self.total_position() * price
    }

    /// 网格买入一份，记录资金池挪用情况
    fn grid_buy_unit(&mut self, price: f64, amount: f64) -> f64 {
        let quantity = amount / price;
        let old_cash = self.cash;
        self.cash -= amount;
        self.grid_position += quantity;
        self.grid_units += 1;
        self.grid_buy_records.push(price);
        self.trade_count += 1;

        if old_cash >= 0.0 && self.cash < 0.0 {
            self.total_cash_injected += -self.cash;
        } else if old_cash < 0.0 {
            self.total_cash_injected += amount;
        }
        if self.cash < 0.0 && -self.cash > self.max_negative_cash {
            self.max_negative_cash = -self.cash;
        }
        quantity
    }
}

/// 网格+趋势组合策略回测
///
/// 默认执行网格策略：基准价下跌 grid_size_pct 买入一份，
/// 单份盈利 required_profit_pct 时卖出（每根K线至多卖出一份）。
/// 趋势买入信号出现时冻结网格持仓，全部现金买入趋势仓位；
/// 趋势卖出信号出现时清仓趋势持仓并恢复网格交易，
/// 卖出价成为新的网格基准价。趋势切换的K线不再执行网格交易。
pub fn run_backtest(
    symbol: &str,
    bars: &[Bar],
    judgments: &[Judgment],
    config: &AppConfig,
) -> Result<BacktestOutput, AppError> {
    if bars.len() < MIN_BARS {
        return Err(AppError::InsufficientData(format!(
            "回测需要至少{}根K线，实际{}根",
            MIN_BARS,
            bars.len()
        )));
    }
    if bars.len() != judgments.len() {
        return Err(AppError::ParseError(format!(
            "信号数量({})与K线数量({})不一致",
            judgments.len(),
            bars.len()
        )));
    }

    let grid = &config.grid;
    let grid_size = grid.grid_size_pct / 100.0;
    let required_profit = grid.required_profit_pct / 100.0;
    let unit_amount = grid.grid_amount_per_unit;

    let mut state = SimulationState::new(config.initial_capital);
    let mut trades: Vec<TradeRecord> = Vec::new();
    let mut equity_curve: Vec<EquityPoint> = Vec::with_capacity(bars.len());

    let start_date = bars[0].date;
    let end_date = bars[bars.len() - 1].date;
    let start_price = bars[0].close;
    let end_price = bars[bars.len() - 1].close;

    for (bar, judgment) in bars.iter().zip(judgments) {
        let date = bar.date;
        let close = bar.close;
        let is_buy = config.signals.is_buy(judgment.signal);
        let is_sell = config.signals.is_sell(judgment.signal);

        // 1. 趋势卖出：清仓趋势持仓，恢复网格交易，本K线不再执行网格
        if state.trend_active && is_sell {
            if state.trend_position > 0.0 {
                let sell_price = close;
                let sell_amount = state.trend_position * sell_price;
                state.cash += sell_amount;

                let profit = if state.trend_buy_price > 0.0 {
                    (sell_price - state.trend_buy_price) * state.trend_position
                } else {
                    0.0
                };
                state.trend_cumulative_profit += profit;
                let is_win = profit > 0.0;
                if is_win {
                    state.win_count += 1;
                }
                state.sell_count += 1;
                state.trade_count += 1;

                let profit_pct = if state.trend_buy_price > 0.0 {
                    (sell_price - state.trend_buy_price) / state.trend_buy_price * 100.0
                } else {
                    0.0
                };

                // 持有天数按自然天累加
                if let Some(buy_date) = state.trend_buy_date {
                    state.total_hold_days += days_between(buy_date, date) as f64;
                }

                let sold_quantity = state.trend_position;
                state.trend_position = 0.0;
                state.trend_buy_price = 0.0;
                state.trend_buy_date = None;
                state.trend_active = false;
                // 卖出价成为新的网格基准价
                state.grid_reference_price = Some(sell_price);

                trades.push(TradeRecord {
                    date,
                    action: TradeAction::TrendSell,
                    price: sell_price,
                    quantity: sold_quantity,
                    amount: sell_amount,
                    buy_price: None,
                    profit: Some(profit),
                    profit_pct: Some(profit_pct),
                    is_win: Some(is_win),
                    reason: Some(format!("趋势卖出信号({})", judgment.signal)),
                    grid_units: state.grid_units,
                    trend_position: 0.0,
                    grid_position: state.grid_position,
                    cash: state.cash,
                    equity: state.equity_at(close),
                });
                debug!("{} 趋势卖出 价格{:.4} 盈亏{:.2}", date, sell_price, profit);
            }

            state.daily_hold_values.push(state.grid_position * close);
            if state.grid_units > 0 && grid.max_hold_units > 0 {
                state.total_hold_days +=
                    state.grid_units as f64 / grid.max_hold_units as f64;
            }
            equity_curve.push(equity_point(&state, date, close, ModeState::Grid));
            continue;
        }

        // 2. 趋势买入：冻结网格持仓，全部现金买入趋势仓位
        if !state.trend_active && is_buy && state.cash > 0.0 {
            let buy_amount = state.cash;
            state.trend_buy_price = close;
            state.trend_buy_date = Some(date);
            state.trend_position = buy_amount / close;
            state.cash = 0.0;
            state.trend_active = true;
            state.trade_count += 1;

            trades.push(TradeRecord {
                date,
                action: TradeAction::TrendBuy,
                price: close,
                quantity: state.trend_position,
                amount: buy_amount,
                buy_price: None,
                profit: None,
                profit_pct: None,
                is_win: None,
                reason: Some(format!("趋势买入信号({})", judgment.signal)),
                grid_units: state.grid_units,
                trend_position: state.trend_position,
                grid_position: state.grid_position,
                cash: 0.0,
                equity: state.equity_at(close),
            });
            debug!("{} 趋势买入 价格{:.4} 金额{:.2}", date, close, buy_amount);

            state.daily_hold_values.push(state.total_position() * close);
            state.total_hold_days += 1.0;
            equity_curve.push(equity_point(&state, date, close, ModeState::TrendHolding));
            continue;
        }

        // 3. 趋势持仓中：只监控卖出信号，网格冻结
        if state.trend_active {
            state.daily_hold_values.push(state.total_position() * close);
            state.total_hold_days += 1.0;
            equity_curve.push(equity_point(&state, date, close, ModeState::TrendHolding));
            continue;
        }

        // 4. 网格策略
        // 4a. 初始底仓：首次进入非趋势状态时买入一份
        if !state.initial_grid_bought && state.grid_units == 0 {
            if !config.allow_cash_injection && state.cash < unit_amount {
                debug!("{} 现金{:.2}不足一份，跳过初始底仓买入", date, state.cash);
            } else {
                let quantity = state.grid_buy_unit(close, unit_amount);
                state.initial_grid_bought = true;
                state.grid_reference_price = Some(close);

                trades.push(TradeRecord {
                    date,
                    action: TradeAction::InitialGridBuy,
                    price: close,
                    quantity,
                    amount: unit_amount,
                    buy_price: None,
                    profit: None,
                    profit_pct: None,
                    is_win: None,
                    reason: None,
                    grid_units: state.grid_units,
                    trend_position: state.trend_position,
                    grid_position: state.grid_position,
                    cash: state.cash,
                    equity: state.equity_at(close),
                });
            }
        }

        // 4b/4c. 基准价上移，从基准价下跌 grid_size 时加买一份
        if state.grid_units < grid.max_hold_units {
            if let Some(reference) = state.grid_reference_price {
                let reference = if close > reference {
                    state.grid_reference_price = Some(close);
                    close
                } else {
                    reference
                };

                let target_buy_price = reference * (1.0 - grid_size);
                let can_afford = config.allow_cash_injection || state.cash >= unit_amount;
                if close <= target_buy_price && !can_afford {
                    debug!("{} 现金{:.2}不足一份，跳过网格加买", date, state.cash);
                }
                if close <= target_buy_price && can_afford {
                    let quantity = state.grid_buy_unit(close, unit_amount);
                    // 买入后从买入价开始跟踪新的最高价
                    state.grid_reference_price = Some(close);

                    trades.push(TradeRecord {
                        date,
                        action: TradeAction::GridBuy,
                        price: close,
                        quantity,
                        amount: unit_amount,
                        buy_price: None,
                        profit: None,
                        profit_pct: None,
                        is_win: None,
                        reason: None,
                        grid_units: state.grid_units,
                        trend_position: state.trend_position,
                        grid_position: state.grid_position,
                        cash: state.cash,
                        equity: state.equity_at(close),
                    });
                }
            }
        }

        // 4d. 网格卖出：达到盈利目标的第一条记录，每根K线至多卖一份
        if state.grid_units > grid.min_hold_units {
            let hit = state.grid_buy_records.iter().position(|&buy_price| {
                close >= buy_price * (1.0 + required_profit)
            });
            if let Some(idx) = hit {
                let buy_price = state.grid_buy_records[idx];
                let sell_quantity = unit_amount / buy_price;
                if state.grid_position >= sell_quantity {
                    state.grid_buy_records.remove(idx);
                    state.grid_position -= sell_quantity;
                    state.grid_units -= 1;
                    state.cash += sell_quantity * close;

                    let profit = (close - buy_price) * sell_quantity;
                    state.grid_cumulative_profit += profit;
                    let is_win = profit > 0.0;
                    if is_win {
                        state.win_count += 1;
                    }
                    state.sell_count += 1;
                    state.trade_count += 1;

                    trades.push(TradeRecord {
                        date,
                        action: TradeAction::GridSell,
                        price: close,
                        quantity: sell_quantity,
                        amount: sell_quantity * close,
                        buy_price: Some(buy_price),
                        profit: Some(profit),
                        profit_pct: Some((close - buy_price) / buy_price * 100.0),
                        is_win: Some(is_win),
                        reason: None,
                        grid_units: state.grid_units,
                        trend_position: state.trend_position,
                        grid_position: state.grid_position,
                        cash: state.cash,
                        equity: state.equity_at(close),
                    });
                }
            }
        }

        // 5. 记录当日净值与持仓市值
        state.daily_hold_values.push(state.grid_position * close);
        if state.grid_units > 0 && grid.max_hold_units > 0 {
            state.total_hold_days += state.grid_units as f64 / grid.max_hold_units as f64;
        }
        equity_curve.push(equity_point(&state, date, close, ModeState::Grid));
    }

    // 最终结算
    let final_equity = state.equity_at(end_price);
    let grid_cost_basis = state.grid_buy_records.len() as f64 * unit_amount;
    let grid_unrealized = state.grid_position * end_price - grid_cost_basis;
    let trend_unrealized = if state.trend_buy_price > 0.0 {
        (end_price - state.trend_buy_price) * state.trend_position
    } else {
        state.trend_position * end_price
    };

    let equity_values: Vec<f64> = equity_curve.iter().map(|p| p.equity).collect();
    let max_equity = equity_values.iter().cloned().fold(f64::MIN, f64::max);
    let min_equity = equity_values.iter().cloned().fold(f64::MAX, f64::min);

    let return_ratio = final_equity / config.initial_capital - 1.0;
    let buy_and_hold_return = if start_price > 0.0 {
        (end_price - start_price) / start_price
    } else {
        0.0
    };
    let strategy_annualized =
        annualized_return(start_date, end_date, final_equity, config.initial_capital);
    let buy_and_hold_annualized = annualized_return(
        start_date,
        end_date,
        config.initial_capital * (1.0 + buy_and_hold_return),
        config.initial_capital,
    );

    let win_rate = if state.sell_count > 0 {
        state.win_count as f64 / state.sell_count as f64
    } else {
        0.0
    };

    let capital_utilization_pct = if !state.daily_hold_values.is_empty()
        && config.initial_capital > 0.0
    {
        let mean = state.daily_hold_values.iter().sum::<f64>()
            / state.daily_hold_values.len() as f64;
        mean / config.initial_capital * 100.0
    } else {
        0.0
    };

    let final_position_value = state.total_position() * end_price;
    let position_ratio_pct = if final_equity > 0.0 {
        final_position_value / final_equity * 100.0
    } else {
        0.0
    };

    let hold_years = state.total_hold_days / 365.0;
    let hold_annualized_return = if hold_years > 0.0 {
        return_ratio / hold_years
    } else {
        0.0
    };

    let final_cash_needed = if state.cash < 0.0 {
        state.max_negative_cash.max(-state.cash)
    } else {
        0.0
    };

    let trend_bar_count = equity_curve
        .iter()
        .filter(|p| p.state == ModeState::TrendHolding)
        .count();

    let stats = BacktestStats {
        symbol: symbol.to_string(),
        initial_capital: config.initial_capital,
        final_equity,
        max_equity,
        min_equity,
        max_drawdown: max_drawdown(&equity_values),
        win_rate,
        return_ratio,
        annualized_return: strategy_annualized,
        hold_annualized_return,
        total_hold_days: state.total_hold_days,
        buy_and_hold_return,
        buy_and_hold_annualized,
        excess_return: return_ratio - buy_and_hold_return,
        excess_annualized: strategy_annualized - buy_and_hold_annualized,
        trade_count: state.trade_count,
        sell_count: state.sell_count,
        win_count: state.win_count,
        start_date,
        end_date,
        start_price,
        end_price,
        price_return_ratio: if start_price > 0.0 {
            end_price / start_price - 1.0
        } else {
            0.0
        },
        trend_bar_count,
        final_cash: state.cash,
        final_trend_position: state.trend_position,
        final_grid_position: state.grid_position,
        final_grid_units: state.grid_units,
        max_negative_cash: state.max_negative_cash,
        final_cash_needed,
        total_cash_injected: state.total_cash_injected,
        capital_utilization_pct,
        position_ratio_pct,
        grid_realized_profit: state.grid_cumulative_profit,
        grid_unrealized_profit: grid_unrealized,
        grid_total_return: state.grid_cumulative_profit + grid_unrealized,
        trend_realized_profit: state.trend_cumulative_profit,
        trend_unrealized_profit: trend_unrealized,
        trend_total_return: state.trend_cumulative_profit + trend_unrealized,
    };

    Ok(BacktestOutput {
        stats,
        trades,
        equity_curve,
    })
}

fn equity_point(state: &SimulationState, date: NaiveDate, close: f64, mode: ModeState) -> EquityPoint {
    EquityPoint {
        date,
        equity: state.equity_at(close),
        cash: state.cash,
        state: mode,
        trend_position: state.trend_position,
        grid_position: state.grid_position,
        grid_units: state.grid_units,
        close_price: close,
    }
}
