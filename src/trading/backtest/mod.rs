pub mod simulator;
pub mod stats;

pub use simulator::{run_backtest, BacktestOutput, EquityPoint, TradeAction, TradeRecord};
pub use stats::BacktestStats;
