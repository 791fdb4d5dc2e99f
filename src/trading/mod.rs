pub mod backtest;
pub mod indicator;
pub mod market;
pub mod report;
pub mod signal;
pub mod task;
