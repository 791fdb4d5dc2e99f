pub mod atr;
pub mod kdj;
pub mod macd;
pub mod qqe_mod;
pub mod rma;
pub mod rsi;
pub mod super_trend;
pub mod trend_a;
pub mod volume;
