pub mod log;

use std::path::Path;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::trading::signal::SignalSets;

/// 网格策略配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GridStrategyConfig {
    /// 网格大小百分比（基准价下跌该幅度时买入）
    pub grid_size_pct: f64,
    /// 每份金额（元）
    pub grid_amount_per_unit: f64,
    /// 最小持仓份数（不卖出）
    pub min_hold_units: usize,
    /// 最大持仓份数（不买入）
    pub max_hold_units: usize,
    /// 每份卖出必须盈利百分比
    pub required_profit_pct: f64,
}

impl Default for GridStrategyConfig {
    fn default() -> Self {
        Self {
            grid_size_pct: 1.5,
            grid_amount_per_unit: 10000.0,
            min_hold_units: 0,
            max_hold_units: 10,
            required_profit_pct: 1.5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SuperTrendConfig {
    pub atr_length: usize,
    pub multiplier: f64,
}

impl Default for SuperTrendConfig {
    fn default() -> Self {
        Self {
            atr_length: 10,
            multiplier: 3.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QqeModConfig {
    pub rsi_length_primary: usize,
    pub rsi_smoothing_primary: usize,
    pub qqe_factor_primary: f64,
    pub threshold_primary: f64,
    pub rsi_length_secondary: usize,
    pub rsi_smoothing_secondary: usize,
    pub qqe_factor_secondary: f64,
    pub threshold_secondary: f64,
    pub bollinger_length: usize,
    pub bollinger_multiplier: f64,
}

impl Default for QqeModConfig {
    fn default() -> Self {
        Self {
            rsi_length_primary: 6,
            rsi_smoothing_primary: 5,
            qqe_factor_primary: 3.0,
            threshold_primary: 3.0,
            rsi_length_secondary: 6,
            rsi_smoothing_secondary: 5,
            qqe_factor_secondary: 1.61,
            threshold_secondary: 3.0,
            bollinger_length: 50,
            bollinger_multiplier: 0.35,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrendAConfig {
    pub ma_period: usize,
}

impl Default for TrendAConfig {
    fn default() -> Self {
        Self { ma_period: 9 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MacdConfig {
    pub fast_period: usize,
    pub slow_period: usize,
    pub signal_period: usize,
}

impl Default for MacdConfig {
    fn default() -> Self {
        Self {
            fast_period: 12,
            slow_period: 26,
            signal_period: 9,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KdjConfig {
    pub period: usize,
    pub signal_period: usize,
}

impl Default for KdjConfig {
    fn default() -> Self {
        Self {
            period: 9,
            signal_period: 3,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BollConfig {
    pub period: usize,
    pub multiplier: f64,
}

impl Default for BollConfig {
    fn default() -> Self {
        Self {
            period: 20,
            multiplier: 2.0,
        }
    }
}

/// 均线组配置：短/中均线用于金叉死叉，长/趋势均线用于趋势方向判断
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MaLadderConfig {
    pub short_period: usize,
    pub mid_period: usize,
    pub long_period: usize,
    pub trend_period: usize,
}

impl Default for MaLadderConfig {
    fn default() -> Self {
        Self {
            short_period: 5,
            mid_period: 10,
            long_period: 20,
            trend_period: 60,
        }
    }
}

/// 技术指标参数
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TechConfig {
    pub supertrend: SuperTrendConfig,
    pub qqe: QqeModConfig,
    pub trend_a: TrendAConfig,
    pub macd: MacdConfig,
    pub kdj: KdjConfig,
    pub rsi_period: usize,
    pub boll: BollConfig,
    pub ma: MaLadderConfig,
}

impl Default for TechConfig {
    fn default() -> Self {
        Self {
            supertrend: SuperTrendConfig::default(),
            qqe: QqeModConfig::default(),
            trend_a: TrendAConfig::default(),
            macd: MacdConfig::default(),
            kdj: KdjConfig::default(),
            rsi_period: 14,
            boll: BollConfig::default(),
            ma: MaLadderConfig::default(),
        }
    }
}

/// 应用配置：不可变，启动时加载一次后传入各组件
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// 初始资金
    pub initial_capital: f64,
    /// 回测起始日期（仅在检测到非正价格时用于过滤脏数据）
    pub backtest_start_date: NaiveDate,
    /// 是否允许无限资金池（网格买入可使现金为负，记录补充资金）
    pub allow_cash_injection: bool,
    pub grid: GridStrategyConfig,
    pub signals: SignalSets,
    pub tech: TechConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            initial_capital: 100_000.0,
            backtest_start_date: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
            allow_cash_injection: true,
            grid: GridStrategyConfig::default(),
            signals: SignalSets::default(),
            tech: TechConfig::default(),
        }
    }
}

impl AppConfig {
    /// 从JSON文件加载配置，文件不存在字段时使用默认值
    pub fn load(path: &Path) -> Result<Self, AppError> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| AppError::Config(format!("{}: {}", path.display(), e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.initial_capital, 100_000.0);
        assert_eq!(config.grid.max_hold_units, 10);
        assert_eq!(config.grid.grid_size_pct, 1.5);
        assert_eq!(config.tech.rsi_period, 14);
        assert!(config.allow_cash_injection);
    }

    #[test]
    fn test_config_json_roundtrip() {
        let config = AppConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let parsed: AppConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.grid.grid_amount_per_unit, 10000.0);
    }

    #[test]
    fn test_partial_config() {
        // 只覆盖部分字段，其余保持默认
        let parsed: AppConfig =
            serde_json::from_str(r#"{"initial_capital": 50000.0, "grid": {"max_hold_units": 5}}"#)
                .unwrap();
        assert_eq!(parsed.initial_capital, 50000.0);
        assert_eq!(parsed.grid.max_hold_units, 5);
        assert_eq!(parsed.grid.grid_size_pct, 1.5);
    }
}
