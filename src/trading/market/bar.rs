use std::path::Path;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::AppError;

/// 回测所需的最小K线数量
pub const MIN_BARS: usize = 10;

/// 一根K线（日线）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    #[serde(default)]
    pub volume: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub turnover: Option<f64>,
}

impl Bar {
    pub fn new(date: NaiveDate, open: f64, high: f64, low: f64, close: f64, volume: f64) -> Self {
        Self {
            date,
            open,
            high,
            low,
            close,
            volume,
            turnover: None,
        }
    }
}

/// 从CSV文件加载K线数据，要求表头包含 date/open/high/low/close 列
pub fn load_bars_from_csv(path: &Path) -> Result<Vec<Bar>, AppError> {
    let mut reader = csv::Reader::from_path(path)?;

    {
        let headers = reader.headers()?;
        for required in ["date", "open", "close"] {
            if !headers.iter().any(|h| h.trim() == required) {
                return Err(AppError::MissingColumn(required.to_string()));
            }
        }
    }

    let mut bars = Vec::new();
    for record in reader.deserialize::<Bar>() {
        match record {
            Ok(bar) => bars.push(bar),
            // 单行解析失败不中断整个文件
            Err(e) => warn!("跳过无法解析的行: {}", e),
        }
    }
    Ok(bars)
}

/// 清洗K线数据：按日期排序、去重、过滤非正价格
///
/// 如果检测到非正价格，先过滤 `backtest_start_date` 之前的数据
/// （历史脏数据的处理方式，与负数价格出现的时间段对应）。
pub fn clean_bars(mut bars: Vec<Bar>, backtest_start_date: NaiveDate) -> Result<Vec<Bar>, AppError> {
    bars.sort_by_key(|b| b.date);
    bars.dedup_by_key(|b| b.date);

    let has_invalid_price = bars.iter().any(|b| b.open <= 0.0 || b.close <= 0.0);
    if has_invalid_price {
        debug!("检测到非正价格，过滤{}之前的数据", backtest_start_date);
        bars.retain(|b| b.date >= backtest_start_date);
        bars.retain(|b| b.open > 0.0 && b.close > 0.0);
    }

    if bars.len() < MIN_BARS {
        return Err(AppError::InsufficientData(format!(
            "清洗后仅剩{}行，少于{}行",
            bars.len(),
            MIN_BARS
        )));
    }
    Ok(bars)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn bar(d: &str, close: f64) -> Bar {
        Bar::new(date(d), close, close, close, close, 1000.0)
    }

    #[test]
    fn test_clean_sorts_and_dedups() {
        let mut bars: Vec<Bar> = (1..=12).map(|i| bar(&format!("2023-01-{:02}", i), 10.0)).collect();
        bars.reverse();
        bars.push(bar("2023-01-05", 10.0));

        let cleaned = clean_bars(bars, date("2020-01-01")).unwrap();
        assert_eq!(cleaned.len(), 12);
        assert!(cleaned.windows(2).all(|w| w[0].date < w[1].date));
    }

    #[test]
    fn test_clean_filters_invalid_prices_by_cutoff() {
        let mut bars: Vec<Bar> = (1..=5).map(|i| bar(&format!("2019-12-{:02}", i), -1.0)).collect();
        bars.extend((1..=12).map(|i| bar(&format!("2023-01-{:02}", i), 10.0)));

        let cleaned = clean_bars(bars, date("2020-01-01")).unwrap();
        assert_eq!(cleaned.len(), 12);
        assert!(cleaned.iter().all(|b| b.close > 0.0));
    }

    #[test]
    fn test_clean_insufficient_rows() {
        let bars: Vec<Bar> = (1..=5).map(|i| bar(&format!("2023-01-{:02}", i), 10.0)).collect();
        let err = clean_bars(bars, date("2020-01-01")).unwrap_err();
        assert!(matches!(err, AppError::InsufficientData(_)));
    }

    #[test]
    fn test_load_bars_from_csv() {
        let dir = std::env::temp_dir().join("grid_quant_test_bars");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("bars.csv");
        std::fs::write(
            &path,
            "date,open,high,low,close,volume\n2023-01-01,10.0,11.0,9.5,10.5,1200\n2023-01-02,10.5,10.8,10.1,10.2,900\n",
        )
        .unwrap();

        let bars = load_bars_from_csv(&path).unwrap();
        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].close, 10.5);
        assert_eq!(bars[1].date, date("2023-01-02"));
    }

    #[test]
    fn test_load_bars_missing_column() {
        let dir = std::env::temp_dir().join("grid_quant_test_bars");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("bad.csv");
        std::fs::write(&path, "date,open,high,low\n2023-01-01,10.0,11.0,9.5\n").unwrap();

        let err = load_bars_from_csv(&path).unwrap_err();
        assert!(matches!(err, AppError::MissingColumn(_)));
    }
}
