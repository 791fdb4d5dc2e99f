use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::app_config::AppConfig;
use crate::error::AppError;
use crate::trading::backtest::{run_backtest, BacktestStats};
use crate::trading::market::{clean_bars, load_bars_from_csv, Bar};
use crate::trading::report;
use crate::trading::signal::score_compositor::ScoreCompositor;
use crate::trading::signal::trend_compositor::TrendCompositor;
use crate::trading::signal::Judgment;

/// 信号合成方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
pub enum CompositorKind {
    /// 趋势三指标合成（SuperTrend + QQE MOD + Trend A）
    Trend,
    /// 多指标评分合成（MACD/KDJ/RSI/BOLL/MA/趋势方向）
    Score,
}

impl CompositorKind {
    fn compose(&self, bars: &[Bar], config: &AppConfig) -> Result<Vec<Judgment>, AppError> {
        match self {
            CompositorKind::Trend => TrendCompositor::compute(bars, &config.tech),
            CompositorKind::Score => ScoreCompositor::compute(bars, &config.tech),
        }
    }
}

/// 批量回测的汇总结果
#[derive(Debug)]
pub struct BatchOutcome {
    pub success_count: usize,
    pub failure_count: usize,
    pub all_stats: Vec<BacktestStats>,
}

/// 单个数据文件的回测：读取、清洗、合成信号、模拟、写报告
pub fn run_single_file(
    input_path: &Path,
    output_dir: &Path,
    compositor: CompositorKind,
    config: &AppConfig,
) -> Result<BacktestStats, AppError> {
    let symbol = input_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("unknown")
        .to_string();
    info!("开始回测: {}", symbol);

    let bars = load_bars_from_csv(input_path)?;
    let bars = clean_bars(bars, config.backtest_start_date)?;
    let judgments = compositor.compose(&bars, config)?;
    let output = run_backtest(&symbol, &bars, &judgments, config)?;

    report::write_stats_csv(
        &output_dir.join(format!("{}_回测统计.csv", symbol)),
        &output.stats,
    )?;
    report::write_trades_csv(
        &output_dir.join(format!("{}_交易记录.csv", symbol)),
        &output.trades,
    )?;
    report::write_equity_csv(
        &output_dir.join(format!("{}_资产净值.csv", symbol)),
        &output.equity_curve,
    )?;

    info!(
        "{} 回测完成 策略涨幅{:.2}% 超额收益{:.2}% 胜率{:.2}% 交易{}次",
        symbol,
        output.stats.return_ratio * 100.0,
        output.stats.excess_return * 100.0,
        output.stats.win_rate * 100.0,
        output.stats.trade_count
    );
    Ok(output.stats)
}

/// 对目录中的所有CSV数据文件逐个回测
///
/// 单个文件失败只记录警告并继续，最后生成汇总报告。
pub fn run_batch(
    input_dir: &Path,
    output_dir: &Path,
    compositor: CompositorKind,
    config: &AppConfig,
) -> Result<BatchOutcome, AppError> {
    std::fs::create_dir_all(output_dir)?;

    let mut files: Vec<PathBuf> = std::fs::read_dir(input_dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.extension()
                .map(|ext| ext.eq_ignore_ascii_case("csv"))
                .unwrap_or(false)
        })
        .collect();
    files.sort();

    if files.is_empty() {
        return Err(AppError::InsufficientData(format!(
            "目录{}中没有CSV数据文件",
            input_dir.display()
        )));
    }
    info!("找到{}个数据文件，开始批量回测", files.len());

    let mut outcome = BatchOutcome {
        success_count: 0,
        failure_count: 0,
        all_stats: Vec::new(),
    };

    for (i, path) in files.iter().enumerate() {
        info!("[{}/{}] {}", i + 1, files.len(), path.display());
        match run_single_file(path, output_dir, compositor, config) {
            Ok(stats) => {
                outcome.success_count += 1;
                outcome.all_stats.push(stats);
            }
            Err(e) => {
                outcome.failure_count += 1;
                warn!("跳过{}: {}", path.display(), e);
            }
        }
    }

    if let Err(e) = report::write_summary_reports(output_dir, &outcome.all_stats) {
        error!("生成汇总报告失败: {}", e);
    }

    info!(
        "批量回测完成: 成功{} 失败{}",
        outcome.success_count, outcome.failure_count
    );
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_sample_csv(dir: &Path, name: &str, rows: usize) {
        let mut content = String::from("date,open,high,low,close,volume\n");
        let mut price = 100.0f64;
        for i in 0..rows {
            let date = chrono::NaiveDate::from_ymd_opt(2023, 1, 1).unwrap()
                + chrono::Days::new(i as u64);
            price *= 1.0 + 0.01 * ((i as f64) * 0.5).sin();
            content.push_str(&format!(
                "{},{:.4},{:.4},{:.4},{:.4},1000\n",
                date,
                price,
                price * 1.01,
                price * 0.99,
                price
            ));
        }
        std::fs::write(dir.join(name), content).unwrap();
    }

    #[test]
    fn test_run_batch_writes_reports() {
        let input_dir = std::env::temp_dir().join("grid_quant_test_batch_in");
        let output_dir = std::env::temp_dir().join("grid_quant_test_batch_out");
        let _ = std::fs::remove_dir_all(&input_dir);
        let _ = std::fs::remove_dir_all(&output_dir);
        std::fs::create_dir_all(&input_dir).unwrap();
        std::fs::create_dir_all(&output_dir).unwrap();
        write_sample_csv(&input_dir, "AAA.csv", 60);
        write_sample_csv(&input_dir, "BBB.csv", 60);
        // 数据不足的文件应被跳过而不中断批处理
        write_sample_csv(&input_dir, "BAD.csv", 3);

        let config = AppConfig::default();
        let outcome = run_batch(&input_dir, &output_dir, CompositorKind::Trend, &config).unwrap();

        assert_eq!(outcome.success_count, 2);
        assert_eq!(outcome.failure_count, 1);
        assert!(output_dir.join("AAA_回测统计.csv").exists());
        assert!(output_dir.join("AAA_交易记录.csv").exists());
        assert!(output_dir.join("AAA_资产净值.csv").exists());
        assert!(output_dir.join("汇总明细.csv").exists());
        assert!(output_dir.join("整体统计.csv").exists());
    }

    #[test]
    fn test_run_batch_empty_dir_is_error() {
        let input_dir = std::env::temp_dir().join("grid_quant_test_batch_empty");
        let output_dir = std::env::temp_dir().join("grid_quant_test_batch_empty_out");
        std::fs::create_dir_all(&input_dir).unwrap();
        let config = AppConfig::default();
        let err =
            run_batch(&input_dir, &output_dir, CompositorKind::Score, &config).unwrap_err();
        assert!(matches!(err, AppError::InsufficientData(_)));
    }
}
