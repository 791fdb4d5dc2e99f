//! 回测全流程集成测试
//!
//! 从CSV数据文件出发，走完 读取 -> 清洗 -> 信号合成 -> 模拟 -> 报告 的完整链路。

use std::path::PathBuf;

use grid_quant::app_config::AppConfig;
use grid_quant::trading::backtest::run_backtest;
use grid_quant::trading::market::{clean_bars, load_bars_from_csv};
use grid_quant::trading::signal::trend_compositor::TrendCompositor;
use grid_quant::trading::task::{run_batch, CompositorKind};

fn temp_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(name);
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

fn write_wave_csv(dir: &std::path::Path, name: &str, rows: usize) {
    let mut content = String::from("date,open,high,low,close,volume\n");
    let mut price = 100.0f64;
    for i in 0..rows {
        let date =
            chrono::NaiveDate::from_ymd_opt(2022, 1, 1).unwrap() + chrono::Days::new(i as u64);
        price *= 1.0 + 0.012 * ((i as f64) * 0.4).sin();
        content.push_str(&format!(
            "{},{:.4},{:.4},{:.4},{:.4},{}\n",
            date,
            price,
            price * 1.01,
            price * 0.99,
            price,
            1000 + i * 10
        ));
    }
    std::fs::write(dir.join(name), content).unwrap();
}

#[test]
fn test_single_file_pipeline() {
    let dir = temp_dir("grid_quant_it_single");
    write_wave_csv(&dir, "ETF510300.csv", 120);

    let config = AppConfig::default();
    let bars = load_bars_from_csv(&dir.join("ETF510300.csv")).unwrap();
    let bars = clean_bars(bars, config.backtest_start_date).unwrap();
    assert_eq!(bars.len(), 120);

    let judgments = TrendCompositor::compute(&bars, &config.tech).unwrap();
    assert_eq!(judgments.len(), bars.len());

    let output = run_backtest("ETF510300", &bars, &judgments, &config).unwrap();
    assert_eq!(output.equity_curve.len(), bars.len());
    assert!(!output.trades.is_empty());
    assert_eq!(output.stats.symbol, "ETF510300");
    // 净值曲线与最终结算自洽
    let last = output.equity_curve.last().unwrap();
    assert!((last.equity - output.stats.final_equity).abs() < 1e-6);
}

#[test]
fn test_batch_pipeline_with_both_compositors() {
    for (kind, name) in [
        (CompositorKind::Trend, "grid_quant_it_batch_trend"),
        (CompositorKind::Score, "grid_quant_it_batch_score"),
    ] {
        let input_dir = temp_dir(&format!("{}_in", name));
        let output_dir = temp_dir(&format!("{}_out", name));
        write_wave_csv(&input_dir, "AAA.csv", 100);
        write_wave_csv(&input_dir, "BBB.csv", 100);

        let config = AppConfig::default();
        let outcome = run_batch(&input_dir, &output_dir, kind, &config).unwrap();
        assert_eq!(outcome.success_count, 2);
        assert_eq!(outcome.failure_count, 0);
        assert!(output_dir.join("汇总明细.csv").exists());
        assert!(output_dir.join("整体统计.csv").exists());

        let detail = std::fs::read_to_string(output_dir.join("汇总明细.csv")).unwrap();
        assert_eq!(detail.lines().count(), 3);
    }
}

#[test]
fn test_pipeline_determinism() {
    let dir = temp_dir("grid_quant_it_determinism");
    write_wave_csv(&dir, "CCC.csv", 90);

    let config = AppConfig::default();
    let bars = load_bars_from_csv(&dir.join("CCC.csv")).unwrap();
    let bars = clean_bars(bars, config.backtest_start_date).unwrap();
    let judgments = TrendCompositor::compute(&bars, &config.tech).unwrap();

    let a = run_backtest("CCC", &bars, &judgments, &config).unwrap();
    let b = run_backtest("CCC", &bars, &judgments, &config).unwrap();
    assert_eq!(a.trades, b.trades);
    assert_eq!(a.equity_curve, b.equity_curve);
}
