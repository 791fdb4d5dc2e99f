use std::path::PathBuf;

use clap::Parser;
use dotenv::dotenv;
use tracing::info;

use grid_quant::app_config::{log::setup_logging, AppConfig};
use grid_quant::trading::task::{run_batch, CompositorKind};

/// 网格+趋势组合策略批量回测工具
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// K线CSV数据目录
    #[arg(short, long, default_value = "data")]
    input_dir: PathBuf,

    /// 回测结果输出目录
    #[arg(short, long, default_value = "backtest_results")]
    output_dir: PathBuf,

    /// 配置文件路径（JSON，省略时使用默认配置）
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// 信号合成方式
    #[arg(long, value_enum, default_value = "trend")]
    compositor: CompositorKind,
}

fn main() -> anyhow::Result<()> {
    dotenv().ok();
    let _guard = setup_logging()?;

    let args = Args::parse();
    let config = match &args.config {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::default(),
    };

    info!(
        "网格+趋势组合回测 每份{:.0}元 网格{:.1}% 盈利目标{:.1}% 最大{}份",
        config.grid.grid_amount_per_unit,
        config.grid.grid_size_pct,
        config.grid.required_profit_pct,
        config.grid.max_hold_units
    );

    let outcome = run_batch(&args.input_dir, &args.output_dir, args.compositor, &config)?;
    println!(
        "回测完成! 成功 {}/{} 个文件，结果保存到 {}",
        outcome.success_count,
        outcome.success_count + outcome.failure_count,
        args.output_dir.display()
    );
    Ok(())
}
