use thiserror::Error;

/// 应用错误
#[derive(Error, Debug)]
pub enum AppError {
    /// 数据不足，无法进行计算或回测
    #[error("数据不足: {0}")]
    InsufficientData(String),

    /// 输入数据缺少必要字段
    #[error("缺少必要列: {0}")]
    MissingColumn(String),

    /// 数据解析错误
    #[error("数据解析错误: {0}")]
    ParseError(String),

    /// 配置错误
    #[error("配置错误: {0}")]
    Config(String),

    /// IO错误
    #[error("IO错误: {0}")]
    Io(#[from] std::io::Error),

    /// CSV读写错误
    #[error("CSV错误: {0}")]
    Csv(#[from] csv::Error),
}
