use thiserror::Error;

/// apicompat 的错误类型定义
///
/// 只有配置错误和 I/O 层面的失败会以错误的形式向上传播并终止运行，
/// 遍历过程中可恢复的问题（如无法解析的引用）以诊断信息的形式累积。
#[derive(Error, Debug)]
pub enum ApiCompatError {
    #[error("File I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Suppression file error: {0}")]
    SuppressionFileError(String),

    #[error("Failed to load symbols: {0}")]
    SymbolLoadError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Invalid transformation pattern: {0}")]
    PatternError(String),
}

/// 项目通用的 Result 类型别名
pub type Result<T> = std::result::Result<T, ApiCompatError>;
