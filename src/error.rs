use thiserror::Error;

/// 库内统一错误类型。命令行层再用 anyhow 包一层上下文（文件路径等）。
#[derive(Error, Debug)]
pub enum Error {
    /// Cellosaurus 文本格式违规，整个加载中止
    #[error("{0}")]
    MalformedRecord(String),
    #[error("invalid marker name(s): {0}")]
    InvalidMarker(String),
    #[error("list of marker names includes markers from different species: {0}")]
    MixedSpecies(String),
    #[error("{0}")]
    InvalidArgument(String),
    #[error("unexpected allele '{0}'")]
    InvalidAllele(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Csv(#[from] csv::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
