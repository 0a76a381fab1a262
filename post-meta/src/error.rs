use std::path::PathBuf;
use thiserror::Error;

/// 元数据查询错误
#[derive(Debug, Error)]
pub enum MetaError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid content export: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid content export: {0}")]
    Invalid(String),
}
