//! 错误定义
//!
//! - [`FileError`]: 文件读写与快照解析
//! - [`PatchError`]: 文件头规范化（非致命，见流水线）
//! - [`CollaboratorError`]: 外部导出器单次调用的失败
//! - [`ExportError`]: 导出流水线的致命错误

use thiserror::Error;

use crate::export::StrategyFailure;

#[derive(Error, Debug)]
pub enum FileError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Document is not valid UTF-8: {0}")]
    Encoding(#[from] std::string::FromUtf8Error),

    #[error("Invalid file format: {0}")]
    InvalidFormat(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PatchError {
    #[error("Malformed header: {0}")]
    MalformedHeader(String),
}

#[derive(Error, Debug)]
pub enum CollaboratorError {
    #[error("operation not supported by the exporter")]
    Unsupported,

    #[error("rejected by the exporter: {0}")]
    Rejected(String),

    #[error("exporter produced no result")]
    NoResult,

    #[error("exporter produced invalid output: {0}")]
    InvalidOutput(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("DXF error: {0}")]
    Dxf(String),
}

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("No layers selected for export")]
    NoLayersSelected,

    #[error("No vector layers among the {selected} selected layer(s)")]
    NoVectorLayers { selected: usize },

    #[error("Export failed: {}", describe_attempts(.attempts))]
    ExportFailed { attempts: Vec<StrategyFailure> },

    #[error(transparent)]
    File(#[from] FileError),
}

impl From<std::io::Error> for ExportError {
    fn from(err: std::io::Error) -> Self {
        ExportError::File(FileError::Io(err))
    }
}

fn describe_attempts(attempts: &[StrategyFailure]) -> String {
    if attempts.is_empty() {
        return "exporter offers no way to write a document".to_string();
    }
    attempts
        .iter()
        .map(|a| a.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}
