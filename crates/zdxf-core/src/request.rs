//! 导出请求
//!
//! 每次调用构造一次，构造后不可变。

use std::num::NonZeroU32;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 默认比例尺分母（1:500）
pub const DEFAULT_SCALE: u32 = 500;

/// 默认坐标系：S-JTSK / Krovak East North
pub const DEFAULT_CRS: &str = "EPSG:5514";

/// 请求构造错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RequestError {
    #[error("Scale must be a positive integer, got {0}")]
    InvalidScale(u64),

    #[error("Invalid CRS identifier: {0:?}")]
    InvalidCrs(String),

    #[error("Output filename is empty")]
    EmptyOutput,
}

/// 坐标参考系标识（如 `EPSG:5514`）
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Crs(String);

impl Crs {
    pub fn new(id: impl Into<String>) -> Result<Self, RequestError> {
        let id = id.into();
        let trimmed = id.trim();
        if trimmed.is_empty() || trimmed.contains(char::is_whitespace) {
            return Err(RequestError::InvalidCrs(id));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// 大小写无关比较（`epsg:5514` 与 `EPSG:5514` 相同）
    pub fn same_as(&self, other: &Crs) -> bool {
        self.0.eq_ignore_ascii_case(&other.0)
    }
}

impl Default for Crs {
    fn default() -> Self {
        Self(DEFAULT_CRS.to_string())
    }
}

impl TryFrom<String> for Crs {
    type Error = RequestError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Crs::new(value)
    }
}

impl From<Crs> for String {
    fn from(crs: Crs) -> Self {
        crs.0
    }
}

impl std::fmt::Display for Crs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for Crs {
    type Err = RequestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Crs::new(s)
    }
}

/// 导出请求
#[derive(Debug, Clone, PartialEq)]
pub struct ExportRequest {
    output_path: PathBuf,
    layer_names: Option<Vec<String>>,
    scale: NonZeroU32,
    crs: Crs,
}

impl ExportRequest {
    /// 创建请求
    ///
    /// 空的 `layer_names` 等同于未指定（导出所有可见图层）。
    pub fn new(
        output_path: impl Into<PathBuf>,
        layer_names: Option<Vec<String>>,
        scale: u32,
        crs: Crs,
    ) -> Result<Self, RequestError> {
        let output_path = output_path.into();
        if output_path.as_os_str().is_empty() {
            return Err(RequestError::EmptyOutput);
        }
        let scale = NonZeroU32::new(scale).ok_or(RequestError::InvalidScale(scale as u64))?;
        let layer_names = layer_names.filter(|names| !names.is_empty());

        Ok(Self {
            output_path,
            layer_names,
            scale,
            crs,
        })
    }

    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    pub fn layer_names(&self) -> Option<&[String]> {
        self.layer_names.as_deref()
    }

    pub fn scale(&self) -> u32 {
        self.scale.get()
    }

    pub fn crs(&self) -> &Crs {
        &self.crs
    }
}
