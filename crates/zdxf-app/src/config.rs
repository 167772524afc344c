//! 配置文件
//!
//! ```toml
//! [export]
//! scale = 500
//! crs = "EPSG:5514"
//! output_dir = "out"
//!
//! [normalize]
//! source_version = "AC1015"
//! target_version = "AC1021"
//! units = "meters"        # 或数字代码
//! ```
//!
//! 所有字段都可省略。命令行参数优先于配置文件。

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use zdxf_core::request::{Crs, RequestError, DEFAULT_CRS, DEFAULT_SCALE};
use zdxf_file::header::{HeaderPatch, InsUnits, SOURCE_VERSION, TARGET_VERSION};

/// 默认配置文件名
pub const DEFAULT_CONFIG_FILE: &str = "zdxf.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Scale must be a positive integer")]
    InvalidScale,

    #[error(transparent)]
    InvalidCrs(#[from] RequestError),

    #[error("Unknown drawing units: {0}")]
    UnknownUnits(String),

    #[error("Version marker {field} must be a non-empty token")]
    InvalidVersion { field: &'static str },
}

/// 应用配置
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub export: ExportConfig,
    pub normalize: NormalizeConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExportConfig {
    /// 比例尺分母
    pub scale: u32,
    pub crs: String,
    /// 相对输出路径的基准目录
    pub output_dir: Option<PathBuf>,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            scale: DEFAULT_SCALE,
            crs: DEFAULT_CRS.to_string(),
            output_dir: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NormalizeConfig {
    pub source_version: String,
    pub target_version: String,
    pub units: UnitsSetting,
}

impl Default for NormalizeConfig {
    fn default() -> Self {
        Self {
            source_version: SOURCE_VERSION.to_string(),
            target_version: TARGET_VERSION.to_string(),
            units: UnitsSetting::Name(InsUnits::Meters.name().to_string()),
        }
    }
}

/// 单位可以写成名称或数字代码
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum UnitsSetting {
    Code(i64),
    Name(String),
}

impl UnitsSetting {
    pub fn resolve(&self) -> Result<InsUnits, ConfigError> {
        match self {
            UnitsSetting::Code(code) => i32::try_from(*code)
                .ok()
                .and_then(InsUnits::from_code)
                .ok_or_else(|| ConfigError::UnknownUnits(code.to_string())),
            UnitsSetting::Name(name) => name
                .parse()
                .map_err(|_| ConfigError::UnknownUnits(name.clone())),
        }
    }
}

impl AppConfig {
    /// 加载配置
    ///
    /// 未指定路径时尝试默认文件，默认文件不存在则使用默认配置。
    /// 显式指定的文件必须存在。
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let (path, explicit) = match path {
            Some(path) => (path.to_path_buf(), true),
            None => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
        };

        if !explicit && !path.exists() {
            tracing::debug!("No {} found, using defaults", DEFAULT_CONFIG_FILE);
            return Ok(Self::default());
        }

        let text = std::fs::read_to_string(&path).map_err(|source| ConfigError::Io {
            path: path.clone(),
            source,
        })?;
        let config = Self::from_toml(&text)?;
        tracing::info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.export.scale == 0 {
            return Err(ConfigError::InvalidScale);
        }
        self.crs()?;
        self.normalize.units.resolve()?;
        validate_version("source_version", &self.normalize.source_version)?;
        validate_version("target_version", &self.normalize.target_version)?;
        Ok(())
    }

    pub fn crs(&self) -> Result<Crs, ConfigError> {
        Ok(Crs::new(self.export.crs.as_str())?)
    }

    /// 相对输出路径放在 `output_dir` 下
    pub fn output_path(&self, output: &Path) -> PathBuf {
        match &self.export.output_dir {
            Some(dir) if output.is_relative() => dir.join(output),
            _ => output.to_path_buf(),
        }
    }

    pub fn header_patch(&self) -> Result<HeaderPatch, ConfigError> {
        let units = self.normalize.units.resolve()?;
        Ok(
            HeaderPatch::new(self.normalize.target_version.trim(), units.code())
                .with_source_version(self.normalize.source_version.trim()),
        )
    }
}

fn validate_version(field: &'static str, value: &str) -> Result<(), ConfigError> {
    let value = value.trim();
    if value.is_empty() || value.contains(char::is_whitespace) {
        return Err(ConfigError::InvalidVersion { field });
    }
    Ok(())
}
