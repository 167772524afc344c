//! 外部几何导出器的调用
//!
//! 导出器在不同版本间提供的接口并不一致。这里不在每次调用时临时探测，
//! 而是由导出器声明一个 [`CapabilitySet`]，[`ExportAdapter`] 在构造时一次性
//! 解析出 [`CallPlan`]：用哪个坐标系调用、哪个图层调用、按什么顺序尝试写出。
//!
//! 配置类调用（比例尺、坐标系、图层集、范围）都是尽力而为：不支持或被拒绝时
//! 跳过并记录警告，不会中止导出。写出则按 [`WriteStrategy`] 顺序逐个尝试，
//! 每次失败都保留为 [`StrategyFailure`]。

use std::collections::HashSet;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};
use zdxf_core::layer::LayerDescriptor;
use zdxf_core::math::BoundingBox2;
use zdxf_core::request::Crs;

use crate::document::DxfDocument;
use crate::error::{CollaboratorError, ExportError};

/// 写出时使用的文本编码
pub const OUTPUT_ENCODING: &str = "UTF-8";

/// 导出器能力
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    /// 设置符号比例尺
    SymbologyScale,
    /// 设置源坐标系（新接口）
    SourceCrs,
    /// 设置坐标系（旧接口）
    LegacyCrs,
    /// 设置矢量图层（新接口）
    VectorLayers,
    /// 设置图层（旧接口）
    LegacyLayers,
    /// 设置导出范围
    Extent,
    /// 写入输出流
    WriteToDevice,
    /// 写入文件路径
    WriteToPath,
}

impl Capability {
    fn bit(self) -> u16 {
        1 << (self as u16)
    }
}

/// 能力集合
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CapabilitySet(u16);

impl CapabilitySet {
    pub fn empty() -> Self {
        Self(0)
    }

    pub fn with(self, capability: Capability) -> Self {
        Self(self.0 | capability.bit())
    }

    pub fn contains(&self, capability: Capability) -> bool {
        self.0 & capability.bit() != 0
    }
}

impl FromIterator<Capability> for CapabilitySet {
    fn from_iter<I: IntoIterator<Item = Capability>>(iter: I) -> Self {
        iter.into_iter().fold(Self::empty(), Self::with)
    }
}

/// 外部几何导出器
///
/// 默认实现均返回 [`CollaboratorError::Unsupported`]，
/// 实现者只需覆盖 [`capabilities`](Self::capabilities) 中声明的调用。
pub trait GeometryExporter {
    /// 用于日志的名称
    fn name(&self) -> &str {
        "exporter"
    }

    fn capabilities(&self) -> CapabilitySet;

    fn set_symbology_scale(&mut self, _scale: u32) -> Result<(), CollaboratorError> {
        Err(CollaboratorError::Unsupported)
    }

    fn set_source_crs(&mut self, _crs: &Crs) -> Result<(), CollaboratorError> {
        Err(CollaboratorError::Unsupported)
    }

    fn set_crs(&mut self, _crs: &Crs) -> Result<(), CollaboratorError> {
        Err(CollaboratorError::Unsupported)
    }

    fn set_vector_layers(&mut self, _layers: &[LayerDescriptor]) -> Result<(), CollaboratorError> {
        Err(CollaboratorError::Unsupported)
    }

    fn set_layers(&mut self, _layers: &[LayerDescriptor]) -> Result<(), CollaboratorError> {
        Err(CollaboratorError::Unsupported)
    }

    fn set_extent(&mut self, _extent: &BoundingBox2) -> Result<(), CollaboratorError> {
        Err(CollaboratorError::Unsupported)
    }

    fn write_to_device(
        &mut self,
        _device: &mut dyn Write,
        _encoding: &str,
    ) -> Result<(), CollaboratorError> {
        Err(CollaboratorError::Unsupported)
    }

    fn write_to_path(&mut self, _path: &Path) -> Result<(), CollaboratorError> {
        Err(CollaboratorError::Unsupported)
    }
}

/// 配置类调用
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigCall {
    SymbologyScale,
    Crs,
    Layers,
    Extent,
}

impl std::fmt::Display for ConfigCall {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ConfigCall::SymbologyScale => "symbology scale",
            ConfigCall::Crs => "coordinate reference system",
            ConfigCall::Layers => "layer set",
            ConfigCall::Extent => "extent",
        };
        f.write_str(name)
    }
}

/// 坐标系调用方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrsCall {
    Source,
    Legacy,
}

/// 图层调用方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerCall {
    Vector,
    Legacy,
}

/// 写出策略
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteStrategy {
    /// 写入内存缓冲区
    Device,
    /// 写入临时文件后读回
    Path,
}

impl std::fmt::Display for WriteStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WriteStrategy::Device => f.write_str("device"),
            WriteStrategy::Path => f.write_str("path"),
        }
    }
}

/// 单个写出策略的失败
#[derive(Debug)]
pub struct StrategyFailure {
    pub strategy: WriteStrategy,
    pub error: CollaboratorError,
}

impl std::fmt::Display for StrategyFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} write {}", self.strategy, self.error)
    }
}

/// 导出过程中的非致命问题
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportWarning {
    /// 导出器不支持或拒绝了某个配置调用
    CollaboratorConfigUnsupported { call: ConfigCall, reason: String },
    /// 文件头无法规范化，输出未经修正的文档
    MalformedHeader(String),
}

impl std::fmt::Display for ExportWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExportWarning::CollaboratorConfigUnsupported { call, reason } => {
                write!(f, "could not set {}: {}", call, reason)
            }
            ExportWarning::MalformedHeader(reason) => {
                write!(f, "DXF header left unnormalized: {}", reason)
            }
        }
    }
}

/// 根据能力集解析出的调用计划
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallPlan {
    pub scale: bool,
    pub crs: Option<CrsCall>,
    pub layers: Option<LayerCall>,
    pub extent: bool,
    pub writers: Vec<WriteStrategy>,
}

impl CallPlan {
    /// 新接口优先于旧接口；写出先尝试输出流再尝试文件路径
    pub fn resolve(capabilities: CapabilitySet) -> Self {
        let crs = if capabilities.contains(Capability::SourceCrs) {
            Some(CrsCall::Source)
        } else if capabilities.contains(Capability::LegacyCrs) {
            Some(CrsCall::Legacy)
        } else {
            None
        };

        let layers = if capabilities.contains(Capability::VectorLayers) {
            Some(LayerCall::Vector)
        } else if capabilities.contains(Capability::LegacyLayers) {
            Some(LayerCall::Legacy)
        } else {
            None
        };

        let writers = [
            (Capability::WriteToDevice, WriteStrategy::Device),
            (Capability::WriteToPath, WriteStrategy::Path),
        ]
        .into_iter()
        .filter(|(capability, _)| capabilities.contains(*capability))
        .map(|(_, strategy)| strategy)
        .collect();

        Self {
            scale: capabilities.contains(Capability::SymbologyScale),
            crs,
            layers,
            extent: capabilities.contains(Capability::Extent),
            writers,
        }
    }
}

/// 一次成功导出的结果
#[derive(Debug)]
pub struct ExportOutcome {
    pub document: DxfDocument,
    pub vector_layers: usize,
    pub strategy: WriteStrategy,
    pub warnings: Vec<ExportWarning>,
}

/// 导出器适配器
pub struct ExportAdapter<E: GeometryExporter> {
    exporter: E,
    plan: CallPlan,
    scratch_dir: PathBuf,
}

impl<E: GeometryExporter> ExportAdapter<E> {
    pub fn new(exporter: E) -> Self {
        let plan = CallPlan::resolve(exporter.capabilities());
        debug!(exporter = exporter.name(), ?plan, "Resolved exporter call plan");
        Self {
            exporter,
            plan,
            scratch_dir: std::env::temp_dir(),
        }
    }

    /// 文件路径策略的临时文件所在目录
    ///
    /// 每次写出都在其中新建一个唯一命名的临时文件，读回后删除。
    pub fn with_scratch_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.scratch_dir = dir.into();
        self
    }

    pub fn exporter(&self) -> &E {
        &self.exporter
    }

    /// 调用导出器生成原始 DXF 文档
    ///
    /// 只有矢量图层会交给导出器（按 `id` 去重）；没有矢量图层时直接返回
    /// [`ExportError::NoVectorLayers`]，不会调用导出器。
    pub fn invoke(
        &mut self,
        layers: &[LayerDescriptor],
        extent: &BoundingBox2,
        scale: u32,
        crs: &Crs,
    ) -> Result<ExportOutcome, ExportError> {
        let vector_layers = vector_layers(layers);
        if vector_layers.is_empty() {
            return Err(ExportError::NoVectorLayers {
                selected: layers.len(),
            });
        }

        info!(
            "Exporting {} vector layer(s) with {}",
            vector_layers.len(),
            self.exporter.name()
        );

        let mut warnings = Vec::new();
        self.configure(&vector_layers, extent, scale, crs, &mut warnings);

        let mut attempts = Vec::new();
        for strategy in self.plan.writers.clone() {
            match self.write_with(strategy) {
                Ok(document) => {
                    info!("Exporter wrote {} bytes via {} strategy", document.len(), strategy);
                    return Ok(ExportOutcome {
                        document,
                        vector_layers: vector_layers.len(),
                        strategy,
                        warnings,
                    });
                }
                Err(error) => {
                    warn!("Export via {} strategy failed: {}", strategy, error);
                    attempts.push(StrategyFailure { strategy, error });
                }
            }
        }

        Err(ExportError::ExportFailed { attempts })
    }

    fn configure(
        &mut self,
        layers: &[LayerDescriptor],
        extent: &BoundingBox2,
        scale: u32,
        crs: &Crs,
        warnings: &mut Vec<ExportWarning>,
    ) {
        let exporter = &mut self.exporter;

        let result = if self.plan.scale {
            exporter.set_symbology_scale(scale)
        } else {
            Err(CollaboratorError::Unsupported)
        };
        record(ConfigCall::SymbologyScale, result, warnings);

        let result = match self.plan.crs {
            Some(CrsCall::Source) => exporter.set_source_crs(crs),
            Some(CrsCall::Legacy) => exporter.set_crs(crs),
            None => Err(CollaboratorError::Unsupported),
        };
        record(ConfigCall::Crs, result, warnings);

        let result = match self.plan.layers {
            Some(LayerCall::Vector) => exporter.set_vector_layers(layers),
            Some(LayerCall::Legacy) => exporter.set_layers(layers),
            None => Err(CollaboratorError::Unsupported),
        };
        record(ConfigCall::Layers, result, warnings);

        // 空范围没有意义，不传给导出器
        if !extent.is_empty() {
            let result = if self.plan.extent {
                exporter.set_extent(extent)
            } else {
                Err(CollaboratorError::Unsupported)
            };
            record(ConfigCall::Extent, result, warnings);
        }
    }

    fn write_with(&mut self, strategy: WriteStrategy) -> Result<DxfDocument, CollaboratorError> {
        let bytes = match strategy {
            WriteStrategy::Device => {
                let mut buffer = Vec::new();
                self.exporter.write_to_device(&mut buffer, OUTPUT_ENCODING)?;
                buffer
            }
            WriteStrategy::Path => {
                // 离开作用域时删除
                let scratch = tempfile::Builder::new()
                    .prefix(".zdxf-")
                    .suffix(".dxf.partial")
                    .tempfile_in(&self.scratch_dir)?
                    .into_temp_path();
                self.exporter.write_to_path(&scratch)?;
                fs::read(&scratch)?
            }
        };

        let document = DxfDocument::from_bytes(bytes)
            .map_err(|e| CollaboratorError::InvalidOutput(e.to_string()))?;
        if document.is_empty() {
            return Err(CollaboratorError::NoResult);
        }
        Ok(document)
    }
}

fn record(
    call: ConfigCall,
    result: Result<(), CollaboratorError>,
    warnings: &mut Vec<ExportWarning>,
) {
    if let Err(error) = result {
        warn!("Could not set {} on exporter: {}", call, error);
        warnings.push(ExportWarning::CollaboratorConfigUnsupported {
            call,
            reason: error.to_string(),
        });
    }
}

/// 筛选矢量图层，按 id 去重并保持顺序
fn vector_layers(layers: &[LayerDescriptor]) -> Vec<LayerDescriptor> {
    let mut seen = HashSet::new();
    layers
        .iter()
        .filter(|layer| layer.kind.is_vector())
        .filter(|layer| seen.insert(layer.id.as_str()))
        .cloned()
        .collect()
}
