//! ZDXF 文件处理
//!
//! 支持：
//! - 读取宿主项目快照（JSON）
//! - 通过外部几何导出器生成 DXF（带能力协商与写出回退）
//! - DXF 文件头规范化（版本标记与 `$INSUNITS`）
//! - 完整的导出流水线

pub mod document;
pub mod dxf_io;
pub mod error;
pub mod export;
pub mod header;
pub mod pipeline;
pub mod project;

pub use document::DxfDocument;
pub use dxf_io::DxfDrawingExporter;
pub use error::{CollaboratorError, ExportError, FileError, PatchError};
pub use export::{
    Capability, CapabilitySet, ExportAdapter, ExportWarning, GeometryExporter, WriteStrategy,
};
pub use header::{patch, HeaderPatch, InsUnits, UnitsAction, SOURCE_VERSION, TARGET_VERSION};
pub use pipeline::{normalize_file, resolve_output_path, run_export, ExportReport, NormalizeReport};
pub use project::ProjectSnapshot;
