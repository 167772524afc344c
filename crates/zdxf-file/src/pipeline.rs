//! 导出流水线
//!
//! 选择图层 → 合并范围 → 调用导出器 → 规范化文件头 → 写出文件。
//!
//! 导出器失败是致命的；文件头无法规范化时仍写出未修正的文档，
//! 并在报告中记录警告。

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, warn};
use zdxf_core::extent::combine;
use zdxf_core::layer::LayerDescriptor;
use zdxf_core::math::BoundingBox2;
use zdxf_core::request::ExportRequest;
use zdxf_core::selection::select;

use crate::document::DxfDocument;
use crate::error::{ExportError, FileError, PatchError};
use crate::export::{ExportAdapter, ExportWarning, GeometryExporter};
use crate::header::{HeaderPatch, UnitsAction};

/// 输出文件扩展名
pub const DXF_EXTENSION: &str = "dxf";

/// 导出结果
#[derive(Debug)]
pub struct ExportReport {
    pub output_path: PathBuf,
    pub selected_layers: usize,
    pub exported_layers: usize,
    pub extent: BoundingBox2,
    /// 文件头是否已规范化
    pub normalized: bool,
    pub warnings: Vec<ExportWarning>,
}

/// 单独规范化文件的结果
#[derive(Debug)]
pub struct NormalizeReport {
    pub output_path: PathBuf,
    pub version_replacements: usize,
    pub units: Option<UnitsAction>,
    pub warnings: Vec<ExportWarning>,
}

/// 计算输出路径 `{output_dir}/{base_filename}.dxf`
///
/// 未指定目录时使用 `base_dir`；已带 `.dxf` 扩展名的不再追加。
pub fn resolve_output_path(output: &Path, base_dir: &Path) -> Result<PathBuf, FileError> {
    let file_name = output
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .filter(|name| !name.trim().is_empty())
        .ok_or_else(|| {
            FileError::InvalidFormat(format!("Output has no file name: {}", output.display()))
        })?;

    let dir = match output.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            if parent.is_absolute() {
                parent.to_path_buf()
            } else {
                base_dir.join(parent)
            }
        }
        _ => base_dir.to_path_buf(),
    };

    let has_extension = Path::new(&file_name)
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case(DXF_EXTENSION));
    let file_name = if has_extension {
        file_name
    } else {
        format!("{}.{}", file_name, DXF_EXTENSION)
    };

    Ok(dir.join(file_name))
}

/// 执行一次完整导出
///
/// `layers` 是宿主项目的图层快照，流水线只读取它。
pub fn run_export<E: GeometryExporter>(
    request: &ExportRequest,
    layers: &[LayerDescriptor],
    exporter: E,
    patch: &HeaderPatch,
) -> Result<ExportReport, ExportError> {
    let cwd = std::env::current_dir()?;
    let output_path = resolve_output_path(request.output_path(), &cwd)?;

    let selected = select(request, layers);
    if selected.is_empty() {
        return Err(ExportError::NoLayersSelected);
    }
    info!("Found {} layer(s) to export", selected.len());

    let extent = combine(&selected);
    info!("Export extent: {}", extent);

    let output_dir = output_path.parent().unwrap_or(cwd.as_path()).to_path_buf();
    fs::create_dir_all(&output_dir)?;

    let mut adapter = ExportAdapter::new(exporter).with_scratch_dir(&output_dir);
    let outcome = adapter.invoke(&selected, &extent, request.scale(), request.crs())?;

    let mut warnings = outcome.warnings;
    let (document, normalized) = normalize(outcome.document, patch, &mut warnings);

    document.save(&output_path)?;
    info!("DXF file written: {}", output_path.display());

    Ok(ExportReport {
        output_path,
        selected_layers: selected.len(),
        exported_layers: outcome.vector_layers,
        extent,
        normalized,
        warnings,
    })
}

/// 规范化已有的 DXF 文件
///
/// 没有指定输出时原地替换。文件头无效时不修改任何文件，只记录警告。
pub fn normalize_file(
    input: &Path,
    output: Option<&Path>,
    patch: &HeaderPatch,
) -> Result<NormalizeReport, FileError> {
    let document = DxfDocument::load(input)?;
    let output_path = output.unwrap_or(input).to_path_buf();

    match patch.apply(&document) {
        Ok(outcome) => {
            outcome.document.save_atomic(&output_path)?;
            info!(
                "Normalized {} ({} version marker(s), units {:?})",
                output_path.display(),
                outcome.version_replacements,
                outcome.units
            );
            Ok(NormalizeReport {
                output_path,
                version_replacements: outcome.version_replacements,
                units: Some(outcome.units),
                warnings: Vec::new(),
            })
        }
        Err(PatchError::MalformedHeader(reason)) => {
            warn!("Cannot normalize {}: {}", input.display(), reason);
            if output_path != input {
                document.save_atomic(&output_path)?;
            }
            Ok(NormalizeReport {
                output_path,
                version_replacements: 0,
                units: None,
                warnings: vec![ExportWarning::MalformedHeader(reason)],
            })
        }
    }
}

fn normalize(
    document: DxfDocument,
    patch: &HeaderPatch,
    warnings: &mut Vec<ExportWarning>,
) -> (DxfDocument, bool) {
    match patch.apply(&document) {
        Ok(outcome) => {
            info!(
                "DXF version set to {} and units to code {}",
                patch.target_version, patch.units_code
            );
            (outcome.document, true)
        }
        Err(PatchError::MalformedHeader(reason)) => {
            warn!("Keeping unnormalized DXF: {}", reason);
            warnings.push(ExportWarning::MalformedHeader(reason));
            (document, false)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dxf_io::DxfDrawingExporter;
    use crate::error::CollaboratorError;
    use crate::export::{Capability, CapabilitySet};
    use crate::project::ProjectSnapshot;
    use std::io::Write;
    use zdxf_core::geometry::{Geometry, Line};
    use zdxf_core::layer::LayerKind;
    use zdxf_core::math::Point2;
    use zdxf_core::request::Crs;

    /// 只会写出固定文本的导出器
    struct FixedExporter(&'static str);

    impl GeometryExporter for FixedExporter {
        fn capabilities(&self) -> CapabilitySet {
            CapabilitySet::empty()
                .with(Capability::VectorLayers)
                .with(Capability::WriteToDevice)
        }

        fn set_vector_layers(
            &mut self,
            _layers: &[LayerDescriptor],
        ) -> Result<(), CollaboratorError> {
            Ok(())
        }

        fn write_to_device(
            &mut self,
            device: &mut dyn Write,
            _encoding: &str,
        ) -> Result<(), CollaboratorError> {
            device.write_all(self.0.as_bytes())?;
            Ok(())
        }
    }

    fn layers() -> Vec<LayerDescriptor> {
        vec![
            LayerDescriptor::new("a", "parcels", LayerKind::Vector)
                .with_extent(BoundingBox2::from_coords(0.0, 0.0, 10.0, 10.0)),
            LayerDescriptor::new("b", "ortho", LayerKind::Raster)
                .with_extent(BoundingBox2::from_coords(-5.0, -5.0, 5.0, 5.0)),
            LayerDescriptor::new("c", "hidden", LayerKind::Vector).with_visible(false),
        ]
    }

    fn request(output: &Path, names: Option<Vec<&str>>) -> ExportRequest {
        let names = names.map(|n| n.into_iter().map(String::from).collect());
        ExportRequest::new(output, names, 500, Crs::default()).unwrap()
    }

    fn units_value(text: &str) -> Option<String> {
        let lines: Vec<&str> = text.lines().collect();
        lines
            .windows(3)
            .find(|w| w[0].trim() == "$INSUNITS" && w[1].trim() == "70")
            .map(|w| w[2].trim().to_string())
    }

    #[test]
    fn test_resolve_output_path() {
        let base = Path::new("/work");
        assert_eq!(
            resolve_output_path(Path::new("plan"), base).unwrap(),
            PathBuf::from("/work/plan.dxf")
        );
        assert_eq!(
            resolve_output_path(Path::new("out/plan"), base).unwrap(),
            PathBuf::from("/work/out/plan.dxf")
        );
        assert_eq!(
            resolve_output_path(Path::new("/data/plan.DXF"), base).unwrap(),
            PathBuf::from("/data/plan.DXF")
        );
        assert_eq!(
            resolve_output_path(Path::new("plan.v2"), base).unwrap(),
            PathBuf::from("/work/plan.v2.dxf")
        );
        assert!(resolve_output_path(Path::new(""), base).is_err());
    }

    #[test]
    fn test_end_to_end_with_dxf_exporter() {
        let dir = tempfile::tempdir().unwrap();
        let project = ProjectSnapshot::new(Crs::default()).with_layer(
            LayerDescriptor::new("a", "parcels", LayerKind::Vector),
            vec![Geometry::Line(Line::new(
                Point2::new(-744_100.0, -1_043_200.0),
                Point2::new(-743_900.0, -1_043_000.0),
            ))],
        );
        let output = dir.path().join("nested/plan");

        let report = run_export(
            &request(&output, None),
            project.layers(),
            DxfDrawingExporter::new(&project),
            &HeaderPatch::default(),
        )
        .unwrap();

        assert_eq!(report.output_path, dir.path().join("nested/plan.dxf"));
        assert!(report.normalized);
        assert!(report.warnings.is_empty());
        assert_eq!(report.exported_layers, 1);
        assert_eq!(
            report.extent,
            BoundingBox2::from_coords(-744_100.0, -1_043_200.0, -743_900.0, -1_043_000.0)
        );

        let text = fs::read_to_string(&report.output_path).unwrap();
        assert!(text.contains("AC1021"));
        assert!(!text.contains("AC1015"));
        assert_eq!(units_value(&text).as_deref(), Some("6"));
        let entries: Vec<_> = fs::read_dir(dir.path().join("nested"))
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(entries, ["plan.dxf"]);
    }

    #[test]
    fn test_no_layers_selected() {
        let dir = tempfile::tempdir().unwrap();
        let err = run_export(
            &request(&dir.path().join("plan"), Some(vec!["missing"])),
            &layers(),
            FixedExporter("HEADER\nENDSEC\n"),
            &HeaderPatch::default(),
        )
        .unwrap_err();

        assert!(matches!(err, ExportError::NoLayersSelected));
        assert!(!dir.path().join("plan.dxf").exists());
    }

    #[test]
    fn test_no_vector_layers() {
        let dir = tempfile::tempdir().unwrap();
        let err = run_export(
            &request(&dir.path().join("plan"), Some(vec!["ortho"])),
            &layers(),
            FixedExporter("HEADER\nENDSEC\n"),
            &HeaderPatch::default(),
        )
        .unwrap_err();

        assert!(matches!(err, ExportError::NoVectorLayers { selected: 1 }));
        assert!(!dir.path().join("plan.dxf").exists());
    }

    #[test]
    fn test_malformed_header_keeps_raw_output() {
        let dir = tempfile::tempdir().unwrap();
        let raw = "  0\nSECTION\n  2\nENTITIES\n  0\nENDSEC\n999\nAC1015\n";

        let report = run_export(
            &request(&dir.path().join("plan"), None),
            &layers(),
            FixedExporter(raw),
            &HeaderPatch::default(),
        )
        .unwrap();

        assert!(!report.normalized);
        assert!(report
            .warnings
            .iter()
            .any(|w| matches!(w, ExportWarning::MalformedHeader(_))));
        assert_eq!(fs::read_to_string(&report.output_path).unwrap(), raw);
    }

    #[test]
    fn test_config_warnings_reported() {
        let dir = tempfile::tempdir().unwrap();

        let report = run_export(
            &request(&dir.path().join("plan"), None),
            &layers(),
            FixedExporter("HEADER\n$INSUNITS\n 70\n     0\nENDSEC\nAC1015\n"),
            &HeaderPatch::default(),
        )
        .unwrap();

        // 两个可见图层中只有一个是矢量图层
        assert_eq!(report.selected_layers, 2);
        assert_eq!(report.exported_layers, 1);
        assert_eq!(report.extent, BoundingBox2::from_coords(-5.0, -5.0, 10.0, 10.0));
        assert!(report.normalized);
        assert_eq!(report.warnings.len(), 3);
        assert_eq!(
            fs::read_to_string(&report.output_path).unwrap(),
            "HEADER\n$INSUNITS\n 70\n     6\nENDSEC\nAC1021\n"
        );
    }

    #[test]
    fn test_normalize_file_in_place() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("legacy.dxf");
        fs::write(&path, "HEADER\nENDSEC\n999\nAC1015\n").unwrap();

        let report = normalize_file(&path, None, &HeaderPatch::default()).unwrap();

        assert_eq!(report.units, Some(UnitsAction::Inserted));
        assert_eq!(report.version_replacements, 1);
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "HEADER\n$INSUNITS\n 70\n     6\nENDSEC\n999\nAC1021\n"
        );
    }

    #[test]
    fn test_normalize_file_malformed_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.dxf");
        fs::write(&path, "999\nAC1015\n").unwrap();

        let report = normalize_file(&path, None, &HeaderPatch::default()).unwrap();

        assert!(report.units.is_none());
        assert_eq!(report.warnings.len(), 1);
        assert_eq!(fs::read_to_string(&path).unwrap(), "999\nAC1015\n");
    }
}
