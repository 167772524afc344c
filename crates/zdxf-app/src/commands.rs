//! 子命令实现

use anyhow::{Context, Result};
use tracing::{info, warn};
use zdxf_core::request::{Crs, ExportRequest};
use zdxf_file::header::InsUnits;
use zdxf_file::{normalize_file, run_export, DxfDrawingExporter, ProjectSnapshot};

use crate::cli::{ExportArgs, LayersArgs, NormalizeArgs};
use crate::config::AppConfig;

/// 导出项目图层
pub fn export(args: &ExportArgs, config: &AppConfig) -> Result<()> {
    let project = ProjectSnapshot::load(&args.project)
        .with_context(|| format!("Failed to load project {}", args.project.display()))?;

    let crs = match &args.crs {
        Some(crs) => Crs::new(crs.as_str())?,
        None => config.crs()?,
    };
    let scale = args.scale.unwrap_or(config.export.scale);
    let layer_names = (!args.layers.is_empty()).then(|| args.layers.clone());
    let request = ExportRequest::new(config.output_path(&args.output), layer_names, scale, crs)?;
    let patch = config.header_patch()?;

    let exporter = DxfDrawingExporter::new(&project);
    let report = run_export(&request, project.layers(), exporter, &patch)?;

    for warning in &report.warnings {
        warn!("{}", warning);
    }
    info!(
        "Exported {} of {} selected layer(s) to {}",
        report.exported_layers,
        report.selected_layers,
        report.output_path.display()
    );
    println!("{}", report.output_path.display());
    Ok(())
}

/// 规范化已有 DXF 文件
pub fn normalize(args: &NormalizeArgs, config: &AppConfig) -> Result<()> {
    let mut patch = config.header_patch()?;
    if let Some(source) = &args.source_version {
        patch.source_version = source.trim().to_string();
    }
    if let Some(target) = &args.target_version {
        anyhow::ensure!(!target.trim().is_empty(), "Target version must not be empty");
        patch.target_version = target.trim().to_string();
    }
    if let Some(units) = &args.units {
        let units: InsUnits = units.parse()?;
        patch.units_code = units.code();
    }

    let report = normalize_file(&args.input, args.output.as_deref(), &patch)
        .with_context(|| format!("Failed to normalize {}", args.input.display()))?;

    for warning in &report.warnings {
        warn!("{}", warning);
    }
    println!("{}", report.output_path.display());
    Ok(())
}

/// 列出图层
pub fn layers(args: &LayersArgs) -> Result<()> {
    let project = ProjectSnapshot::load(&args.project)
        .with_context(|| format!("Failed to load project {}", args.project.display()))?;

    if let Some(name) = project.name() {
        println!("Project: {}", name);
    }
    println!("CRS: {}", project.crs());
    for layer in project.layers() {
        println!(
            "{}\t{}\t{}\t{}",
            layer.name,
            layer.kind,
            if layer.visible { "visible" } else { "hidden" },
            layer.extent
        );
    }
    Ok(())
}
