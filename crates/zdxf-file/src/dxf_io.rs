//! 基于 `dxf` crate 的几何导出器
//!
//! 把项目快照中的矢量图层写成 AutoCAD R2000 (`AC1015`) 格式的 DXF，
//! 版本和单位由之后的文件头规范化修正。

use std::io::Write;

use zdxf_core::geometry::Geometry;
use zdxf_core::layer::LayerDescriptor;
use zdxf_core::math::BoundingBox2;
use zdxf_core::request::Crs;

use crate::error::CollaboratorError;
use crate::export::{Capability, CapabilitySet, GeometryExporter, OUTPUT_ENCODING};
use crate::project::ProjectSnapshot;

/// DXF 图层名中不允许出现的字符
const INVALID_LAYER_CHARS: &[char] = &[
    '<', '>', '/', '\\', '"', ':', ';', '?', '*', '|', '=', '\'',
];

/// 使用 `dxf` crate 的导出器
pub struct DxfDrawingExporter<'a> {
    project: &'a ProjectSnapshot,
    layers: Vec<LayerDescriptor>,
    extent: Option<BoundingBox2>,
    line_type_scale: Option<f64>,
}

impl<'a> DxfDrawingExporter<'a> {
    pub fn new(project: &'a ProjectSnapshot) -> Self {
        Self {
            project,
            layers: Vec::new(),
            extent: None,
            line_type_scale: None,
        }
    }

    /// 构建图纸
    fn build_drawing(&self) -> dxf::Drawing {
        let mut drawing = dxf::Drawing::new();
        drawing.header.version = dxf::enums::AcadVersion::R2000;
        if let Some(scale) = self.line_type_scale {
            drawing.header.line_type_scale = scale;
        }

        let mut written = 0usize;
        let mut clipped = 0usize;

        for layer in &self.layers {
            let layer_name = dxf_layer_name(&layer.name);

            let mut dxf_layer = dxf::tables::Layer::default();
            dxf_layer.name = layer_name.clone();
            drawing.add_layer(dxf_layer);

            for geometry in self.project.features(&layer.id) {
                if let Some(extent) = &self.extent {
                    if !geometry.bounding_box().intersects(extent) {
                        clipped += 1;
                        continue;
                    }
                }
                if let Some(entity) = convert_to_dxf_entity(geometry, &layer_name) {
                    drawing.add_entity(entity);
                    written += 1;
                }
            }
        }

        tracing::debug!(
            "Built drawing with {} layer(s), {} entities ({} outside extent)",
            self.layers.len(),
            written,
            clipped
        );

        drawing
    }
}

impl GeometryExporter for DxfDrawingExporter<'_> {
    fn name(&self) -> &str {
        "dxf drawing exporter"
    }

    fn capabilities(&self) -> CapabilitySet {
        [
            Capability::SymbologyScale,
            Capability::SourceCrs,
            Capability::VectorLayers,
            Capability::Extent,
            Capability::WriteToDevice,
        ]
        .into_iter()
        .collect()
    }

    /// 比例尺分母换算为线型比例（毫米线型 → 米）
    fn set_symbology_scale(&mut self, scale: u32) -> Result<(), CollaboratorError> {
        if scale == 0 {
            return Err(CollaboratorError::Rejected("scale must be positive".to_string()));
        }
        self.line_type_scale = Some(f64::from(scale) / 1000.0);
        Ok(())
    }

    /// 不做投影变换，只接受与项目相同的坐标系
    fn set_source_crs(&mut self, crs: &Crs) -> Result<(), CollaboratorError> {
        if crs.same_as(self.project.crs()) {
            Ok(())
        } else {
            Err(CollaboratorError::Rejected(format!(
                "cannot reproject from {} to {}",
                self.project.crs(),
                crs
            )))
        }
    }

    fn set_vector_layers(&mut self, layers: &[LayerDescriptor]) -> Result<(), CollaboratorError> {
        self.layers = layers.to_vec();
        Ok(())
    }

    fn set_extent(&mut self, extent: &BoundingBox2) -> Result<(), CollaboratorError> {
        self.extent = Some(*extent);
        Ok(())
    }

    fn write_to_device(
        &mut self,
        device: &mut dyn Write,
        encoding: &str,
    ) -> Result<(), CollaboratorError> {
        if !encoding.eq_ignore_ascii_case(OUTPUT_ENCODING) {
            return Err(CollaboratorError::Rejected(format!(
                "unsupported encoding {}",
                encoding
            )));
        }

        let drawing = self.build_drawing();
        let mut buffer = Vec::new();
        drawing
            .save(&mut buffer)
            .map_err(|e| CollaboratorError::Dxf(e.to_string()))?;
        device.write_all(&buffer)?;
        Ok(())
    }
}

/// 替换 DXF 图层名中的非法字符
fn dxf_layer_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| if INVALID_LAYER_CHARS.contains(&c) { '_' } else { c })
        .collect();
    let cleaned = cleaned.trim().to_string();
    if cleaned.is_empty() {
        "0".to_string()
    } else {
        cleaned
    }
}

/// 将几何转换为DXF实体
fn convert_to_dxf_entity(geometry: &Geometry, layer_name: &str) -> Option<dxf::entities::Entity> {
    let specific = match geometry {
        Geometry::Point(point) => {
            let mut dxf_point = dxf::entities::ModelPoint::default();
            dxf_point.location = dxf::Point::new(point.position.x, point.position.y, 0.0);
            dxf::entities::EntityType::ModelPoint(dxf_point)
        }

        Geometry::Line(line) => {
            let mut dxf_line = dxf::entities::Line::default();
            dxf_line.p1 = dxf::Point::new(line.start.x, line.start.y, 0.0);
            dxf_line.p2 = dxf::Point::new(line.end.x, line.end.y, 0.0);
            dxf::entities::EntityType::Line(dxf_line)
        }

        Geometry::Polyline(polyline) => {
            // 少于两个顶点的多段线没有几何意义
            if polyline.vertices.len() < 2 {
                return None;
            }
            let mut lwpoly = dxf::entities::LwPolyline::default();
            lwpoly.set_is_closed(polyline.closed);
            lwpoly.vertices = polyline
                .vertices
                .iter()
                .map(|p| {
                    let mut vertex = dxf::LwPolylineVertex::default();
                    vertex.x = p.x;
                    vertex.y = p.y;
                    vertex
                })
                .collect();
            dxf::entities::EntityType::LwPolyline(lwpoly)
        }

        Geometry::Circle(circle) => {
            let mut dxf_circle = dxf::entities::Circle::default();
            dxf_circle.center = dxf::Point::new(circle.center.x, circle.center.y, 0.0);
            dxf_circle.radius = circle.radius.abs();
            dxf::entities::EntityType::Circle(dxf_circle)
        }
    };

    let mut entity = dxf::entities::Entity::new(specific);
    entity.common.layer = layer_name.to_string();
    Some(entity)
}
