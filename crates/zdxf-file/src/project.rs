//! 宿主项目快照
//!
//! 流水线不访问宿主的运行时状态，只读取一份不可变的快照：
//! 坐标系、按宿主顺序排列的图层描述符，以及矢量图层的要素。
//!
//! # JSON 格式
//!
//! ```json
//! {
//!   "name": "katastr",
//!   "crs": "EPSG:5514",
//!   "layers": [
//!     {
//!       "id": "parcels_3f2a",
//!       "name": "parcels",
//!       "kind": "vector",
//!       "visible": true,
//!       "extent": { "min_x": -744100.0, "min_y": -1043200.0, "max_x": -743900.0, "max_y": -1043000.0 },
//!       "features": [
//!         { "type": "Line", "start": [-744100.0, -1043200.0], "end": [-743900.0, -1043000.0] }
//!       ]
//!     }
//!   ]
//! }
//! ```
//!
//! 省略 `extent` 时取要素包围盒的并集。

use std::collections::{HashMap, HashSet};
use std::path::Path;

use serde::Deserialize;
use zdxf_core::geometry::Geometry;
use zdxf_core::layer::{LayerDescriptor, LayerKind};
use zdxf_core::math::BoundingBox2;
use zdxf_core::request::Crs;

use crate::error::FileError;

#[derive(Debug, Deserialize)]
struct SnapshotFile {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    crs: Crs,
    layers: Vec<LayerEntry>,
}

#[derive(Debug, Deserialize)]
struct LayerEntry {
    id: String,
    name: String,
    kind: LayerKind,
    #[serde(default = "default_visible")]
    visible: bool,
    #[serde(default)]
    extent: BoundingBox2,
    #[serde(default)]
    features: Vec<Geometry>,
}

fn default_visible() -> bool {
    true
}

/// 宿主项目快照
#[derive(Debug, Clone, Default)]
pub struct ProjectSnapshot {
    name: Option<String>,
    crs: Crs,
    layers: Vec<LayerDescriptor>,
    features: HashMap<String, Vec<Geometry>>,
}

impl ProjectSnapshot {
    pub fn new(crs: Crs) -> Self {
        Self {
            crs,
            ..Self::default()
        }
    }

    /// 添加图层；范围为空时由要素计算
    pub fn with_layer(mut self, mut layer: LayerDescriptor, features: Vec<Geometry>) -> Self {
        if layer.extent.is_empty() {
            layer.extent = features
                .iter()
                .fold(BoundingBox2::empty(), |acc, g| acc.union(&g.bounding_box()));
        }
        if !features.is_empty() {
            self.features.insert(layer.id.clone(), features);
        }
        self.layers.push(layer);
        self
    }

    /// 从文件加载
    pub fn load(path: &Path) -> Result<Self, FileError> {
        let text = std::fs::read_to_string(path)?;
        let snapshot = Self::from_json(&text)?;
        tracing::info!(
            "Loaded project snapshot with {} layer(s) from {}",
            snapshot.layers.len(),
            path.display()
        );
        Ok(snapshot)
    }

    pub fn from_json(text: &str) -> Result<Self, FileError> {
        let file: SnapshotFile = serde_json::from_str(text)?;

        let mut seen = HashSet::new();
        for entry in &file.layers {
            if !seen.insert(entry.id.as_str()) {
                return Err(FileError::InvalidFormat(format!(
                    "Duplicate layer id: {}",
                    entry.id
                )));
            }
        }

        let mut snapshot = Self::new(file.crs);
        snapshot.name = file.name;
        for entry in file.layers {
            let layer = LayerDescriptor::new(entry.id, entry.name, entry.kind)
                .with_visible(entry.visible)
                .with_extent(entry.extent);
            snapshot = snapshot.with_layer(layer, entry.features);
        }
        Ok(snapshot)
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn crs(&self) -> &Crs {
        &self.crs
    }

    /// 按宿主顺序排列的图层
    pub fn layers(&self) -> &[LayerDescriptor] {
        &self.layers
    }

    /// 图层的要素，没有要素时为空
    pub fn features(&self, layer_id: &str) -> &[Geometry] {
        self.features
            .get(layer_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}
