//! 图层描述
//!
//! 宿主项目提供的只读图层视图。图层以 `id` 标识，`name` 不保证唯一。

use crate::math::BoundingBox2;
use serde::{Deserialize, Serialize};

/// 图层类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayerKind {
    Vector,
    Raster,
    Other,
}

impl LayerKind {
    pub fn is_vector(self) -> bool {
        matches!(self, LayerKind::Vector)
    }
}

impl std::fmt::Display for LayerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            LayerKind::Vector => "vector",
            LayerKind::Raster => "raster",
            LayerKind::Other => "other",
        };
        f.write_str(name)
    }
}

/// 图层描述符
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerDescriptor {
    /// 唯一标识
    pub id: String,
    /// 显示名称
    pub name: String,
    /// 图层类型
    pub kind: LayerKind,
    /// 是否可见
    #[serde(default = "default_visible")]
    pub visible: bool,
    /// 图层范围，缺省为空
    #[serde(default)]
    pub extent: BoundingBox2,
}

fn default_visible() -> bool {
    true
}

impl LayerDescriptor {
    pub fn new(id: impl Into<String>, name: impl Into<String>, kind: LayerKind) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind,
            visible: true,
            extent: BoundingBox2::empty(),
        }
    }

    pub fn with_visible(mut self, visible: bool) -> Self {
        self.visible = visible;
        self
    }

    pub fn with_extent(mut self, extent: BoundingBox2) -> Self {
        self.extent = extent;
        self
    }
}
