//! ZDXF 核心
//!
//! 导出流水线中与宿主无关的部分：
//! - `LayerDescriptor`: 宿主项目图层的只读视图
//! - `ExportRequest`: 一次导出的不可变参数
//! - [`selection::select`]: 解析要导出的图层
//! - [`extent::combine`]: 合并图层范围
//!
//! # 示例
//!
//! ```rust
//! use zdxf_core::prelude::*;
//!
//! let layers = vec![
//!     LayerDescriptor::new("1", "roads", LayerKind::Vector)
//!         .with_extent(BoundingBox2::from_coords(0.0, 0.0, 10.0, 10.0)),
//!     LayerDescriptor::new("2", "rivers", LayerKind::Vector)
//!         .with_extent(BoundingBox2::from_coords(5.0, -5.0, 20.0, 3.0)),
//! ];
//!
//! let request = ExportRequest::new("out/map", None, 500, Crs::default()).unwrap();
//! let selected = select(&request, &layers);
//! let extent = combine(&selected);
//! assert_eq!(extent, BoundingBox2::from_coords(0.0, -5.0, 20.0, 10.0));
//! ```

pub mod extent;
pub mod geometry;
pub mod layer;
pub mod math;
pub mod request;
pub mod selection;

pub mod prelude {
    //! 常用类型的便捷导入
    pub use crate::extent::combine;
    pub use crate::geometry::{Circle, Geometry, Line, Point, Polyline};
    pub use crate::layer::{LayerDescriptor, LayerKind};
    pub use crate::math::{BoundingBox2, Point2};
    pub use crate::request::{Crs, ExportRequest, RequestError, DEFAULT_CRS, DEFAULT_SCALE};
    pub use crate::selection::select;
}
