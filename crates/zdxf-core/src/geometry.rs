//! 矢量图层要素的几何图元
//!
//! 支持的基本图元：
//! - 点 (Point)
//! - 线段 (Line)
//! - 多段线 (Polyline)
//! - 圆 (Circle)

use crate::math::{BoundingBox2, Point2};
use serde::{Deserialize, Serialize};

/// 几何类型枚举
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Geometry {
    Point(Point),
    Line(Line),
    Polyline(Polyline),
    Circle(Circle),
}

impl Geometry {
    /// 获取几何的包围盒
    pub fn bounding_box(&self) -> BoundingBox2 {
        match self {
            Geometry::Point(p) => p.bounding_box(),
            Geometry::Line(l) => l.bounding_box(),
            Geometry::Polyline(pl) => pl.bounding_box(),
            Geometry::Circle(c) => c.bounding_box(),
        }
    }
}

/// 点
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub position: Point2,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            position: Point2::new(x, y),
        }
    }

    pub fn bounding_box(&self) -> BoundingBox2 {
        BoundingBox2::new(self.position, self.position)
    }
}

/// 线段
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Line {
    pub start: Point2,
    pub end: Point2,
}

impl Line {
    pub fn new(start: Point2, end: Point2) -> Self {
        Self { start, end }
    }

    pub fn bounding_box(&self) -> BoundingBox2 {
        BoundingBox2::from_points([self.start, self.end])
    }
}

/// 多段线（仅直线段）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Polyline {
    pub vertices: Vec<Point2>,
    #[serde(default)]
    pub closed: bool,
}

impl Polyline {
    pub fn new(vertices: Vec<Point2>, closed: bool) -> Self {
        Self { vertices, closed }
    }

    /// 没有顶点时返回空包围盒
    pub fn bounding_box(&self) -> BoundingBox2 {
        BoundingBox2::from_points(self.vertices.iter().copied())
    }
}

/// 圆
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Circle {
    pub center: Point2,
    pub radius: f64,
}

impl Circle {
    pub fn new(center: Point2, radius: f64) -> Self {
        Self { center, radius }
    }

    pub fn bounding_box(&self) -> BoundingBox2 {
        let r = self.radius.abs();
        BoundingBox2::new(
            Point2::new(self.center.x - r, self.center.y - r),
            Point2::new(self.center.x + r, self.center.y + r),
        )
    }
}
