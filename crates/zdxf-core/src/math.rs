//! 数学基础类型
//!
//! 基于 nalgebra 的二维点，以及轴对齐包围盒 [`BoundingBox2`]。

use serde::{Deserialize, Serialize};

/// 二维点
pub type Point2 = nalgebra::Point2<f64>;

/// 轴对齐包围盒（矩形范围）
///
/// 空包围盒是一个独立的状态：`min` 为 +∞，`max` 为 -∞，
/// 与原点处的零面积矩形 `(0,0)-(0,0)` 不同。
/// 非空时始终满足 `min.x <= max.x` 且 `min.y <= max.y`。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "Option<RectRepr>", into = "Option<RectRepr>")]
pub struct BoundingBox2 {
    pub min: Point2,
    pub max: Point2,
}

impl BoundingBox2 {
    /// 由两个角点创建，角点顺序任意
    pub fn new(a: Point2, b: Point2) -> Self {
        Self {
            min: Point2::new(a.x.min(b.x), a.y.min(b.y)),
            max: Point2::new(a.x.max(b.x), a.y.max(b.y)),
        }
    }

    /// 由坐标分量创建
    pub fn from_coords(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self::new(Point2::new(min_x, min_y), Point2::new(max_x, max_y))
    }

    /// 空包围盒
    pub fn empty() -> Self {
        Self {
            min: Point2::new(f64::INFINITY, f64::INFINITY),
            max: Point2::new(f64::NEG_INFINITY, f64::NEG_INFINITY),
        }
    }

    /// 包含所有给定点的最小包围盒，无点时为空
    pub fn from_points(points: impl IntoIterator<Item = Point2>) -> Self {
        let mut bbox = Self::empty();
        for p in points {
            bbox.expand_to_include(&p);
        }
        bbox
    }

    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y
    }

    /// 扩展以包含点
    pub fn expand_to_include(&mut self, point: &Point2) {
        self.min.x = self.min.x.min(point.x);
        self.min.y = self.min.y.min(point.y);
        self.max.x = self.max.x.max(point.x);
        self.max.y = self.max.y.max(point.y);
    }

    /// 同时包含两个包围盒的最小包围盒（并集，不是交集）
    pub fn union(&self, other: &BoundingBox2) -> BoundingBox2 {
        if self.is_empty() {
            return *other;
        }
        if other.is_empty() {
            return *self;
        }
        Self {
            min: Point2::new(self.min.x.min(other.min.x), self.min.y.min(other.min.y)),
            max: Point2::new(self.max.x.max(other.max.x), self.max.y.max(other.max.y)),
        }
    }

    /// 检查是否与另一个包围盒相交（含边界接触）
    pub fn intersects(&self, other: &BoundingBox2) -> bool {
        if self.is_empty() || other.is_empty() {
            return false;
        }
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
    }
}

impl Default for BoundingBox2 {
    fn default() -> Self {
        Self::empty()
    }
}

impl std::fmt::Display for BoundingBox2 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_empty() {
            write!(f, "<empty>")
        } else {
            write!(
                f,
                "({:.3}, {:.3}) - ({:.3}, {:.3})",
                self.min.x, self.min.y, self.max.x, self.max.y
            )
        }
    }
}

/// 序列化形式：空包围盒对应 `null`
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct RectRepr {
    min_x: f64,
    min_y: f64,
    max_x: f64,
    max_y: f64,
}

impl From<Option<RectRepr>> for BoundingBox2 {
    fn from(repr: Option<RectRepr>) -> Self {
        match repr {
            Some(r) => Self::from_coords(r.min_x, r.min_y, r.max_x, r.max_y),
            None => Self::empty(),
        }
    }
}

impl From<BoundingBox2> for Option<RectRepr> {
    fn from(bbox: BoundingBox2) -> Self {
        if bbox.is_empty() {
            None
        } else {
            Some(RectRepr {
                min_x: bbox.min.x,
                min_y: bbox.min.y,
                max_x: bbox.max.x,
                max_y: bbox.max.y,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_differs_from_origin() {
        let empty = BoundingBox2::empty();
        let origin = BoundingBox2::new(Point2::origin(), Point2::origin());

        assert!(empty.is_empty());
        assert!(!origin.is_empty());
        assert_ne!(empty, origin);
        assert!(origin.intersects(&origin));
    }

    #[test]
    fn test_new_normalizes_corners() {
        let bbox = BoundingBox2::new(Point2::new(10.0, -2.0), Point2::new(-5.0, 8.0));
        assert_eq!(bbox.min, Point2::new(-5.0, -2.0));
        assert_eq!(bbox.max, Point2::new(10.0, 8.0));
    }

    #[test]
    fn test_union_with_empty() {
        let a = BoundingBox2::from_coords(0.0, 0.0, 1.0, 1.0);
        assert_eq!(a.union(&BoundingBox2::empty()), a);
        assert_eq!(BoundingBox2::empty().union(&a), a);
        assert!(BoundingBox2::empty().union(&BoundingBox2::empty()).is_empty());
    }

    #[test]
    fn test_union_disjoint() {
        let a = BoundingBox2::from_coords(0.0, 0.0, 1.0, 1.0);
        let b = BoundingBox2::from_coords(5.0, -3.0, 6.0, 0.5);
        let u = a.union(&b);
        assert_eq!(u, BoundingBox2::from_coords(0.0, -3.0, 6.0, 1.0));
    }

    #[test]
    fn test_intersects() {
        let a = BoundingBox2::from_coords(0.0, 0.0, 10.0, 10.0);
        let b = BoundingBox2::from_coords(10.0, 10.0, 20.0, 20.0);
        let c = BoundingBox2::from_coords(11.0, 0.0, 20.0, 5.0);
        assert!(a.intersects(&b));
        assert!(!a.intersects(&c));
        assert!(!a.intersects(&BoundingBox2::empty()));
    }

    #[test]
    fn test_serde_empty_is_null() {
        let json = serde_json::to_string(&BoundingBox2::empty()).unwrap();
        assert_eq!(json, "null");

        let bbox: BoundingBox2 =
            serde_json::from_str(r#"{"min_x":1.0,"min_y":2.0,"max_x":3.0,"max_y":4.0}"#).unwrap();
        assert_eq!(bbox, BoundingBox2::from_coords(1.0, 2.0, 3.0, 4.0));
    }
}
