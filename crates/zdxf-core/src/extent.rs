//! 图层范围合并

use crate::layer::LayerDescriptor;
use crate::math::BoundingBox2;

/// 将所有图层的范围合并为一个包围盒
///
/// 从空包围盒开始逐个求并集；空列表返回空包围盒。
/// 结果与图层顺序和分组方式无关。
pub fn combine<'a>(layers: impl IntoIterator<Item = &'a LayerDescriptor>) -> BoundingBox2 {
    layers.into_iter().fold(BoundingBox2::empty(), |acc, layer| {
        if acc.is_empty() {
            layer.extent
        } else {
            acc.union(&layer.extent)
        }
    })
}
