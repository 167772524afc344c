//! 图层选择
//!
//! 将请求中的图层名列表（或"全部可见图层"）解析为具体的图层描述符列表。

use crate::layer::LayerDescriptor;
use crate::request::ExportRequest;

/// 根据请求选择图层
///
/// - 指定了图层名：按名称精确匹配，结果顺序与输入名称顺序一致；
///   找不到的名称直接跳过，同名图层取宿主顺序中的第一个
/// - 未指定：选择所有可见图层，保持宿主提供的顺序
///
/// 结果可能为空，由调用方决定是否中止。
pub fn select(request: &ExportRequest, available: &[LayerDescriptor]) -> Vec<LayerDescriptor> {
    match request.layer_names() {
        Some(names) => select_by_names(names, available),
        None => select_visible(available),
    }
}

/// 按名称选择
pub fn select_by_names(names: &[String], available: &[LayerDescriptor]) -> Vec<LayerDescriptor> {
    let mut selected = Vec::with_capacity(names.len());
    for name in names {
        match available.iter().find(|layer| &layer.name == name) {
            Some(layer) => selected.push(layer.clone()),
            None => tracing::debug!("Layer '{}' not found, skipping", name),
        }
    }
    selected
}

/// 选择所有可见图层
pub fn select_visible(available: &[LayerDescriptor]) -> Vec<LayerDescriptor> {
    available.iter().filter(|layer| layer.visible).cloned().collect()
}
