//! DXF 文档缓冲区
//!
//! 外部导出器产生的原始文本，由文件头规范化替换为新的缓冲区，不做原地修改。

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::FileError;

/// UTF-8 DXF 文本文档
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DxfDocument {
    content: String,
}

impl DxfDocument {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
        }
    }

    /// 从字节创建，要求 UTF-8
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, FileError> {
        Ok(Self::new(String::from_utf8(bytes)?))
    }

    /// 从文件加载
    pub fn load(path: &Path) -> Result<Self, FileError> {
        let bytes = fs::read(path)?;
        Self::from_bytes(bytes)
    }

    /// 保存到文件
    pub fn save(&self, path: &Path) -> Result<(), FileError> {
        let mut file = File::create(path)?;
        file.write_all(self.content.as_bytes())?;
        file.flush()?;
        Ok(())
    }

    /// 先写入同目录下的临时文件再重命名，避免留下写了一半的文件
    pub fn save_atomic(&self, path: &Path) -> Result<(), FileError> {
        let tmp = sibling_temp_path(path)?;
        if let Err(e) = self.save(&tmp) {
            let _ = fs::remove_file(&tmp);
            return Err(e);
        }
        if let Err(e) = fs::rename(&tmp, path) {
            let _ = fs::remove_file(&tmp);
            return Err(e.into());
        }
        Ok(())
    }

    pub fn as_str(&self) -> &str {
        &self.content
    }

    pub fn into_string(self) -> String {
        self.content
    }

    pub fn len(&self) -> usize {
        self.content.len()
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    /// 文档使用的换行符（含 `\r\n` 即视为 CRLF）
    pub fn line_ending(&self) -> &'static str {
        if self.content.contains("\r\n") {
            "\r\n"
        } else {
            "\n"
        }
    }
}

impl From<String> for DxfDocument {
    fn from(content: String) -> Self {
        Self::new(content)
    }
}

impl From<&str> for DxfDocument {
    fn from(content: &str) -> Self {
        Self::new(content)
    }
}

fn sibling_temp_path(path: &Path) -> Result<PathBuf, FileError> {
    let name = path
        .file_name()
        .ok_or_else(|| FileError::InvalidFormat(format!("Not a file path: {}", path.display())))?;
    Ok(path.with_file_name(format!(".{}.tmp", name.to_string_lossy())))
}
