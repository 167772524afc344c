//! DXF 文件头规范化
//!
//! 导出器写出的 DXF 需要两处修正：
//! 1. 格式版本标记（默认 `AC1015` → `AC1021`），全文替换
//! 2. 单位变量 `$INSUNITS`，存在则改写值，不存在则插入到 HEADER 段末尾
//!
//! # DXF 文件头结构
//!
//! ```text
//!   0
//! SECTION
//!   2
//! HEADER          ← 段标记
//!   9
//! $ACADVER        ← 变量名
//!   1             ← 组码
//! AC1015          ← 值
//!   9
//! $INSUNITS
//!  70
//!      0
//!   0
//! ENDSEC          ← 段结束
//! ```
//!
//! 变量记录是"变量名 / 组码 / 值"三行。组码 70 被很多变量共用，
//! 所以匹配必须以紧邻的变量名行为锚点。
//!
//! 也接受不带组码行的简化形式（`HEADER` / 记录 / `ENDSEC` 直接相连）。
//! 所有比较都在去掉首尾空白后进行，原有的缩进和换行符保持不变。

use std::str::FromStr;

use thiserror::Error;
use tracing::{debug, warn};

use crate::document::DxfDocument;
use crate::error::PatchError;

/// 导出器写出的版本标记（AutoCAD 2000）
pub const SOURCE_VERSION: &str = "AC1015";

/// 目标版本标记（AutoCAD 2007）
pub const TARGET_VERSION: &str = "AC1021";

/// 单位变量名
pub const UNITS_VARIABLE: &str = "$INSUNITS";

const UNITS_GROUP_CODE: i32 = 70;
const VARIABLE_NAME_CODE: i32 = 9;
const SECTION_NAME_CODE: i32 = 2;
const HEADER_MARKER: &str = "HEADER";
const SECTION_END: &str = "ENDSEC";

/// `$INSUNITS` 单位代码
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InsUnits {
    Unitless = 0,
    Inches = 1,
    Feet = 2,
    Miles = 3,
    Millimeters = 4,
    Centimeters = 5,
    Meters = 6,
    Kilometers = 7,
    Microinches = 8,
    Mils = 9,
    Yards = 10,
    Angstroms = 11,
    Nanometers = 12,
    Microns = 13,
    Decimeters = 14,
    Decameters = 15,
    Hectometers = 16,
    Gigameters = 17,
    AstronomicalUnits = 18,
    LightYears = 19,
    Parsecs = 20,
}

impl InsUnits {
    pub const ALL: [InsUnits; 21] = [
        InsUnits::Unitless,
        InsUnits::Inches,
        InsUnits::Feet,
        InsUnits::Miles,
        InsUnits::Millimeters,
        InsUnits::Centimeters,
        InsUnits::Meters,
        InsUnits::Kilometers,
        InsUnits::Microinches,
        InsUnits::Mils,
        InsUnits::Yards,
        InsUnits::Angstroms,
        InsUnits::Nanometers,
        InsUnits::Microns,
        InsUnits::Decimeters,
        InsUnits::Decameters,
        InsUnits::Hectometers,
        InsUnits::Gigameters,
        InsUnits::AstronomicalUnits,
        InsUnits::LightYears,
        InsUnits::Parsecs,
    ];

    pub fn code(self) -> i32 {
        self as i32
    }

    pub fn from_code(code: i32) -> Option<Self> {
        Self::ALL.iter().copied().find(|u| u.code() == code)
    }

    pub fn name(self) -> &'static str {
        match self {
            InsUnits::Unitless => "unitless",
            InsUnits::Inches => "inches",
            InsUnits::Feet => "feet",
            InsUnits::Miles => "miles",
            InsUnits::Millimeters => "millimeters",
            InsUnits::Centimeters => "centimeters",
            InsUnits::Meters => "meters",
            InsUnits::Kilometers => "kilometers",
            InsUnits::Microinches => "microinches",
            InsUnits::Mils => "mils",
            InsUnits::Yards => "yards",
            InsUnits::Angstroms => "angstroms",
            InsUnits::Nanometers => "nanometers",
            InsUnits::Microns => "microns",
            InsUnits::Decimeters => "decimeters",
            InsUnits::Decameters => "decameters",
            InsUnits::Hectometers => "hectometers",
            InsUnits::Gigameters => "gigameters",
            InsUnits::AstronomicalUnits => "astronomical_units",
            InsUnits::LightYears => "light_years",
            InsUnits::Parsecs => "parsecs",
        }
    }
}

impl std::fmt::Display for InsUnits {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown drawing units: {0:?}")]
pub struct UnknownUnits(pub String);

impl FromStr for InsUnits {
    type Err = UnknownUnits;

    /// 接受单位名（大小写无关，含常见缩写）或数字代码
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_ascii_lowercase();
        if let Ok(code) = key.parse::<i32>() {
            return Self::from_code(code).ok_or_else(|| UnknownUnits(s.to_string()));
        }
        let unit = match key.as_str() {
            "in" | "inch" => InsUnits::Inches,
            "ft" | "foot" => InsUnits::Feet,
            "mm" | "millimetre" | "millimetres" => InsUnits::Millimeters,
            "cm" | "centimetre" | "centimetres" => InsUnits::Centimeters,
            "m" | "meter" | "metre" | "metres" => InsUnits::Meters,
            "km" | "kilometre" | "kilometres" => InsUnits::Kilometers,
            "none" => InsUnits::Unitless,
            _ => {
                return Self::ALL
                    .iter()
                    .copied()
                    .find(|u| u.name() == key)
                    .ok_or_else(|| UnknownUnits(s.to_string()))
            }
        };
        Ok(unit)
    }
}

/// 单位变量的处理结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitsAction {
    /// 改写了若干条已有记录的值
    Replaced(usize),
    /// 新插入了一条记录
    Inserted,
    /// 有 `$INSUNITS` 变量名但没有组码 70 的记录，保持原样
    Unrecognized,
}

/// 规范化结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchOutcome {
    pub document: DxfDocument,
    pub version_replacements: usize,
    pub units: UnitsAction,
}

/// 文件头规范化参数
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderPatch {
    pub source_version: String,
    pub target_version: String,
    pub units_code: i32,
}

impl Default for HeaderPatch {
    fn default() -> Self {
        Self {
            source_version: SOURCE_VERSION.to_string(),
            target_version: TARGET_VERSION.to_string(),
            units_code: InsUnits::Meters.code(),
        }
    }
}

impl HeaderPatch {
    pub fn new(target_version: impl Into<String>, units_code: i32) -> Self {
        Self {
            target_version: target_version.into(),
            units_code,
            ..Self::default()
        }
    }

    pub fn with_source_version(mut self, source_version: impl Into<String>) -> Self {
        self.source_version = source_version.into();
        self
    }

    /// 对文档执行规范化
    ///
    /// 版本替换与单位修正在同一个新缓冲区上完成；失败时不产生任何输出。
    /// 只有在找不到 `HEADER`…`ENDSEC` 段时返回 [`PatchError::MalformedHeader`]。
    pub fn apply(&self, doc: &DxfDocument) -> Result<PatchOutcome, PatchError> {
        let eol = doc.line_ending();
        let (content, version_replacements) = self.rewrite_version(doc.as_str());

        let lines: Vec<&str> = content.split_inclusive('\n').collect();
        let section = HeaderSection::locate(&lines)?;
        let records = find_units_records(&lines);

        let mut output = String::with_capacity(content.len() + 64);
        let units = if records.is_empty() && has_units_name(&lines) {
            warn!(
                "{} present without a group code {} record, left unchanged",
                UNITS_VARIABLE, UNITS_GROUP_CODE
            );
            output.push_str(&content);
            UnitsAction::Unrecognized
        } else if records.is_empty() {
            let (at, grouped) = section.insertion_point(&lines);
            for (i, line) in lines.iter().enumerate() {
                if i == at {
                    push_units_record(&mut output, self.units_code, grouped, eol);
                }
                output.push_str(line);
            }
            debug!(line = at, grouped, "Inserted {} record", UNITS_VARIABLE);
            UnitsAction::Inserted
        } else {
            for (i, line) in lines.iter().enumerate() {
                if records.contains(&i) {
                    output.push_str(&rewrite_value_line(line, self.units_code));
                } else {
                    output.push_str(line);
                }
            }
            debug!("Rewrote {} {} record(s)", records.len(), UNITS_VARIABLE);
            UnitsAction::Replaced(records.len())
        };

        Ok(PatchOutcome {
            document: DxfDocument::new(output),
            version_replacements,
            units,
        })
    }

    /// 全文替换版本标记
    ///
    /// 已经是目标标记的位置原样保留，目标中包含源标记时（如 `AC1015` → `AC10150`）
    /// 重复执行也不会继续变长。两者在同一位置都能匹配时优先较长者。
    fn rewrite_version(&self, content: &str) -> (String, usize) {
        let source = self.source_version.as_str();
        let target = self.target_version.as_str();
        if source.is_empty() || source == target || !content.contains(source) {
            return (content.to_string(), 0);
        }

        let mut output = String::with_capacity(content.len());
        let mut count = 0;
        let mut rest = content;
        while !rest.is_empty() {
            let keep_target = !target.is_empty() && rest.starts_with(target);
            let replace_source = rest.starts_with(source);
            if keep_target && (!replace_source || target.len() >= source.len()) {
                output.push_str(target);
                rest = &rest[target.len()..];
            } else if replace_source {
                output.push_str(target);
                count += 1;
                rest = &rest[source.len()..];
            } else {
                let step = rest.chars().next().map_or(1, char::len_utf8);
                output.push_str(&rest[..step]);
                rest = &rest[step..];
            }
        }
        (output, count)
    }
}

/// 以默认源版本规范化文档
pub fn patch(
    doc: &DxfDocument,
    target_version: &str,
    target_units_code: i32,
) -> Result<DxfDocument, PatchError> {
    HeaderPatch::new(target_version, target_units_code)
        .apply(doc)
        .map(|outcome| outcome.document)
}

/// 第一个 HEADER 标记行及其后第一个 ENDSEC 行的位置
#[derive(Debug, Clone, Copy)]
struct HeaderSection {
    header: usize,
    end: usize,
}

impl HeaderSection {
    fn locate(lines: &[&str]) -> Result<Self, PatchError> {
        let header = lines
            .iter()
            .position(|line| line.trim() == HEADER_MARKER)
            .ok_or_else(|| PatchError::MalformedHeader("no HEADER section marker".to_string()))?;

        let end = lines[header + 1..]
            .iter()
            .position(|line| line.trim() == SECTION_END)
            .map(|offset| header + 1 + offset)
            .ok_or_else(|| {
                PatchError::MalformedHeader("HEADER section is not closed by ENDSEC".to_string())
            })?;

        Ok(Self { header, end })
    }

    /// 插入位置，以及是否为带组码的形式
    ///
    /// 带组码时 `HEADER` 前一行是组码 2，`ENDSEC` 前一行是处于组码位置的 `0`，
    /// 新记录插在这个 `0` 之前。
    fn insertion_point(&self, lines: &[&str]) -> (usize, bool) {
        let named_section =
            self.header > 0 && is_group_code(lines[self.header - 1], SECTION_NAME_CODE);
        let code_before_end = self.end > self.header + 1
            && (self.end - 1 - self.header) % 2 == 1
            && is_group_code(lines[self.end - 1], 0);

        if named_section && code_before_end {
            (self.end - 1, true)
        } else {
            (self.end, false)
        }
    }
}

fn is_group_code(line: &str, code: i32) -> bool {
    line.trim().parse::<i32>() == Ok(code)
}

/// 所有 `$INSUNITS` / 70 / 值 记录的值行下标
///
/// 值行的内容不限（空白、小数都算），只要不是段结束标记。
fn find_units_records(lines: &[&str]) -> Vec<usize> {
    (0..lines.len().saturating_sub(2))
        .filter(|&i| {
            lines[i].trim() == UNITS_VARIABLE
                && is_group_code(lines[i + 1], UNITS_GROUP_CODE)
                && lines[i + 2].trim() != SECTION_END
        })
        .map(|i| i + 2)
        .collect()
}

fn has_units_name(lines: &[&str]) -> bool {
    lines.iter().any(|line| line.trim() == UNITS_VARIABLE)
}

/// 保留缩进和行尾，只替换数值
fn rewrite_value_line(line: &str, code: i32) -> String {
    let body = line.trim_end_matches(['\r', '\n']);
    let eol = &line[body.len()..];
    let value = body.trim();
    if value.is_empty() {
        return format!("{:>6}{}", code, eol);
    }
    let indent_len = body.len() - body.trim_start().len();
    let value_end = indent_len + value.len();
    format!("{}{}{}{}", &body[..indent_len], code, &body[value_end..], eol)
}

fn push_units_record(output: &mut String, code: i32, grouped: bool, eol: &str) {
    if grouped {
        output.push_str(&format!("{:>3}{}", VARIABLE_NAME_CODE, eol));
    }
    output.push_str(UNITS_VARIABLE);
    output.push_str(eol);
    output.push_str(&format!("{:>3}{}", UNITS_GROUP_CODE, eol));
    output.push_str(&format!("{:>6}{}", code, eol));
}
