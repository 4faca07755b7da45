// 该文件是 Shanan （山南西风） 项目的一部分。
// src/label.rs - 类别标签表
//
// 本文件根据 Apache 许可证第 2.0 版（以下简称“许可证”）授权使用；
// 除非遵守该许可证条款，否则您不得使用本文件。
// 您可通过以下网址获取许可证副本：
// http://www.apache.org/licenses/LICENSE-2.0
// 除非适用法律要求或书面同意，根据本许可协议分发的软件均按“原样”提供，
// 不附带任何形式的明示或暗示的保证或条件。
// 有关许可权限与限制的具体条款，请参阅本许可协议。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, Wareless Group

use std::{path::Path, sync::LazyLock};

use thiserror::Error;
use tracing::info;

/// 越界类别使用的标签
pub const UNKNOWN_LABEL: &str = "unknown";

/// COCO 数据集类别名称
pub const COCO_CLASSES: [&str; 80] = [
  "person",
  "bicycle",
  "car",
  "motorcycle",
  "airplane",
  "bus",
  "train",
  "truck",
  "boat",
  "traffic light",
  "fire hydrant",
  "stop sign",
  "parking meter",
  "bench",
  "bird",
  "cat",
  "dog",
  "horse",
  "sheep",
  "cow",
  "elephant",
  "bear",
  "zebra",
  "giraffe",
  "backpack",
  "umbrella",
  "handbag",
  "tie",
  "suitcase",
  "frisbee",
  "skis",
  "snowboard",
  "sports ball",
  "kite",
  "baseball bat",
  "baseball glove",
  "skateboard",
  "surfboard",
  "tennis racket",
  "bottle",
  "wine glass",
  "cup",
  "fork",
  "knife",
  "spoon",
  "bowl",
  "banana",
  "apple",
  "sandwich",
  "orange",
  "broccoli",
  "carrot",
  "hot dog",
  "pizza",
  "donut",
  "cake",
  "chair",
  "couch",
  "potted plant",
  "bed",
  "dining table",
  "toilet",
  "tv",
  "laptop",
  "mouse",
  "remote",
  "keyboard",
  "cell phone",
  "microwave",
  "oven",
  "toaster",
  "sink",
  "refrigerator",
  "book",
  "clock",
  "vase",
  "scissors",
  "teddy bear",
  "hair drier",
  "toothbrush",
];

static COCO_TABLE: LazyLock<ClassLabelTable> =
  LazyLock::new(|| ClassLabelTable::new(COCO_CLASSES.iter().map(|s| s.to_string()).collect()));

#[derive(Error, Debug)]
pub enum LabelError {
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("标签 JSON 解析错误: {0}")]
  JsonError(#[from] serde_json::Error),
  #[error("标签表为空")]
  Empty,
}

/// 按 class_id 索引的只读类别名称表
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassLabelTable {
  names: Box<[String]>,
}

impl ClassLabelTable {
  pub fn new(names: Vec<String>) -> Self {
    Self {
      names: names.into_boxed_slice(),
    }
  }

  /// 进程内共享的 COCO 80 类标签表
  pub fn coco() -> &'static ClassLabelTable {
    &COCO_TABLE
  }

  /// 从 JSON 字符串数组解析，例如 `["person", "bicycle"]`
  pub fn from_json_str(text: &str) -> Result<Self, LabelError> {
    let names: Vec<String> = serde_json::from_str(text)?;
    if names.is_empty() {
      return Err(LabelError::Empty);
    }
    Ok(Self::new(names))
  }

  /// 每行一个类别名，忽略空行
  pub fn from_lines(text: &str) -> Result<Self, LabelError> {
    let names: Vec<String> = text
      .lines()
      .map(str::trim)
      .filter(|line| !line.is_empty())
      .map(str::to_string)
      .collect();
    if names.is_empty() {
      return Err(LabelError::Empty);
    }
    Ok(Self::new(names))
  }

  /// 从文件加载；`.json` 按 JSON 数组解析，其余按行解析
  pub fn load(path: impl AsRef<Path>) -> Result<Self, LabelError> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)?;
    let table = match path.extension().and_then(|ext| ext.to_str()) {
      Some("json") => Self::from_json_str(&text)?,
      _ => Self::from_lines(&text)?,
    };
    info!("加载标签表 {}: {} 个类别", path.display(), table.len());
    Ok(table)
  }

  pub fn len(&self) -> usize {
    self.names.len()
  }

  pub fn is_empty(&self) -> bool {
    self.names.is_empty()
  }

  pub fn get(&self, class_id: usize) -> Option<&str> {
    self.names.get(class_id).map(String::as_str)
  }

  /// 类别名称，越界时返回 [`UNKNOWN_LABEL`]
  pub fn name(&self, class_id: usize) -> &str {
    self.get(class_id).unwrap_or(UNKNOWN_LABEL)
  }
}

impl Default for ClassLabelTable {
  fn default() -> Self {
    ClassLabelTable::coco().clone()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn coco_table_has_eighty_classes() {
    let table = ClassLabelTable::coco();
    assert_eq!(table.len(), 80);
    assert_eq!(table.name(0), "person");
    assert_eq!(table.name(53), "pizza");
    assert_eq!(table.name(79), "toothbrush");
  }

  #[test]
  fn out_of_range_id_falls_back_to_unknown() {
    let table = ClassLabelTable::coco();
    assert_eq!(table.name(80), UNKNOWN_LABEL);
    assert_eq!(table.get(usize::MAX), None);
  }

  #[test]
  fn parses_json_and_line_formats() {
    let json = ClassLabelTable::from_json_str(r#"["rice", "egg"]"#).unwrap();
    let lines = ClassLabelTable::from_lines("rice\n\n  egg  \n").unwrap();
    assert_eq!(json, lines);
    assert_eq!(lines.name(1), "egg");

    assert!(matches!(ClassLabelTable::from_json_str("[]"), Err(LabelError::Empty)));
    assert!(matches!(ClassLabelTable::from_json_str("{"), Err(LabelError::JsonError(_))));
  }

  #[test]
  fn loads_from_file_by_extension() {
    let dir = tempfile::tempdir().unwrap();
    let json_path = dir.path().join("labels.json");
    std::fs::write(&json_path, r#"["a", "b", "c"]"#).unwrap();
    let txt_path = dir.path().join("labels.txt");
    std::fs::write(&txt_path, "a\nb\n").unwrap();

    assert_eq!(ClassLabelTable::load(&json_path).unwrap().len(), 3);
    assert_eq!(ClassLabelTable::load(&txt_path).unwrap().len(), 2);
  }
}
