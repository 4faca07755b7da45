// 该文件是 Shanan （山南西风） 项目的一部分。
// src/model.rs - 推理后端抽象
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

use std::str::FromStr;

use ndarray::{Array3, ArrayView2, Axis};
use thiserror::Error;

use crate::frame::InputTensor;

/// 每行最少的通道数：cx, cy, w, h, objectness 以及至少一个类别
pub const MIN_ROW_CHANNELS: usize = 6;

#[derive(Error, Debug)]
pub enum InferenceError {
  #[error("推理会话尚未初始化")]
  NotInitialized,
  #[error("模型加载错误: {0}")]
  ModelLoadError(String),
  #[error("模型路径错误: {0}")]
  ModelPathError(String),
  #[error("输出形状不匹配: {0}")]
  ShapeMismatch(String),
  #[error("推理运行错误: {0}")]
  RuntimeError(String),
}

/// 推理后端
///
/// 后端是显式注入的能力对象：`init` 加载模型，`shutdown` 释放资源。
/// `infer` 只读取 `&self`，需要独占访问的运行时应自行加锁。
pub trait InferenceBackend {
  fn init(&mut self) -> Result<(), InferenceError>;
  fn infer(&self, input: &InputTensor) -> Result<RawOutput, InferenceError>;
  fn shutdown(&mut self);
}

/// 原始输出的内存布局
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputLayout {
  /// (1, 5 + num_classes, num_boxes)，YOLO 导出模型的常见布局
  #[default]
  ChannelsFirst,
  /// (1, num_boxes, 5 + num_classes)
  RowsFirst,
}

impl OutputLayout {
  /// 按维度大小猜测布局，较小的一维视为通道维
  ///
  /// 候选框数量少于通道数时会猜错，只应在显式选择 `auto` 时使用。
  pub fn guess(a: usize, b: usize) -> Self {
    if a <= b {
      OutputLayout::ChannelsFirst
    } else {
      OutputLayout::RowsFirst
    }
  }
}

impl FromStr for OutputLayout {
  type Err = InferenceError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.to_ascii_lowercase().as_str() {
      "channels" | "channels-first" => Ok(OutputLayout::ChannelsFirst),
      "rows" | "rows-first" => Ok(OutputLayout::RowsFirst),
      other => Err(InferenceError::ModelPathError(format!(
        "未知的输出布局: {}",
        other
      ))),
    }
  }
}

/// 检测网络的原始输出
#[derive(Debug, Clone)]
pub struct RawOutput {
  data: Array3<f32>,
  layout: OutputLayout,
}

impl RawOutput {
  pub fn new(data: Array3<f32>, layout: OutputLayout) -> Result<Self, InferenceError> {
    let shape = data.shape();
    if shape[0] != 1 {
      return Err(InferenceError::ShapeMismatch(format!(
        "期望批次大小为 1, 实际形状 {:?}",
        shape
      )));
    }
    let channels = match layout {
      OutputLayout::ChannelsFirst => shape[1],
      OutputLayout::RowsFirst => shape[2],
    };
    if channels < MIN_ROW_CHANNELS {
      return Err(InferenceError::ShapeMismatch(format!(
        "每个候选框至少需要 {} 个通道, 实际形状 {:?}",
        MIN_ROW_CHANNELS, shape
      )));
    }
    Ok(Self { data, layout })
  }

  /// 由扁平数据按指定布局构造
  pub fn from_shape_vec(
    shape: &[usize],
    data: Vec<f32>,
    layout: OutputLayout,
  ) -> Result<Self, InferenceError> {
    Self::new(Self::array_from_shape_vec(shape, data)?, layout)
  }

  /// 由扁平数据构造，按维度大小猜测布局
  pub fn from_shape_vec_auto(shape: &[usize], data: Vec<f32>) -> Result<Self, InferenceError> {
    let array = Self::array_from_shape_vec(shape, data)?;
    let layout = OutputLayout::guess(array.shape()[1], array.shape()[2]);
    Self::new(array, layout)
  }

  fn array_from_shape_vec(shape: &[usize], data: Vec<f32>) -> Result<Array3<f32>, InferenceError> {
    let &[batch, a, b] = shape else {
      return Err(InferenceError::ShapeMismatch(format!(
        "期望三维输出, 实际形状 {:?}",
        shape
      )));
    };
    Array3::from_shape_vec((batch, a, b), data)
      .map_err(|e| InferenceError::ShapeMismatch(e.to_string()))
  }

  pub fn layout(&self) -> OutputLayout {
    self.layout
  }

  pub fn num_boxes(&self) -> usize {
    self.rows().nrows()
  }

  pub fn num_classes(&self) -> usize {
    self.rows().ncols() - 5
  }

  /// 以 (num_boxes, 5 + num_classes) 视图访问每个候选框
  pub fn rows(&self) -> ArrayView2<'_, f32> {
    let batch = self.data.index_axis(Axis(0), 0);
    match self.layout {
      OutputLayout::ChannelsFirst => batch.reversed_axes(),
      OutputLayout::RowsFirst => batch,
    }
  }
}

mod download;
pub use self::download::ensure_model;

#[cfg(feature = "onnx")]
mod onnx;
#[cfg(feature = "onnx")]
pub use self::onnx::{OnnxBackend, OnnxBackendBuilder};

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn channel_first_is_read_as_columns() {
    // 8 个候选框, 每个 6 个通道
    let data: Vec<f32> = (0..48).map(|v| v as f32).collect();
    let output = RawOutput::from_shape_vec(&[1, 6, 8], data, OutputLayout::ChannelsFirst).unwrap();

    assert_eq!(output.layout(), OutputLayout::ChannelsFirst);
    assert_eq!(output.num_boxes(), 8);
    assert_eq!(output.num_classes(), 1);
    let rows = output.rows();
    assert_eq!(rows[[0, 0]], 0.0);
    assert_eq!(rows[[0, 1]], 8.0);
    assert_eq!(rows[[1, 0]], 1.0);
  }

  #[test]
  fn row_first_is_read_as_rows() {
    // 10 个候选框, 每个 7 个通道
    let data: Vec<f32> = (0..70).map(|v| v as f32).collect();
    let output = RawOutput::from_shape_vec(&[1, 10, 7], data, OutputLayout::RowsFirst).unwrap();

    assert_eq!(output.layout(), OutputLayout::RowsFirst);
    assert_eq!(output.num_boxes(), 10);
    assert_eq!(output.num_classes(), 2);
    assert_eq!(output.rows()[[1, 0]], 7.0);
  }

  #[test]
  fn fewer_boxes_than_channels_keeps_explicit_layout() {
    // 80 类模型在小输入尺寸下只有 10 个候选框
    let mut data = vec![0.0f32; 85 * 10];
    // 第 0 个候选框: cx, cy, w, h, obj, class 0
    for (channel, value) in [(0, 32.0), (1, 32.0), (2, 8.0), (3, 8.0), (4, 0.9), (5, 0.9)] {
      data[channel * 10] = value;
    }
    let output = RawOutput::from_shape_vec(&[1, 85, 10], data, OutputLayout::default()).unwrap();

    assert_eq!(output.layout(), OutputLayout::ChannelsFirst);
    assert_eq!(output.num_boxes(), 10);
    assert_eq!(output.num_classes(), 80);
    let rows = output.rows();
    assert_eq!(rows[[0, 4]], 0.9);
    assert_eq!(rows[[0, 5]], 0.9);
  }

  #[test]
  fn auto_layout_guesses_from_dimensions() {
    let channels = RawOutput::from_shape_vec_auto(&[1, 6, 8], vec![0.0; 48]).unwrap();
    assert_eq!(channels.layout(), OutputLayout::ChannelsFirst);
    let rows = RawOutput::from_shape_vec_auto(&[1, 10, 7], vec![0.0; 70]).unwrap();
    assert_eq!(rows.layout(), OutputLayout::RowsFirst);
  }

  #[test]
  fn parses_layout_names() {
    assert_eq!("rows".parse::<OutputLayout>().unwrap(), OutputLayout::RowsFirst);
    assert_eq!(
      "Channels-First".parse::<OutputLayout>().unwrap(),
      OutputLayout::ChannelsFirst
    );
    assert!("diagonal".parse::<OutputLayout>().is_err());
  }

  #[test]
  fn rejects_malformed_shapes() {
    let layout = OutputLayout::ChannelsFirst;
    assert!(matches!(
      RawOutput::from_shape_vec(&[6, 2], vec![0.0; 12], layout),
      Err(InferenceError::ShapeMismatch(_))
    ));
    assert!(matches!(
      RawOutput::from_shape_vec(&[2, 6, 8], vec![0.0; 96], layout),
      Err(InferenceError::ShapeMismatch(_))
    ));
    assert!(matches!(
      RawOutput::from_shape_vec(&[1, 6, 8], vec![0.0; 5], layout),
      Err(InferenceError::ShapeMismatch(_))
    ));
    // 通道数不足
    assert!(matches!(
      RawOutput::from_shape_vec(&[1, 4, 8], vec![0.0; 32], layout),
      Err(InferenceError::ShapeMismatch(_))
    ));
    assert!(matches!(
      RawOutput::from_shape_vec(&[1, 8, 4], vec![0.0; 32], OutputLayout::RowsFirst),
      Err(InferenceError::ShapeMismatch(_))
    ));
  }
}
