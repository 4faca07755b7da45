// 该文件是 Shanan （山南西风） 项目的一部分。
// src/config.rs - 流水线参数配置
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

use std::{fmt, str::FromStr};

use thiserror::Error;

use crate::letterbox::LETTERBOX_COLOR;

pub const DEFAULT_INPUT_SIZE: u32 = 640;
pub const DEFAULT_CONF_THRESHOLD: f32 = 0.25;
pub const DEFAULT_IOU_THRESHOLD: f32 = 0.45;
pub const DEFAULT_MAX_DET: usize = 300;

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
  #[error("无法解析目标尺寸: {0}")]
  InvalidTargetSize(String),
  #[error("{name} 必须位于 [0, 1] 区间, 实际为 {value}")]
  ThresholdOutOfRange { name: &'static str, value: f32 },
  #[error("max_det 必须大于 0")]
  ZeroMaxDet,
  #[error("目标尺寸不能为 0")]
  ZeroTargetSize,
  #[error("未知的通道顺序: {0}")]
  UnknownChannelOrder(String),
  #[error("未知的 NMS 策略: {0}")]
  UnknownNmsPolicy(String),
}

/// 模型输入尺寸
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetSize {
  /// 正方形输入，例如 640
  Square(u32),
  /// 任意矩形输入
  Rect { width: u32, height: u32 },
}

impl TargetSize {
  /// 返回 (宽, 高)
  pub fn dimensions(&self) -> (u32, u32) {
    match *self {
      TargetSize::Square(size) => (size, size),
      TargetSize::Rect { width, height } => (width, height),
    }
  }
}

impl Default for TargetSize {
  fn default() -> Self {
    TargetSize::Square(DEFAULT_INPUT_SIZE)
  }
}

impl FromStr for TargetSize {
  type Err = ConfigError;

  /// 接受 `640` 或 `640x480` 两种写法
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let invalid = || ConfigError::InvalidTargetSize(s.to_string());
    let s = s.trim();
    match s.split_once(['x', 'X']) {
      Some((w, h)) => {
        let width = w.trim().parse().map_err(|_| invalid())?;
        let height = h.trim().parse().map_err(|_| invalid())?;
        Ok(TargetSize::Rect { width, height })
      }
      None => s.parse().map(TargetSize::Square).map_err(|_| invalid()),
    }
  }
}

impl fmt::Display for TargetSize {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      TargetSize::Square(size) => write!(f, "{}", size),
      TargetSize::Rect { width, height } => write!(f, "{}x{}", width, height),
    }
  }
}

/// 模型期望的通道顺序
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChannelOrder {
  Rgb,
  #[default]
  Bgr,
}

impl FromStr for ChannelOrder {
  type Err = ConfigError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.to_ascii_lowercase().as_str() {
      "rgb" => Ok(ChannelOrder::Rgb),
      "bgr" => Ok(ChannelOrder::Bgr),
      _ => Err(ConfigError::UnknownChannelOrder(s.to_string())),
    }
  }
}

/// NMS 抑制池的划分方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NmsPolicy {
  /// 所有类别在同一个池中互相抑制
  #[default]
  ClassAgnostic,
  /// 只抑制同类别的框
  PerClass,
}

impl FromStr for NmsPolicy {
  type Err = ConfigError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.to_ascii_lowercase().as_str() {
      "agnostic" | "class-agnostic" => Ok(NmsPolicy::ClassAgnostic),
      "per-class" | "class" => Ok(NmsPolicy::PerClass),
      _ => Err(ConfigError::UnknownNmsPolicy(s.to_string())),
    }
  }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
  pub target_size: TargetSize,
  pub pad_color: [u8; 3],
  pub channel_order: ChannelOrder,
  pub conf_threshold: f32,
  pub iou_threshold: f32,
  pub max_det: usize,
  pub nms_policy: NmsPolicy,
}

impl Default for PipelineConfig {
  fn default() -> Self {
    Self {
      target_size: TargetSize::default(),
      pad_color: LETTERBOX_COLOR,
      channel_order: ChannelOrder::default(),
      conf_threshold: DEFAULT_CONF_THRESHOLD,
      iou_threshold: DEFAULT_IOU_THRESHOLD,
      max_det: DEFAULT_MAX_DET,
      nms_policy: NmsPolicy::default(),
    }
  }
}

impl PipelineConfig {
  pub fn with_target_size(mut self, target_size: TargetSize) -> Self {
    self.target_size = target_size;
    self
  }

  pub fn with_channel_order(mut self, channel_order: ChannelOrder) -> Self {
    self.channel_order = channel_order;
    self
  }

  pub fn with_thresholds(mut self, conf_threshold: f32, iou_threshold: f32) -> Self {
    self.conf_threshold = conf_threshold;
    self.iou_threshold = iou_threshold;
    self
  }

  pub fn with_max_det(mut self, max_det: usize) -> Self {
    self.max_det = max_det;
    self
  }

  pub fn with_nms_policy(mut self, nms_policy: NmsPolicy) -> Self {
    self.nms_policy = nms_policy;
    self
  }

  pub fn validate(&self) -> Result<(), ConfigError> {
    let (w, h) = self.target_size.dimensions();
    if w == 0 || h == 0 {
      return Err(ConfigError::ZeroTargetSize);
    }
    check_unit("conf_threshold", self.conf_threshold)?;
    check_unit("iou_threshold", self.iou_threshold)?;
    if self.max_det == 0 {
      return Err(ConfigError::ZeroMaxDet);
    }
    Ok(())
  }
}

fn check_unit(name: &'static str, value: f32) -> Result<(), ConfigError> {
  if (0.0..=1.0).contains(&value) {
    Ok(())
  } else {
    Err(ConfigError::ThresholdOutOfRange { name, value })
  }
}
