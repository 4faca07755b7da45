// 该文件是 Shanan （山南西风） 项目的一部分。
// src/postprocess.rs - 检测结果后处理
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

mod decode;
mod nms;
mod unmap;

pub use self::decode::decode;
pub use self::nms::{iou, nms};
pub use self::unmap::unmap;

/// letterbox 坐标系下的候选框
#[derive(Debug, Clone, PartialEq)]
pub struct RawDetection {
  pub class_id: usize,
  pub score: f32,
  pub bbox: [f32; 4], // [x_min, y_min, x_max, y_max]
}

impl RawDetection {
  /// 中心点形式 (cx, cy, w, h)
  pub fn xywh(&self) -> [f32; 4] {
    let [x1, y1, x2, y2] = self.bbox;
    [(x1 + x2) / 2.0, (y1 + y2) / 2.0, x2 - x1, y2 - y1]
  }
}

/// 原图坐标系下的最终检测结果
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
  pub bbox: [f32; 4], // [x_min, y_min, x_max, y_max]
  pub confidence: f32,
  pub class_id: usize,
  pub class_name: String,
}

impl Detection {
  /// 裁剪后面积为零的框
  pub fn is_degenerate(&self) -> bool {
    box_area(&self.bbox) <= 0.0
  }
}

/// 一张图像的检测结果
#[derive(Debug, Clone, PartialEq)]
pub struct DetectResult {
  pub items: Box<[Detection]>,
  /// 原图尺寸 (宽, 高)
  pub image_size: (u32, u32),
}

impl DetectResult {
  pub fn len(&self) -> usize {
    self.items.len()
  }

  pub fn is_empty(&self) -> bool {
    self.items.is_empty()
  }
}

fn box_area(bbox: &[f32; 4]) -> f32 {
  (bbox[2] - bbox[0]).max(0.0) * (bbox[3] - bbox[1]).max(0.0)
}
