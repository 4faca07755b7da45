// 该文件是 Shanan （山南西风） 项目的一部分。
// src/postprocess/unmap.rs - 坐标还原
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

use tracing::warn;

use crate::{
  label::ClassLabelTable,
  letterbox::LetterboxResult,
  postprocess::{Detection, RawDetection},
};

/// 将 letterbox 坐标还原到原图像素坐标
///
/// 先去除填充再除以缩放系数，然后裁剪到 `[0, W] x [0, H]`。
/// 被裁剪为零面积的框仍会返回。
pub fn unmap(
  detections: &[RawDetection],
  letterbox: &LetterboxResult,
  original_size: (u32, u32),
  labels: &ClassLabelTable,
) -> Vec<Detection> {
  let (orig_w, orig_h) = (original_size.0 as f32, original_size.1 as f32);
  let scale = letterbox.scale;

  detections
    .iter()
    .map(|det| {
      let [x1, y1, x2, y2] = det.bbox;
      let x1 = ((x1 - letterbox.pad_x) / scale).clamp(0.0, orig_w);
      let y1 = ((y1 - letterbox.pad_y) / scale).clamp(0.0, orig_h);
      let x2 = ((x2 - letterbox.pad_x) / scale).clamp(0.0, orig_w);
      let y2 = ((y2 - letterbox.pad_y) / scale).clamp(0.0, orig_h);

      if det.class_id >= labels.len() {
        warn!("类别 {} 超出标签表范围 ({})", det.class_id, labels.len());
      }

      Detection {
        bbox: [x1.min(x2), y1.min(y2), x1.max(x2), y1.max(y2)],
        confidence: det.score,
        class_id: det.class_id,
        class_name: labels.name(det.class_id).to_string(),
      }
    })
    .collect()
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{config::TargetSize, letterbox::{LETTERBOX_COLOR, letterbox}};
  use image::RgbImage;

  fn hd_letterbox() -> LetterboxResult {
    letterbox(&RgbImage::new(1280, 720), TargetSize::Square(640), LETTERBOX_COLOR)
  }

  fn raw(class_id: usize, bbox: [f32; 4]) -> RawDetection {
    RawDetection {
      class_id,
      score: 0.8,
      bbox,
    }
  }

  #[test]
  fn centered_box_maps_back_by_formula() {
    let lb = hd_letterbox();
    // 中心 (320, 320), 宽高 100
    let out = unmap(
      &[raw(0, [270.0, 270.0, 370.0, 370.0])],
      &lb,
      (1280, 720),
      ClassLabelTable::coco(),
    );

    assert_eq!(out[0].bbox, [540.0, 260.0, 740.0, 460.0]);
    assert_eq!(out[0].class_name, "person");
    assert_eq!(out[0].confidence, 0.8);
  }

  #[test]
  fn round_trip_recovers_original_coordinates() {
    let lb = letterbox(&RgbImage::new(1000, 750), TargetSize::Square(640), LETTERBOX_COLOR);
    let original = [123.4f32, 56.7, 800.2, 700.9];
    let forward = original.map(|v| v * lb.scale);
    let letterboxed = [
      forward[0] + lb.pad_x,
      forward[1] + lb.pad_y,
      forward[2] + lb.pad_x,
      forward[3] + lb.pad_y,
    ];

    let out = unmap(&[raw(2, letterboxed)], &lb, (1000, 750), ClassLabelTable::coco());
    for (got, want) in out[0].bbox.iter().zip(original) {
      assert!((got - want).abs() < 1e-3, "{} != {}", got, want);
    }
  }

  #[test]
  fn boxes_outside_image_are_clipped_not_dropped() {
    let lb = hd_letterbox();
    let out = unmap(
      &[
        raw(0, [-50.0, 100.0, 700.0, 600.0]),
        // 完全落在上方填充区域
        raw(1, [10.0, 0.0, 50.0, 100.0]),
      ],
      &lb,
      (1280, 720),
      ClassLabelTable::coco(),
    );

    assert_eq!(out.len(), 2);
    assert_eq!(out[0].bbox, [0.0, 0.0, 1280.0, 720.0]);
    assert_eq!(out[1].bbox[1], 0.0);
    assert_eq!(out[1].bbox[3], 0.0);
    assert!(out[1].is_degenerate());
  }

  #[test]
  fn unknown_class_gets_sentinel_label() {
    let lb = hd_letterbox();
    let out = unmap(
      &[raw(500, [300.0, 300.0, 310.0, 310.0])],
      &lb,
      (1280, 720),
      ClassLabelTable::coco(),
    );
    assert_eq!(out[0].class_name, "unknown");
    assert_eq!(out[0].class_id, 500);
  }

  #[test]
  fn corners_stay_ordered_within_bounds() {
    let lb = hd_letterbox();
    let out = unmap(
      &[raw(0, [400.0, 400.0, 300.0, 300.0])],
      &lb,
      (1280, 720),
      ClassLabelTable::coco(),
    );
    let [x1, y1, x2, y2] = out[0].bbox;
    assert!(0.0 <= x1 && x1 <= x2 && x2 <= 1280.0);
    assert!(0.0 <= y1 && y1 <= y2 && y2 <= 720.0);
  }
}
