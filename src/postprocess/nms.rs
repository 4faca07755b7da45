// 该文件是 Shanan （山南西风） 项目的一部分。
// src/postprocess/nms.rs - 非极大值抑制
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

use tracing::debug;

use crate::{
  config::NmsPolicy,
  postprocess::{RawDetection, box_area},
};

/// 计算两个边界框的 IoU，任一框面积为零时返回 0
pub fn iou(a: &[f32; 4], b: &[f32; 4]) -> f32 {
  let area_a = box_area(a);
  let area_b = box_area(b);
  if area_a <= 0.0 || area_b <= 0.0 {
    return 0.0;
  }

  let x1 = a[0].max(b[0]);
  let y1 = a[1].max(b[1]);
  let x2 = a[2].min(b[2]);
  let y2 = a[3].min(b[3]);

  let intersection = (x2 - x1).max(0.0) * (y2 - y1).max(0.0);
  let union = area_a + area_b - intersection;

  if union > 0.0 { intersection / union } else { 0.0 }
}

/// 非极大值抑制
///
/// 按分数降序（稳定排序）贪心选取，丢弃与已选框 IoU 大于 `iou_threshold` 的框，
/// 最多保留 `max_det` 个。输出保持分数降序。
pub fn nms(
  mut candidates: Vec<RawDetection>,
  conf_threshold: f32,
  iou_threshold: f32,
  max_det: usize,
  policy: NmsPolicy,
) -> Vec<RawDetection> {
  let total = candidates.len();
  candidates.retain(|det| det.score > conf_threshold);
  candidates.sort_by(|a, b| b.score.total_cmp(&a.score));

  let mut suppressed = vec![false; candidates.len()];
  let mut kept = Vec::new();

  for i in 0..candidates.len() {
    if kept.len() >= max_det {
      break;
    }
    if suppressed[i] {
      continue;
    }

    let best = &candidates[i];
    for j in (i + 1)..candidates.len() {
      if suppressed[j] {
        continue;
      }
      let other = &candidates[j];
      if policy == NmsPolicy::PerClass && other.class_id != best.class_id {
        continue;
      }
      if iou(&best.bbox, &other.bbox) > iou_threshold {
        suppressed[j] = true;
      }
    }
    kept.push(i);
  }

  let mut slots: Vec<Option<RawDetection>> = candidates.into_iter().map(Some).collect();
  let result: Vec<RawDetection> = kept.into_iter().filter_map(|i| slots[i].take()).collect();

  debug!("NMS: {} 个候选框, 保留 {} 个", total, result.len());
  result
}
