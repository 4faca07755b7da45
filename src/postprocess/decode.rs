// 该文件是 Shanan （山南西风） 项目的一部分。
// src/postprocess/decode.rs - 候选框解码
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

use crate::{model::RawOutput, postprocess::RawDetection};

/// 将原始输出解码为候选框
///
/// 每行为 (cx, cy, w, h, objectness, class_score_0..N)。先按 objectness 过滤，
/// 再按 objectness * class_score 的最大值过滤，两个阈值相同。
pub fn decode(output: &RawOutput, conf_threshold: f32) -> Vec<RawDetection> {
  let mut items = Vec::new();

  for row in output.rows().rows() {
    let objectness = row[4];
    if !(objectness > conf_threshold) {
      continue;
    }

    // 取首个最大值，与 argmax 一致
    let mut class_id = 0usize;
    let mut score = f32::NEG_INFINITY;
    for (c, &class_score) in row.iter().skip(5).enumerate() {
      let confidence = objectness * class_score;
      if confidence > score {
        score = confidence;
        class_id = c;
      }
    }

    if !(score > conf_threshold) {
      continue;
    }

    let (cx, cy, w, h) = (row[0], row[1], row[2], row[3]);
    items.push(RawDetection {
      class_id,
      score,
      bbox: [cx - w / 2.0, cy - h / 2.0, cx + w / 2.0, cy + h / 2.0],
    });
  }

  debug!(
    "解码 {} 个候选框, 保留 {} 个",
    output.num_boxes(),
    items.len()
  );
  items
}
