// 该文件是 Shanan （山南西风） 项目的一部分。
// src/output/draw.rs - 目标检测结果可视化
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

use image::{Rgb, RgbImage};
use imageproc::{drawing::draw_hollow_rect_mut, rect::Rect};

use crate::postprocess::DetectResult;

const BOX_THICKNESS: i32 = 2;
const BOX_COLOR: [u8; 3] = [0, 0, 255]; // 蓝色

pub struct Draw {
  thickness: i32,
  color: [u8; 3],
}

impl Default for Draw {
  fn default() -> Self {
    Self {
      thickness: BOX_THICKNESS,
      color: BOX_COLOR,
    }
  }
}

impl Draw {
  // bbox 为原图像素坐标 [x_min, y_min, x_max, y_max]
  fn draw_bbox(&self, image: &mut RgbImage, bbox: &[f32; 4]) {
    let (w, h) = (image.width() as i32, image.height() as i32);
    if w == 0 || h == 0 {
      return;
    }

    let x_min = (bbox[0].floor() as i32).clamp(0, w - 1);
    let y_min = (bbox[1].floor() as i32).clamp(0, h - 1);
    let x_max = (bbox[2].ceil() as i32).clamp(0, w - 1);
    let y_max = (bbox[3].ceil() as i32).clamp(0, h - 1);

    // 零面积的框不绘制
    if x_min >= x_max || y_min >= y_max {
      return;
    }

    for t in 0..self.thickness {
      let (x0, y0) = (x_min + t, y_min + t);
      let (x1, y1) = (x_max - t, y_max - t);
      if x0 >= x1 || y0 >= y1 {
        break;
      }
      let rect = Rect::at(x0, y0).of_size((x1 - x0 + 1) as u32, (y1 - y0 + 1) as u32);
      draw_hollow_rect_mut(image, rect, Rgb(self.color));
    }
  }

  pub fn draw_detections_on_image(&self, image: &mut RgbImage, result: &DetectResult) {
    for item in result.items.iter() {
      self.draw_bbox(image, &item.bbox);
    }
  }

  pub fn draw_detection(&self, image: &RgbImage, result: &DetectResult) -> RgbImage {
    let mut image = image.clone();
    self.draw_detections_on_image(&mut image, result);
    image
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::postprocess::Detection;

  fn result_with(bbox: [f32; 4]) -> DetectResult {
    DetectResult {
      items: vec![Detection {
        bbox,
        confidence: 0.9,
        class_id: 0,
        class_name: "person".to_string(),
      }]
      .into_boxed_slice(),
      image_size: (20, 20),
    }
  }

  #[test]
  fn draws_box_edges_only() {
    let image = RgbImage::new(20, 20);
    let drawn = Draw::default().draw_detection(&image, &result_with([2.0, 2.0, 12.0, 12.0]));

    assert_eq!(*drawn.get_pixel(2, 2), Rgb(BOX_COLOR));
    assert_eq!(*drawn.get_pixel(12, 7), Rgb(BOX_COLOR));
    assert_eq!(*drawn.get_pixel(3, 3), Rgb(BOX_COLOR));
    assert_eq!(*drawn.get_pixel(7, 7), Rgb([0, 0, 0]));
  }

  #[test]
  fn degenerate_box_leaves_image_untouched() {
    let image = RgbImage::new(20, 20);
    let drawn = Draw::default().draw_detection(&image, &result_with([5.0, 0.0, 5.0, 0.0]));
    assert_eq!(drawn, image);
  }
}
