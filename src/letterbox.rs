// 该文件是 Shanan （山南西风） 项目的一部分。
// src/letterbox.rs - 等比缩放与灰边填充
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

use image::{Rgb, RgbImage, imageops};
use tracing::debug;

use crate::config::TargetSize;

/// 默认填充颜色（中灰）
pub const LETTERBOX_COLOR: [u8; 3] = [114, 114, 114];

/// letterbox 变换结果
///
/// `scale` 与 `pad_x` / `pad_y` 记录了从原图到模型输入的精确映射，
/// 后处理阶段依赖它们把检测框还原到原图坐标。
#[derive(Debug, Clone)]
pub struct LetterboxResult {
  /// 填充后的图像，尺寸恒等于 `target_size`
  pub padded_image: RgbImage,
  /// 统一缩放系数
  pub scale: f32,
  /// 水平方向单侧填充量（可能为小数）
  pub pad_x: f32,
  /// 垂直方向单侧填充量（可能为小数）
  pub pad_y: f32,
  /// 目标尺寸 (宽, 高)
  pub target_size: (u32, u32),
}

/// 四边实际填充的像素数
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Padding {
  pub top: u32,
  pub bottom: u32,
  pub left: u32,
  pub right: u32,
}

impl LetterboxResult {
  /// 由 `pad_x` / `pad_y` 推出的四边像素填充
  pub fn padding(&self) -> Padding {
    let (top, bottom) = split_padding(self.pad_y);
    let (left, right) = split_padding(self.pad_x);
    Padding {
      top,
      bottom,
      left,
      right,
    }
  }

  /// 缩放后（未填充）的图像尺寸
  pub fn resized_size(&self) -> (u32, u32) {
    let p = self.padding();
    (
      self.target_size.0 - p.left - p.right,
      self.target_size.1 - p.top - p.bottom,
    )
  }
}

// 奇数总填充时多出的一个像素落在尾侧
fn split_padding(half: f32) -> (u32, u32) {
  let leading = (half - 0.1).round_ties_even().max(0.0) as u32;
  let trailing = (half + 0.1).round_ties_even().max(0.0) as u32;
  (leading, trailing)
}

/// 等比缩放图像并用常量颜色填充至目标尺寸
///
/// 调用方必须保证图像宽高非零。
pub fn letterbox(image: &RgbImage, target_size: TargetSize, pad_color: [u8; 3]) -> LetterboxResult {
  let (target_w, target_h) = target_size.dimensions();
  let (src_w, src_h) = image.dimensions();

  let scale = (target_w as f32 / src_w as f32).min(target_h as f32 / src_h as f32);

  // 极端宽高比下某一边可能舍入为 0，至少保留一个像素
  let new_w = ((src_w as f32 * scale).round_ties_even() as u32).clamp(1, target_w);
  let new_h = ((src_h as f32 * scale).round_ties_even() as u32).clamp(1, target_h);

  let resized = if (new_w, new_h) == (src_w, src_h) {
    image.clone()
  } else {
    imageops::resize(image, new_w, new_h, imageops::FilterType::Triangle)
  };

  let pad_x = (target_w - new_w) as f32 / 2.0;
  let pad_y = (target_h - new_h) as f32 / 2.0;
  let (top, _) = split_padding(pad_y);
  let (left, _) = split_padding(pad_x);

  let mut padded_image = RgbImage::from_pixel(target_w, target_h, Rgb(pad_color));
  imageops::replace(&mut padded_image, &resized, left as i64, top as i64);

  debug!(
    "letterbox: {}x{} -> {}x{}, 缩放 {:.4}, 填充 ({:.1}, {:.1})",
    src_w, src_h, new_w, new_h, scale, pad_x, pad_y
  );

  LetterboxResult {
    padded_image,
    scale,
    pad_x,
    pad_y,
    target_size: (target_w, target_h),
  }
}
