// 该文件是 Shanan （山南西风） 项目的一部分。
// src/frame.rs - NCHW 输入张量定义
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

use image::RgbImage;
use ndarray::{Array4, ArrayView4};

use crate::config::ChannelOrder;

const RGB_CHANNELS: usize = 3;

/// 归一化后的 NCHW 浮点张量，形状为 (1, 3, H, W)
#[derive(Debug, Clone)]
pub struct InputTensor {
  data: Array4<f32>,
}

impl InputTensor {
  /// 全零张量，主要用于模型预热
  pub fn zeros(width: u32, height: u32) -> Self {
    Self {
      data: Array4::zeros((1, RGB_CHANNELS, height as usize, width as usize)),
    }
  }

  pub fn height(&self) -> usize {
    self.data.shape()[2]
  }

  pub fn width(&self) -> usize {
    self.data.shape()[3]
  }

  pub fn shape(&self) -> [usize; 4] {
    [1, RGB_CHANNELS, self.height(), self.width()]
  }

  pub fn as_array(&self) -> ArrayView4<'_, f32> {
    self.data.view()
  }
}

/// 将填充后的图像转为模型输入张量
///
/// 按 `order` 重排通道，除以 255.0，HWC 转为 CHW 并加上批次维度。
pub fn to_tensor(image: &RgbImage, order: ChannelOrder) -> InputTensor {
  let (width, height) = image.dimensions();
  let source_channel = |c: usize| match order {
    ChannelOrder::Rgb => c,
    ChannelOrder::Bgr => RGB_CHANNELS - 1 - c,
  };

  let data = Array4::from_shape_fn(
    (1, RGB_CHANNELS, height as usize, width as usize),
    |(_, c, y, x)| image.get_pixel(x as u32, y as u32)[source_channel(c)] as f32 / 255.0,
  );

  InputTensor { data }
}

#[cfg(test)]
mod tests {
  use super::*;
  use image::Rgb;

  #[test]
  fn bgr_tensor_is_channel_first_and_normalized() {
    let mut image = RgbImage::from_pixel(4, 2, Rgb([255, 0, 51]));
    image.put_pixel(3, 1, Rgb([0, 255, 0]));

    let tensor = to_tensor(&image, ChannelOrder::Bgr);
    let array = tensor.as_array();

    assert_eq!(tensor.shape(), [1, 3, 2, 4]);
    assert_eq!(array[[0, 0, 0, 0]], 0.2);
    assert_eq!(array[[0, 1, 0, 0]], 0.0);
    assert_eq!(array[[0, 2, 0, 0]], 1.0);
    assert_eq!(array[[0, 1, 1, 3]], 1.0);
    assert!(array.iter().all(|v| (0.0..=1.0).contains(v)));
  }

  #[test]
  fn rgb_tensor_keeps_channel_order() {
    let image = RgbImage::from_pixel(1, 1, Rgb([255, 0, 51]));
    let tensor = to_tensor(&image, ChannelOrder::Rgb);
    let array = tensor.as_array();

    assert_eq!(array[[0, 0, 0, 0]], 1.0);
    assert_eq!(array[[0, 2, 0, 0]], 0.2);
  }

  #[test]
  fn conversion_is_deterministic() {
    let image = RgbImage::from_fn(8, 5, |x, y| Rgb([(x * 30) as u8, (y * 40) as u8, 7]));
    let a = to_tensor(&image, ChannelOrder::Bgr);
    let b = to_tensor(&image, ChannelOrder::Bgr);
    assert_eq!(a.as_array(), b.as_array());
  }
}
