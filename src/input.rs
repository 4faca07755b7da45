// 该文件是 Shanan （山南西风） 项目的一部分。
// src/input.rs - 图像输入
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
use thiserror::Error;
use tracing::{error, info};
use url::Url;

use crate::FromUrl;

#[cfg(feature = "fetch_url")]
mod fetch_url;

const IMAGE_FILE_SCHEME: &str = "image";
const FILE_SCHEME: &str = "file";

#[derive(Error, Debug)]
pub enum InputError {
  #[error("URI 方案不支持: {0}")]
  SchemeMismatch(String),
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("图像解码错误: {0}")]
  ImageLoadError(#[from] image::ImageError),
  #[error("图像尺寸为零: {0}x{1}")]
  EmptyImage(u32, u32),
  #[error("下载图像失败: {0}")]
  FetchError(String),
}

/// 图像来源
///
/// 服务边界上的两种输入统一为一个枚举，流水线本身只接受解码后的 `RgbImage`。
#[derive(Debug, Clone)]
pub enum ImageSource {
  /// 已读入内存的编码图像（例如上传的文件）
  File(Vec<u8>),
  /// `image://`、`file://`、`http(s)://` 地址
  Url(Url),
}

impl FromUrl for ImageSource {
  type Error = InputError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    match url.scheme() {
      IMAGE_FILE_SCHEME | FILE_SCHEME => Ok(ImageSource::Url(url.clone())),
      #[cfg(feature = "fetch_url")]
      "http" | "https" => Ok(ImageSource::Url(url.clone())),
      scheme => {
        error!("不支持的输入方案: '{}'", scheme);
        Err(InputError::SchemeMismatch(scheme.to_string()))
      }
    }
  }
}

impl ImageSource {
  /// 读取原始字节
  pub fn read_bytes(&self) -> Result<Vec<u8>, InputError> {
    match self {
      ImageSource::File(bytes) => Ok(bytes.clone()),
      ImageSource::Url(url) => match url.scheme() {
        IMAGE_FILE_SCHEME | FILE_SCHEME => Ok(std::fs::read(url.path())?),
        #[cfg(feature = "fetch_url")]
        "http" | "https" => self::fetch_url::fetch(url),
        scheme => Err(InputError::SchemeMismatch(scheme.to_string())),
      },
    }
  }

  /// 解码为 RGB 图像，拒绝宽或高为零的图像
  pub fn decode(&self) -> Result<RgbImage, InputError> {
    let bytes = self.read_bytes()?;
    let image = decode_bytes(&bytes)?;
    info!("图像加载成功: {}x{}", image.width(), image.height());
    Ok(image)
  }
}

/// 解码内存中的编码图像
pub fn decode_bytes(bytes: &[u8]) -> Result<RgbImage, InputError> {
  let image = image::load_from_memory(bytes)?.to_rgb8();
  let (width, height) = image.dimensions();
  if width == 0 || height == 0 {
    return Err(InputError::EmptyImage(width, height));
  }
  Ok(image)
}

#[cfg(test)]
mod tests {
  use super::*;
  use image::{ImageFormat, Rgb};
  use std::io::Cursor;

  fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let image = RgbImage::from_pixel(width, height, Rgb([9, 8, 7]));
    let mut buf = Cursor::new(Vec::new());
    image.write_to(&mut buf, ImageFormat::Png).unwrap();
    buf.into_inner()
  }

  #[test]
  fn decodes_in_memory_upload() {
    let image = ImageSource::File(png_bytes(12, 5)).decode().unwrap();
    assert_eq!(image.dimensions(), (12, 5));
    assert_eq!(*image.get_pixel(0, 0), Rgb([9, 8, 7]));
  }

  #[test]
  fn rejects_undecodable_bytes() {
    let err = ImageSource::File(b"not an image".to_vec()).decode().unwrap_err();
    assert!(matches!(err, InputError::ImageLoadError(_)));
  }

  #[test]
  fn reads_image_scheme_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("meal.png");
    std::fs::write(&path, png_bytes(3, 4)).unwrap();

    let url = Url::parse(&format!("image://{}", path.display())).unwrap();
    let source = ImageSource::from_url(&url).unwrap();
    assert_eq!(source.decode().unwrap().dimensions(), (3, 4));
  }

  #[test]
  fn unknown_scheme_is_rejected() {
    let url = Url::parse("ftp://example.com/a.png").unwrap();
    assert!(matches!(
      ImageSource::from_url(&url),
      Err(InputError::SchemeMismatch(_))
    ));
  }
}
