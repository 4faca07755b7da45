// 该文件是 Shanan （山南西风） 项目的一部分。
// src/model/download.rs - 模型文件获取与缓存
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

use std::{
  fs::{self, File},
  io::{self, Read},
  path::Path,
};

#[cfg(feature = "fetch_url")]
use std::time::Duration;

use tracing::info;
use url::Url;

use super::InferenceError;

#[cfg(feature = "fetch_url")]
const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(300);

/// 确保模型文件存在
///
/// 文件已存在时直接返回；否则从 `source` 获取一次并写入 `path`。
/// 写入先落到临时文件再重命名，失败时不会留下残缺的模型。
pub fn ensure_model(path: &Path, source: Option<&Url>) -> Result<(), InferenceError> {
  if path.exists() {
    return Ok(());
  }
  let Some(source) = source else {
    return Err(InferenceError::ModelLoadError(format!(
      "模型文件不存在: {}",
      path.display()
    )));
  };

  info!("模型文件不存在, 从 {} 获取", source);
  let mut reader = open_source(source)?;
  store_model(path, &mut reader)?;
  info!("模型已缓存到 {}", path.display());
  Ok(())
}

fn open_source(source: &Url) -> Result<Box<dyn Read>, InferenceError> {
  match source.scheme() {
    "file" => {
      let path = source
        .to_file_path()
        .map_err(|_| InferenceError::ModelPathError(format!("无效的文件路径: {}", source)))?;
      let file = File::open(&path).map_err(|e| {
        InferenceError::ModelLoadError(format!("无法打开模型来源 {}: {}", path.display(), e))
      })?;
      Ok(Box::new(file))
    }
    #[cfg(feature = "fetch_url")]
    "http" | "https" => {
      let response = ureq::get(source.as_str())
        .timeout(DOWNLOAD_TIMEOUT)
        .call()
        .map_err(|e| InferenceError::ModelLoadError(format!("下载模型失败: {}", e)))?;
      Ok(Box::new(response.into_reader()))
    }
    scheme => Err(InferenceError::ModelPathError(format!(
      "不支持的模型来源: {}",
      scheme
    ))),
  }
}

fn store_model(path: &Path, reader: &mut dyn Read) -> Result<(), InferenceError> {
  let io_error = |e: io::Error| InferenceError::ModelLoadError(format!("写入模型文件失败: {}", e));

  if let Some(parent) = path.parent()
    && !parent.as_os_str().is_empty()
  {
    fs::create_dir_all(parent).map_err(io_error)?;
  }

  let partial = path.with_extension("part");
  let written = File::create(&partial).and_then(|mut file| {
    io::copy(reader, &mut file)?;
    file.sync_all()
  });
  if let Err(e) = written {
    let _ = fs::remove_file(&partial);
    return Err(io_error(e));
  }
  fs::rename(&partial, path).map_err(io_error)
}
