// 该文件是 Shanan （山南西风） 项目的一部分。
// src/input/fetch_url.rs - 通过 HTTP 下载图像
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

use std::{io::Read, time::Duration};

use tracing::debug;
use url::Url;

use super::InputError;

const FETCH_TIMEOUT: Duration = Duration::from_secs(30);
const FETCH_LIMIT: u64 = 20 * 1024 * 1024;

pub(super) fn fetch(url: &Url) -> Result<Vec<u8>, InputError> {
  debug!("下载图像: {}", url);
  let response = ureq::get(url.as_str())
    .timeout(FETCH_TIMEOUT)
    .call()
    .map_err(|e| InputError::FetchError(e.to_string()))?;

  let bytes = read_limited(response.into_reader(), FETCH_LIMIT)?;
  debug!("下载完成: {} 字节", bytes.len());
  Ok(bytes)
}

// 多读一个字节以区分恰好达到上限与超出上限
fn read_limited(reader: impl Read, limit: u64) -> Result<Vec<u8>, InputError> {
  let mut bytes = Vec::new();
  reader.take(limit + 1).read_to_end(&mut bytes)?;
  if bytes.len() as u64 > limit {
    return Err(InputError::FetchError(format!(
      "响应内容超过 {} 字节上限",
      limit
    )));
  }
  Ok(bytes)
}

#[cfg(test)]
mod tests {
  use std::io::Cursor;

  use super::*;

  #[test]
  fn body_at_limit_is_accepted() {
    let bytes = read_limited(Cursor::new(vec![7u8; 16]), 16).unwrap();
    assert_eq!(bytes.len(), 16);
  }

  #[test]
  fn oversized_body_is_rejected() {
    assert!(matches!(
      read_limited(Cursor::new(vec![7u8; 17]), 16),
      Err(InputError::FetchError(_))
    ));
  }
}
