// 该文件是 Shanan （山南西风） 项目的一部分。
// src/output/json_record.rs - JSON 结果记录
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

use std::path::PathBuf;

use image::RgbImage;
use serde_json::{Value, json};
use thiserror::Error;
use tracing::info;
use url::Url;

use crate::{FromUrl, FromUrlWithScheme, output::Render, postprocess::DetectResult};

const STDOUT_PATH: &str = "-";

#[derive(Error, Debug)]
pub enum JsonRecordError {
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("JSON 序列化错误: {0}")]
  JsonError(#[from] serde_json::Error),
  #[error("URI 方案不匹配: {0}")]
  SchemeMismatch(String),
}

/// 检测结果的 JSON 表示
///
/// 字段与检测接口的响应体一致：`success`、`results`、`image_size`、
/// `detections_count`。
pub fn to_json(result: &DetectResult) -> Value {
  let results: Vec<Value> = result
    .items
    .iter()
    .map(|item| {
      json!({
        "bbox": item.bbox,
        "confidence": item.confidence,
        "class_id": item.class_id,
        "class_name": item.class_name,
      })
    })
    .collect();

  json!({
    "success": true,
    "results": results,
    "image_size": [result.image_size.0, result.image_size.1],
    "detections_count": result.items.len(),
  })
}

/// 把检测结果写为 JSON 文件；路径为 `-` 时写到标准输出
pub struct JsonRecordOutput {
  path: PathBuf,
}

impl FromUrlWithScheme for JsonRecordOutput {
  const SCHEME: &'static str = "json";
}

impl FromUrl for JsonRecordOutput {
  type Error = JsonRecordError;

  fn from_url(uri: &Url) -> Result<Self, Self::Error> {
    if uri.scheme() != Self::SCHEME {
      return Err(JsonRecordError::SchemeMismatch(format!(
        "期望保存方式 '{}', 实际保存方式 '{}'",
        Self::SCHEME,
        uri.scheme()
      )));
    }

    Ok(JsonRecordOutput {
      path: PathBuf::from(uri.path()),
    })
  }
}

impl Render<RgbImage, DetectResult> for JsonRecordOutput {
  type Error = JsonRecordError;

  fn render_result(&self, _frame: &RgbImage, result: &DetectResult) -> Result<(), Self::Error> {
    let text = serde_json::to_string_pretty(&to_json(result))?;

    if self.path.as_os_str() == STDOUT_PATH {
      println!("{}", text);
      return Ok(());
    }

    if let Some(parent) = self.path.parent()
      && !parent.as_os_str().is_empty()
    {
      std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&self.path, text)?;
    info!("保存检测结果到文件: {}", self.path.display());
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::postprocess::Detection;

  fn sample() -> DetectResult {
    DetectResult {
      items: vec![Detection {
        bbox: [540.0, 260.0, 740.0, 460.0],
        confidence: 0.5,
        class_id: 53,
        class_name: "pizza".to_string(),
      }]
      .into_boxed_slice(),
      image_size: (1280, 720),
    }
  }

  #[test]
  fn json_matches_response_body_shape() {
    let value = to_json(&sample());
    assert_eq!(value["success"], true);
    assert_eq!(value["detections_count"], 1);
    assert_eq!(value["image_size"], json!([1280, 720]));
    assert_eq!(value["results"][0]["class_name"], "pizza");
    assert_eq!(value["results"][0]["class_id"], 53);
    assert_eq!(value["results"][0]["bbox"], json!([540.0, 260.0, 740.0, 460.0]));
  }

  #[test]
  fn writes_record_file_creating_parent_dirs() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("result.json");
    let url = Url::parse(&format!("json://{}", path.display())).unwrap();

    let output = JsonRecordOutput::from_url(&url).unwrap();
    output.render_result(&RgbImage::new(1, 1), &sample()).unwrap();

    let text = std::fs::read_to_string(&path).unwrap();
    let value: Value = serde_json::from_str(&text).unwrap();
    assert_eq!(value["detections_count"], 1);
  }

  #[test]
  fn empty_result_is_still_successful() {
    let result = DetectResult {
      items: Vec::new().into_boxed_slice(),
      image_size: (10, 10),
    };
    let value = to_json(&result);
    assert_eq!(value["success"], true);
    assert_eq!(value["results"], json!([]));
  }
}
