// 该文件是 Shanan （山南西风） 项目的一部分。
// src/model/onnx.rs - ONNX Runtime 推理后端
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

use std::{path::PathBuf, sync::Mutex};

use ort::{
  session::{Session, builder::GraphOptimizationLevel},
  value::TensorRef,
};
use tracing::{debug, info, warn};
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme,
  frame::InputTensor,
  model::{InferenceBackend, InferenceError, OutputLayout, RawOutput, ensure_model},
};

const ONNX_DEFAULT_THREADS: usize = 4;

struct LoadedSession {
  session: Session,
  input_name: String,
  output_name: String,
}

/// ONNX Runtime 后端
///
/// 会话在 `init` 时加载，运行时通过互斥锁串行化。
pub struct OnnxBackend {
  model_path: PathBuf,
  model_source: Option<Url>,
  intra_threads: usize,
  layout: Option<OutputLayout>,
  session: Mutex<Option<LoadedSession>>,
}

/// 从 `onnx:///path/to/model.onnx` 构造后端
///
/// 查询参数：
/// - `threads`：推理线程数，缺省为 4
/// - `layout`：输出布局 `channels`（缺省）、`rows` 或 `auto`
/// - `url`：模型文件不存在时的获取来源，文件路径同时作为缓存位置
#[derive(Debug)]
pub struct OnnxBackendBuilder {
  model_path: PathBuf,
  model_source: Option<Url>,
  intra_threads: usize,
  layout: Option<OutputLayout>,
}

impl FromUrlWithScheme for OnnxBackendBuilder {
  const SCHEME: &'static str = "onnx";
}

impl FromUrl for OnnxBackendBuilder {
  type Error = InferenceError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      return Err(InferenceError::ModelPathError(format!(
        "模型路径必须使用 {} 方案",
        Self::SCHEME
      )));
    }

    let mut builder = OnnxBackendBuilder {
      model_path: PathBuf::from(url.path()),
      model_source: None,
      intra_threads: ONNX_DEFAULT_THREADS,
      layout: Some(OutputLayout::default()),
    };
    for (key, value) in url.query_pairs() {
      match key.as_ref() {
        "threads" => {
          builder.intra_threads = value.parse().map_err(|_| {
            InferenceError::ModelPathError(format!("无效的线程数: {}", value))
          })?;
        }
        "layout" => {
          builder.layout = match value.as_ref() {
            "auto" => None,
            other => Some(other.parse()?),
          };
        }
        "url" => {
          let source = Url::parse(&value)
            .map_err(|e| InferenceError::ModelPathError(format!("无效的模型来源 {}: {}", value, e)))?;
          builder.model_source = Some(source);
        }
        other => warn!("忽略未知的模型参数: {}", other),
      }
    }
    Ok(builder)
  }
}

impl OnnxBackendBuilder {
  pub fn build(self) -> OnnxBackend {
    OnnxBackend {
      model_path: self.model_path,
      model_source: self.model_source,
      intra_threads: self.intra_threads,
      layout: self.layout,
      session: Mutex::new(None),
    }
  }
}

fn runtime_error(context: &str) -> impl Fn(ort::Error) -> InferenceError + '_ {
  move |e| InferenceError::RuntimeError(format!("{}: {}", context, e))
}

impl InferenceBackend for OnnxBackend {
  fn init(&mut self) -> Result<(), InferenceError> {
    let slot = self
      .session
      .get_mut()
      .map_err(|_| InferenceError::RuntimeError("会话锁已损坏".to_string()))?;
    if slot.is_some() {
      return Ok(());
    }

    ensure_model(&self.model_path, self.model_source.as_ref())?;

    info!("加载模型文件: {}", self.model_path.display());
    let session = Session::builder()
      .and_then(|b| b.with_optimization_level(GraphOptimizationLevel::Level3))
      .and_then(|b| b.with_intra_threads(self.intra_threads))
      .and_then(|b| b.commit_from_file(&self.model_path))
      .map_err(|e| InferenceError::ModelLoadError(e.to_string()))?;

    let input_name = session
      .inputs
      .first()
      .map(|i| i.name.clone())
      .ok_or_else(|| InferenceError::ModelLoadError("模型没有输入".to_string()))?;
    let output_name = session
      .outputs
      .first()
      .map(|o| o.name.clone())
      .ok_or_else(|| InferenceError::ModelLoadError("模型没有输出".to_string()))?;
    debug!("模型输入: {}, 输出: {}", input_name, output_name);

    *slot = Some(LoadedSession {
      session,
      input_name,
      output_name,
    });
    info!("模型加载完成");
    Ok(())
  }

  fn infer(&self, input: &InputTensor) -> Result<RawOutput, InferenceError> {
    let mut guard = self
      .session
      .lock()
      .map_err(|_| InferenceError::RuntimeError("会话锁已损坏".to_string()))?;
    let loaded = guard.as_mut().ok_or(InferenceError::NotInitialized)?;

    let view = input.as_array();
    let contiguous = view.as_standard_layout();
    let tensor = TensorRef::from_array_view(&contiguous).map_err(runtime_error("无法创建输入张量"))?;

    let outputs = loaded
      .session
      .run(ort::inputs![loaded.input_name.as_str() => tensor])
      .map_err(runtime_error("推理失败"))?;

    let output = outputs.get(loaded.output_name.as_str()).ok_or_else(|| {
      InferenceError::RuntimeError(format!("找不到输出 '{}'", loaded.output_name))
    })?;
    let (shape, data) = output
      .try_extract_tensor::<f32>()
      .map_err(runtime_error("无法读取输出张量"))?;

    let shape: Vec<usize> = shape.iter().map(|&d| d as usize).collect();
    debug!("模型输出形状: {:?}", shape);
    match self.layout {
      Some(layout) => RawOutput::from_shape_vec(&shape, data.to_vec(), layout),
      None => RawOutput::from_shape_vec_auto(&shape, data.to_vec()),
    }
  }

  fn shutdown(&mut self) {
    if let Ok(slot) = self.session.get_mut()
      && slot.take().is_some()
    {
      info!("释放推理会话");
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn parse_builder(url: &str) -> Result<OnnxBackendBuilder, InferenceError> {
    OnnxBackendBuilder::from_url(&Url::parse(url).unwrap())
  }

  #[test]
  fn defaults_to_channels_first_layout() {
    let builder = parse_builder("onnx:///models/yolov8n.onnx").unwrap();
    assert_eq!(builder.model_path, PathBuf::from("/models/yolov8n.onnx"));
    assert_eq!(builder.intra_threads, ONNX_DEFAULT_THREADS);
    assert_eq!(builder.layout, Some(OutputLayout::ChannelsFirst));
    assert!(builder.model_source.is_none());
  }

  #[test]
  fn reads_query_parameters() {
    let builder = parse_builder(
      "onnx:///tmp/yolov8n.onnx?threads=2&layout=rows&url=https%3A%2F%2Fexample.com%2Fyolov8n.onnx",
    )
    .unwrap();
    assert_eq!(builder.intra_threads, 2);
    assert_eq!(builder.layout, Some(OutputLayout::RowsFirst));
    assert_eq!(
      builder.model_source.map(|u| u.to_string()),
      Some("https://example.com/yolov8n.onnx".to_string())
    );

    assert_eq!(parse_builder("onnx:///m.onnx?layout=auto").unwrap().layout, None);
  }

  #[test]
  fn rejects_bad_parameters() {
    assert!(parse_builder("file:///m.onnx").is_err());
    assert!(parse_builder("onnx:///m.onnx?layout=diagonal").is_err());
    assert!(parse_builder("onnx:///m.onnx?threads=many").is_err());
  }

  #[test]
  fn init_without_model_or_source_fails() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing.onnx");
    let url = Url::parse(&format!("onnx://{}", path.display())).unwrap();
    let mut backend = OnnxBackendBuilder::from_url(&url).unwrap().build();
    assert!(matches!(
      backend.init(),
      Err(InferenceError::ModelLoadError(_))
    ));
  }
}
