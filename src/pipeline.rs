// 该文件是 Shanan （山南西风） 项目的一部分。
// src/pipeline.rs - 检测流水线
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
use tracing::{debug, info};

use crate::{
  config::{ConfigError, PipelineConfig},
  frame::{InputTensor, to_tensor},
  label::ClassLabelTable,
  letterbox::{LetterboxResult, letterbox},
  model::{InferenceBackend, InferenceError, RawOutput},
  postprocess::{DetectResult, Detection, decode, nms, unmap},
};

#[derive(Error, Debug)]
pub enum PipelineError {
  #[error("配置错误: {0}")]
  Config(#[from] ConfigError),
  #[error("推理失败: {0}")]
  Inference(#[from] InferenceError),
  #[error("图像尺寸为零: {0}x{1}")]
  EmptyImage(u32, u32),
}

/// 检测器：letterbox -> 张量 -> 推理 -> 解码 -> NMS -> 坐标还原
pub struct Detector<B> {
  backend: B,
  config: PipelineConfig,
  labels: ClassLabelTable,
}

impl<B: InferenceBackend> Detector<B> {
  pub fn new(backend: B, config: PipelineConfig) -> Result<Self, PipelineError> {
    config.validate()?;
    Ok(Self {
      backend,
      config,
      labels: ClassLabelTable::default(),
    })
  }

  pub fn with_labels(mut self, labels: ClassLabelTable) -> Self {
    self.labels = labels;
    self
  }

  pub fn config(&self) -> &PipelineConfig {
    &self.config
  }

  pub fn labels(&self) -> &ClassLabelTable {
    &self.labels
  }

  pub fn backend(&self) -> &B {
    &self.backend
  }

  /// 初始化推理后端
  pub fn init(&mut self) -> Result<(), PipelineError> {
    info!("初始化推理后端");
    self.backend.init()?;
    Ok(())
  }

  /// 释放推理后端
  pub fn shutdown(&mut self) {
    info!("关闭推理后端");
    self.backend.shutdown();
  }

  /// 用全零输入跑一次推理，丢弃结果
  pub fn warmup(&self) -> Result<(), PipelineError> {
    let (w, h) = self.config.target_size.dimensions();
    self.backend.infer(&InputTensor::zeros(w, h))?;
    Ok(())
  }

  /// 预处理：letterbox 并转为输入张量
  pub fn prepare(&self, image: &RgbImage) -> Result<(LetterboxResult, InputTensor), PipelineError> {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
      return Err(PipelineError::EmptyImage(width, height));
    }
    let letterboxed = letterbox(image, self.config.target_size, self.config.pad_color);
    let tensor = to_tensor(&letterboxed.padded_image, self.config.channel_order);
    Ok((letterboxed, tensor))
  }

  pub fn detect(&self, image: &RgbImage) -> Result<DetectResult, PipelineError> {
    let (letterboxed, tensor) = self.prepare(image)?;
    debug!("输入张量形状: {:?}", tensor.shape());

    let raw = self.backend.infer(&tensor)?;
    let items = postprocess(&raw, &letterboxed, image.dimensions(), &self.config, &self.labels);
    info!("检测完成: 共 {} 个目标", items.len());

    Ok(DetectResult {
      items: items.into_boxed_slice(),
      image_size: image.dimensions(),
    })
  }
}

/// 后处理：解码、NMS 与坐标还原，不涉及推理后端
pub fn postprocess(
  raw: &RawOutput,
  letterboxed: &LetterboxResult,
  original_size: (u32, u32),
  config: &PipelineConfig,
  labels: &ClassLabelTable,
) -> Vec<Detection> {
  let candidates = decode(raw, config.conf_threshold);
  let kept = nms(
    candidates,
    config.conf_threshold,
    config.iou_threshold,
    config.max_det,
    config.nms_policy,
  );
  unmap(&kept, letterboxed, original_size, labels)
}
