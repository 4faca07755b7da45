// 该文件是 Shanan （山南西风） 项目的一部分。
// src/args.rs - 项目参数配置
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

use clap::Parser;
use url::Url;

use shanan_detect::{
  ChannelOrder, NmsPolicy, PipelineConfig, TargetSize,
  config::{DEFAULT_CONF_THRESHOLD, DEFAULT_IOU_THRESHOLD, DEFAULT_MAX_DET},
  letterbox::LETTERBOX_COLOR,
};

/// Shanan 检测参数配置
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
  /// 模型地址，例如 onnx:///models/yolov8n.onnx?threads=4
  /// 可选参数:
  /// - layout=channels|rows|auto: 输出布局，缺省为 channels
  /// - url=https://...: 模型文件不存在时下载并缓存到该路径
  #[arg(long, value_name = "MODEL")]
  pub model: Url,

  /// 输入来源
  /// 支持格式:
  /// - 本地图片: image:///path/to/a.jpg 或 file:///path/to/a.jpg
  /// - 网络图片: https://example.com/a.jpg
  #[arg(long, value_name = "SOURCE")]
  pub input: Url,

  /// 输出路径
  /// 支持格式:
  /// - 标注图像: image:///path/to/out.png
  /// - JSON 结果: json:///path/to/out.json 或 json:- (标准输出)
  #[arg(long, value_name = "OUTPUT")]
  pub output: Url,

  /// 类别标签文件（JSON 数组或每行一个名称），缺省为 COCO 80 类
  #[arg(long, value_name = "FILE")]
  pub labels: Option<PathBuf>,

  /// 模型输入尺寸，例如 640 或 640x480
  #[arg(long, default_value = "640", value_name = "SIZE")]
  pub input_size: TargetSize,

  /// 模型期望的通道顺序 (rgb / bgr)
  #[arg(long, default_value = "bgr", value_name = "ORDER")]
  pub channel_order: ChannelOrder,

  /// 置信度阈值 (0.0 - 1.0)
  #[arg(long, default_value_t = DEFAULT_CONF_THRESHOLD, value_name = "THRESHOLD")]
  pub confidence: f32,

  /// NMS IOU 阈值 (0.0 - 1.0)
  #[arg(long, default_value_t = DEFAULT_IOU_THRESHOLD, value_name = "THRESHOLD")]
  pub nms_threshold: f32,

  /// 最多保留的检测数量
  #[arg(long, default_value_t = DEFAULT_MAX_DET, value_name = "COUNT")]
  pub max_det: usize,

  /// NMS 策略 (agnostic / per-class)
  #[arg(long, default_value = "agnostic", value_name = "POLICY")]
  pub nms_policy: NmsPolicy,
}

impl Args {
  pub fn pipeline_config(&self) -> PipelineConfig {
    PipelineConfig {
      target_size: self.input_size,
      pad_color: LETTERBOX_COLOR,
      channel_order: self.channel_order,
      conf_threshold: self.confidence,
      iou_threshold: self.nms_threshold,
      max_det: self.max_det,
      nms_policy: self.nms_policy,
    }
  }
}
