// 该文件是 Shanan （山南西风） 项目的一部分。
// src/main.rs - 项目主程序
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

mod args;

use anyhow::Result;
use clap::Parser;
use tracing::info;

use shanan_detect::{
  ClassLabelTable, Detector, FromUrl,
  input::ImageSource,
  model::OnnxBackendBuilder,
  output::OutputWrapper,
  task::{OneShotTask, Task},
};

fn main() -> Result<()> {
  tracing_subscriber::fmt::init();

  let args = args::Args::parse();

  info!("模型文件路径: {}", args.model);
  info!("输入来源: {}", args.input);
  info!("输出路径: {}", args.output);
  info!("置信度阈值: {}", args.confidence);
  info!("NMS 阈值: {}", args.nms_threshold);

  let labels = match &args.labels {
    Some(path) => ClassLabelTable::load(path)?,
    None => ClassLabelTable::coco().clone(),
  };

  let image = ImageSource::from_url(&args.input)?.decode()?;
  let backend = OnnxBackendBuilder::from_url(&args.model)?.build();
  let output = OutputWrapper::from_url(&args.output)?;

  let mut detector = Detector::new(backend, args.pipeline_config())?.with_labels(labels);
  detector.init()?;

  let result = OneShotTask.run_task(std::iter::once(image), &detector, output)?;
  for item in result.items.iter() {
    info!(
      "  - {}: {:.2}% at ({:.0}, {:.0}, {:.0}, {:.0})",
      item.class_name,
      item.confidence * 100.0,
      item.bbox[0],
      item.bbox[1],
      item.bbox[2],
      item.bbox[3]
    );
  }

  detector.shutdown();
  Ok(())
}
