// 该文件是 Shanan （山南西风） 项目的一部分。
// src/task.rs - 推理任务
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

use std::time::{Duration, Instant};

use image::RgbImage;
use tracing::{info, warn};

use crate::{
  model::InferenceBackend, output::Render, pipeline::Detector, postprocess::DetectResult,
};

pub trait Task<I, B, O>: Sized {
  type Output;
  type Error;
  fn run_task(self, input: I, detector: &Detector<B>, output: O) -> Result<Self::Output, Self::Error>;
}

/// 单张图像推理一次并输出
pub struct OneShotTask;

impl<I, B, O, RE> Task<I, B, O> for OneShotTask
where
  I: Iterator<Item = RgbImage>,
  B: InferenceBackend,
  O: Render<RgbImage, DetectResult, Error = RE>,
  RE: std::error::Error + Sync + Send + 'static,
{
  type Output = DetectResult;
  type Error = anyhow::Error;

  fn run_task(self, mut input: I, detector: &Detector<B>, output: O) -> Result<DetectResult, Self::Error> {
    info!("开始任务...");
    let frame = input.next().ok_or_else(|| anyhow::anyhow!("没有输入图像"))?;
    info!("输入图像获取成功，开始推理...");
    let now = Instant::now();
    let result = detector.detect(&frame)?;
    info!("推理完成，耗时: {:.2?}", now.elapsed());
    output.render_result(&frame, &result)?;
    info!("输出完成，耗时: {:.2?}", now.elapsed());

    Ok(result)
  }
}

/// 对同一张图像重复推理，统计平均耗时
pub struct RepeatShotTask {
  repeat_times: usize,
}

impl Default for RepeatShotTask {
  fn default() -> Self {
    Self { repeat_times: 1000 }
  }
}

impl RepeatShotTask {
  pub fn with_repeat_times(mut self, repeat_times: usize) -> Self {
    self.repeat_times = repeat_times.max(1);
    self
  }
}

// 前两次推理包含预热开销，不计入平均值
const WARMUP_RUNS: usize = 2;

impl<I, B, O, RE> Task<I, B, O> for RepeatShotTask
where
  I: Iterator<Item = RgbImage>,
  B: InferenceBackend,
  O: Render<RgbImage, DetectResult, Error = RE>,
  RE: std::error::Error + Sync + Send + 'static,
{
  type Output = Duration;
  type Error = anyhow::Error;

  fn run_task(self, mut input: I, detector: &Detector<B>, output: O) -> Result<Duration, Self::Error> {
    info!("开始任务...");
    let frame = input.next().ok_or_else(|| anyhow::anyhow!("没有输入图像"))?;
    info!("输入图像获取成功，开始推理...");
    let mut times = Vec::with_capacity(self.repeat_times);
    let mut last = None;
    for i in 0..self.repeat_times {
      let now = Instant::now();
      let result = detector.detect(&frame)?;
      let elapsed = now.elapsed();
      info!("({})推理完成，耗时: {:.2?}", i, elapsed);
      times.push(elapsed);
      last = Some(result);
    }

    if let Some(result) = last {
      output.render_result(&frame, &result)?;
    }

    let measured = if times.len() > WARMUP_RUNS {
      &times[WARMUP_RUNS..]
    } else {
      &times[..]
    };
    let average = measured.iter().sum::<Duration>() / measured.len() as u32;
    warn!("平均推理时间: {:.2?}", average);

    Ok(average)
  }
}
