// 该文件是 Shoulin （守林人） 项目的一部分。
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

use image::RgbImage;
use tracing::info;

use crate::{
  detection::{InferenceRequest, InferenceResult},
  detector::Detector,
  output::Render,
};

pub trait Task<O>: Sized {
  type Error;
  fn run_task(
    self,
    request: &InferenceRequest,
    detector: &Detector<'_>,
    output: &O,
  ) -> Result<InferenceResult, Self::Error>;
}

/// 单图单次推理任务
pub struct OneShotTask;

impl<RE: std::error::Error + Sync + Send + 'static, O: Render<RgbImage, InferenceResult, Error = RE>>
  Task<O> for OneShotTask
{
  type Error = anyhow::Error;

  fn run_task(
    self,
    request: &InferenceRequest,
    detector: &Detector<'_>,
    output: &O,
  ) -> Result<InferenceResult, Self::Error> {
    info!("开始任务...");
    let now = std::time::Instant::now();
    let result = detector.run(request)?;
    let elapsed = now.elapsed();
    info!("推理完成，耗时: {:.2?}", elapsed);
    output.render_result(&request.image, &result)?;
    info!("渲染完成，耗时: {:.2?}", now.elapsed());

    Ok(result)
  }
}
