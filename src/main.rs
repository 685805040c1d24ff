// 该文件是 Shoulin （守林人） 项目的一部分。
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

use anyhow::Result;
use clap::Parser;
use tracing::info;
use url::Url;

use shoulin::{
  FromUrl,
  detection::{DEFAULT_CONFIDENCE_THRESHOLD, FailureReport, InferenceRequest},
  detector::Detector,
  error::DetectError,
  input::ImageFileInput,
  model::load_model,
  output::RecordJsonOutput,
  task::{OneShotTask, Task},
};

/// Shoulin 项目参数配置
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
  /// 模型引用（如 replay:///path/to/model.json）
  #[arg(long, value_name = "MODEL")]
  pub model: Url,

  /// 输入图像（如 image:///path/to/photo.jpg）
  #[arg(long, value_name = "SOURCE")]
  pub input: Url,

  /// 结果输出（json:///path/to/result.json，json:- 表示标准输出，
  /// file:///path/to/out.png 保存标注图像）
  #[arg(long, default_value = "json:-", value_name = "OUTPUT")]
  pub output: Url,

  /// 置信度阈值 (0.0 - 1.0)
  #[arg(long, default_value_t = DEFAULT_CONFIDENCE_THRESHOLD, value_name = "THRESHOLD")]
  pub confidence: f32,

  /// NMS IOU 阈值 (0.0 - 1.0)，缺省关闭 NMS
  #[arg(long, value_name = "THRESHOLD")]
  pub nms_threshold: Option<f32>,
}

fn main() -> Result<()> {
  tracing_subscriber::fmt::init();

  let args = Args::parse();

  info!("模型引用: {}", args.model);
  info!("输入来源: {}", args.input);
  info!("输出路径: {}", args.output);
  info!("置信度阈值: {}", args.confidence);

  match run(&args) {
    Ok(()) => Ok(()),
    Err(err) => match err.downcast_ref::<DetectError>() {
      // 预期失败：输出结构化失败对象后以非零码退出，不崩溃
      Some(detect_err) => {
        let report = FailureReport::from(detect_err);
        println!("{}", serde_json::to_string_pretty(&report)?);
        std::process::exit(1);
      }
      None => Err(err),
    },
  }
}

fn run(args: &Args) -> Result<()> {
  let input = ImageFileInput::from_url(&args.input).map_err(DetectError::from)?;
  info!("输入图像: {}x{}", input.width(), input.height());

  let model = load_model(&args.model).map_err(DetectError::from)?;

  let mut detector = Detector::new(model.as_ref());
  if let Some(iou_threshold) = args.nms_threshold {
    detector = detector.with_nms(iou_threshold);
  }

  let request = InferenceRequest::new(
    input.into_image(),
    args.input.to_string(),
    args.model.to_string(),
  )
  .with_confidence_threshold(args.confidence);

  let result = match args.output.scheme() {
    #[cfg(feature = "save_image_file")]
    "file" => {
      let output = shoulin::output::SaveImageFileOutput::from_url(&args.output)?;
      OneShotTask.run_task(&request, &detector, &output)?
    }
    "json" => {
      let output = RecordJsonOutput::from_url(&args.output)?;
      OneShotTask.run_task(&request, &detector, &output)?
    }
    other => anyhow::bail!("不支持的输出方案: {}", other),
  };

  info!("检测完成: {} 个对象", result.count);

  Ok(())
}
