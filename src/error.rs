// 该文件是 Shoulin （守林人） 项目的一部分。
// src/error.rs - 错误分类
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

use thiserror::Error;

use crate::detection::FailureReport;

/// 图像引用无效或无法解码
#[derive(Error, Debug)]
pub enum ImageLoadError {
  #[error("URI 方案不匹配: 期望 '{expected}', 实际 '{found}'")]
  SchemeMismatch {
    expected: &'static str,
    found: String,
  },
  #[error("图像路径错误: {0}")]
  PathError(String),
  #[error("I/O 错误: {0}")]
  Io(#[from] std::io::Error),
  #[error("图像解码错误: {0}")]
  Decode(#[from] image::ImageError),
  #[error("图像尺寸无效: {width}x{height}")]
  EmptyImage { width: u32, height: u32 },
}

/// 模型工件缺失、损坏或后端未集成
#[derive(Error, Debug)]
pub enum ModelLoadError {
  #[error("模型文件不存在: {0}")]
  Missing(PathBuf),
  #[error("模型路径错误: {0}")]
  PathError(String),
  #[error("读取模型文件失败: {0}")]
  Io(#[from] std::io::Error),
  #[error("模型文件损坏或不兼容: {0}")]
  Corrupt(String),
  #[error("未集成的模型后端: '{0}'")]
  NotIntegrated(String),
}

/// 前向推理或结果后处理阶段的失败
#[derive(Error, Debug)]
pub enum InferenceError {
  #[error("模型输出形状异常: {0}")]
  MalformedOutput(String),
  #[error("候选框数值无效: 置信度 {confidence}, 坐标 ({x1}, {y1}, {x2}, {y2})")]
  InvalidCandidate {
    confidence: f32,
    x1: f32,
    y1: f32,
    x2: f32,
    y2: f32,
  },
  #[error("后端推理失败: {0}")]
  Backend(String),
}

/// 检测器统一错误。
/// 每个变体对应一个稳定的 kind 字符串，调用方以 kind 区分错误种类，
/// 而不是把所有失败折叠成一个空结果。
#[derive(Error, Debug)]
pub enum DetectError {
  #[error("图像加载错误: {0}")]
  ImageLoad(#[from] ImageLoadError),
  #[error("模型加载错误: {0}")]
  ModelLoad(#[from] ModelLoadError),
  #[error("推理错误: {0}")]
  Inference(#[from] InferenceError),
  #[error("置信度阈值越界: {0} (有效范围 0.0 - 1.0)")]
  InvalidThreshold(f32),
}

impl DetectError {
  /// 机器可读的错误种类
  pub fn kind(&self) -> &'static str {
    match self {
      DetectError::ImageLoad(_) => "image_load_error",
      DetectError::ModelLoad(ModelLoadError::NotIntegrated(_)) => "model_not_integrated",
      DetectError::ModelLoad(_) => "model_load_error",
      DetectError::Inference(_) => "inference_error",
      DetectError::InvalidThreshold(_) => "invalid_threshold",
    }
  }
}

impl From<&DetectError> for FailureReport {
  fn from(err: &DetectError) -> Self {
    FailureReport {
      success: false,
      error: err.kind().to_string(),
      message: err.to_string(),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn kinds_are_distinguishable() {
    let image_err = DetectError::from(ImageLoadError::EmptyImage {
      width: 0,
      height: 0,
    });
    let model_err = DetectError::from(ModelLoadError::Missing(PathBuf::from("/tmp/missing")));
    let not_integrated = DetectError::from(ModelLoadError::NotIntegrated("rknn".to_string()));
    let infer_err = DetectError::from(InferenceError::MalformedOutput("空输出".to_string()));

    assert_eq!(image_err.kind(), "image_load_error");
    assert_eq!(model_err.kind(), "model_load_error");
    assert_eq!(not_integrated.kind(), "model_not_integrated");
    assert_eq!(infer_err.kind(), "inference_error");
    assert_eq!(DetectError::InvalidThreshold(1.5).kind(), "invalid_threshold");
  }

  #[test]
  fn failure_report_carries_kind_and_message() {
    let err = DetectError::from(ModelLoadError::NotIntegrated("onnx".to_string()));
    let report = FailureReport::from(&err);
    assert!(!report.success);
    assert_eq!(report.error, "model_not_integrated");
    assert!(report.message.contains("onnx"));
  }
}
