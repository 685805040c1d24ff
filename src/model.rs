// 该文件是 Shoulin （守林人） 项目的一部分。
// src/model.rs - 模型协作方定义
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
use serde::{Deserialize, Serialize};
use url::Url;

use crate::{
  error::{InferenceError, ModelLoadError},
  label::LabelTable,
};

/// 前向推理输出的原始候选框：未过滤、未映射标签、未裁剪。
/// 坐标为像素坐标下的 (x1, y1, x2, y2)。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawCandidate {
  pub class_index: u32,
  pub confidence: f32,
  pub x1: f32,
  pub y1: f32,
  pub x2: f32,
  pub y2: f32,
}

/// 已加载的模型句柄。
/// 推理为只读操作，句柄可在并发调用间共享。
pub trait Model: std::fmt::Debug {
  /// 模型的固定标签表
  fn labels(&self) -> &LabelTable;

  /// 前向推理，返回模型输出顺序的原始候选框序列
  fn infer(&self, image: &RgbImage) -> Result<Box<[RawCandidate]>, InferenceError>;
}

#[cfg(feature = "model_replay")]
mod replay;
#[cfg(feature = "model_replay")]
pub use self::replay::ReplayModel;

/// 按 URL 方案解析并加载模型工件。
/// 未编译进本 crate 的后端方案以 NotIntegrated 显式失败，
/// 绝不退化成一个永远返回空列表的假模型。
pub fn load_model(url: &Url) -> Result<Box<dyn Model>, ModelLoadError> {
  #[cfg(feature = "model_replay")]
  if url.scheme() == <ReplayModel as crate::FromUrlWithScheme>::SCHEME {
    use crate::FromUrl;
    return Ok(Box::new(ReplayModel::from_url(url)?));
  }

  Err(ModelLoadError::NotIntegrated(url.scheme().to_string()))
}
