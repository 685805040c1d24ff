// 该文件是 Shoulin （守林人） 项目的一部分。
// src/detector.rs - 检测器核心
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

//! 检测器核心：对单张图像执行一次同步推理。
//! 流程为 校验阈值 → 校验图像尺寸 → 前向推理 → 阈值过滤 →
//! 标签映射 → 边界裁剪 → （可选）非极大值抑制 → 组装结果信封。
//! 检测器自身在调用之间无状态，模型句柄由外部加载并传入。

use image::RgbImage;
use tracing::{debug, info};

use crate::{
  detection::{BoundingBox, Detection, InferenceRequest, InferenceResult, round_confidence},
  error::{DetectError, ImageLoadError, InferenceError},
  model::{Model, RawCandidate},
};

pub struct Detector<'m> {
  model: &'m dyn Model,
  nms_threshold: Option<f32>,
}

impl<'m> Detector<'m> {
  pub fn new(model: &'m dyn Model) -> Self {
    Detector {
      model,
      nms_threshold: None,
    }
  }

  /// 启用非极大值抑制后处理。
  /// 模型协作方未去重时的可选扩展，缺省关闭。
  pub fn with_nms(mut self, iou_threshold: f32) -> Self {
    self.nms_threshold = Some(iou_threshold);
    self
  }

  /// 对一次请求执行完整推理并组装结果信封
  pub fn run(&self, request: &InferenceRequest) -> Result<InferenceResult, DetectError> {
    let detections = self.detect(&request.image, request.confidence_threshold)?;
    Ok(InferenceResult::new(
      detections,
      request.image_ref.clone(),
      request.model_ref.clone(),
      request.confidence_threshold,
    ))
  }

  /// 推理并做阈值过滤、标签映射与边界裁剪。
  /// 检测顺序与模型输出顺序一致（NMS 开启时按置信度降序）。
  pub fn detect(
    &self,
    image: &RgbImage,
    confidence_threshold: f32,
  ) -> Result<Vec<Detection>, DetectError> {
    if !(0.0..=1.0).contains(&confidence_threshold) {
      return Err(DetectError::InvalidThreshold(confidence_threshold));
    }

    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
      return Err(ImageLoadError::EmptyImage { width, height }.into());
    }

    debug!("执行模型推理");
    let candidates = self.model.infer(image)?;
    debug!("原始候选框数量: {}", candidates.len());

    let mut detections = Vec::new();
    for candidate in candidates.iter() {
      let RawCandidate {
        class_index,
        confidence,
        x1,
        y1,
        x2,
        y2,
      } = *candidate;

      if !confidence.is_finite()
        || !(0.0..=1.0).contains(&confidence)
        || !x1.is_finite()
        || !y1.is_finite()
        || !x2.is_finite()
        || !y2.is_finite()
      {
        return Err(
          InferenceError::InvalidCandidate {
            confidence,
            x1,
            y1,
            x2,
            y2,
          }
          .into(),
        );
      }

      // 先取整到输出精度再比较阈值，保证结果中的置信度不低于阈值
      let confidence = round_confidence(confidence);
      if confidence < confidence_threshold {
        continue;
      }

      let Some(bbox) = BoundingBox::clipped(x1, y1, x2, y2, width, height) else {
        debug!("候选框裁剪后面积为零，丢弃: ({}, {}, {}, {})", x1, y1, x2, y2);
        continue;
      };

      detections.push(Detection {
        class_name: self.model.labels().name_or_unknown(class_index).to_string(),
        confidence,
        bbox,
      });
    }

    if let Some(iou_threshold) = self.nms_threshold {
      detections = nms(detections, iou_threshold);
    }

    info!("检测到 {} 个物体", detections.len());
    Ok(detections)
  }
}

/// 非极大值抑制：同类候选框按置信度降序保留，剔除重叠度过高的框
fn nms(mut detections: Vec<Detection>, iou_threshold: f32) -> Vec<Detection> {
  detections.sort_by(|a, b| {
    b.confidence
      .partial_cmp(&a.confidence)
      .unwrap_or(std::cmp::Ordering::Equal)
  });

  let mut kept = Vec::new();
  while !detections.is_empty() {
    let best = detections.remove(0);
    detections
      .retain(|det| det.class_name != best.class_name || iou(&best.bbox, &det.bbox) < iou_threshold);
    kept.push(best);
  }

  kept
}

/// 计算两个边界框的 IoU
fn iou(a: &BoundingBox, b: &BoundingBox) -> f32 {
  let x1 = a.x.max(b.x) as f32;
  let y1 = a.y.max(b.y) as f32;
  let x2 = a.right().min(b.right()) as f32;
  let y2 = a.bottom().min(b.bottom()) as f32;

  let intersection = (x2 - x1).max(0.0) * (y2 - y1).max(0.0);
  let area_a = a.width as f32 * a.height as f32;
  let area_b = b.width as f32 * b.height as f32;
  let union = area_a + area_b - intersection;

  if union > 0.0 { intersection / union } else { 0.0 }
}
