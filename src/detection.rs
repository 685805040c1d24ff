// 该文件是 Shoulin （守林人） 项目的一部分。
// src/detection.rs - 检测结果数据模型
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

/// 缺省置信度阈值
pub const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 0.5;

/// 置信度输出精度：保留三位小数。
/// 阈值比较发生在取整之后，落盘的置信度必然不低于阈值。
pub fn round_confidence(value: f32) -> f32 {
  (value * 1000.0).round() / 1000.0
}

/// 像素坐标下的轴对齐边界框。
/// 满足 x + width <= 图像宽度，y + height <= 图像高度。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
  pub x: u32,
  pub y: u32,
  pub width: u32,
  pub height: u32,
}

impl BoundingBox {
  /// 将 (x1, y1, x2, y2) 浮点候选框裁剪到图像范围内。
  /// 裁剪后面积为零时返回 None。
  pub fn clipped(
    x1: f32,
    y1: f32,
    x2: f32,
    y2: f32,
    image_width: u32,
    image_height: u32,
  ) -> Option<Self> {
    let w = image_width as f32;
    let h = image_height as f32;

    let x_min = x1.clamp(0.0, w).floor() as u32;
    let y_min = y1.clamp(0.0, h).floor() as u32;
    let x_max = (x2.clamp(0.0, w).ceil() as u32).min(image_width);
    let y_max = (y2.clamp(0.0, h).ceil() as u32).min(image_height);

    if x_max <= x_min || y_max <= y_min {
      return None;
    }

    Some(BoundingBox {
      x: x_min,
      y: y_min,
      width: x_max - x_min,
      height: y_max - y_min,
    })
  }

  pub fn right(&self) -> u32 {
    self.x + self.width
  }

  pub fn bottom(&self) -> u32 {
    self.y + self.height
  }
}

/// 单个识别出的物体实例
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
  /// 类别名称，取自模型的固定标签表
  #[serde(rename = "class")]
  pub class_name: String,
  /// 置信度 [0, 1]，不低于请求的阈值
  pub confidence: f32,
  /// 边界框（像素坐标）
  pub bbox: BoundingBox,
}

/// 单次推理请求：图像、引用回显与置信度阈值
#[derive(Debug, Clone)]
pub struct InferenceRequest {
  pub image: RgbImage,
  pub image_ref: String,
  pub model_ref: String,
  pub confidence_threshold: f32,
}

impl InferenceRequest {
  pub fn new(image: RgbImage, image_ref: impl Into<String>, model_ref: impl Into<String>) -> Self {
    InferenceRequest {
      image,
      image_ref: image_ref.into(),
      model_ref: model_ref.into(),
      confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
    }
  }

  pub fn with_confidence_threshold(mut self, threshold: f32) -> Self {
    self.confidence_threshold = threshold;
    self
  }
}

/// 推理结果信封。
/// success 仅在操作无法执行时为 false（见 error 模块），
/// 零检测仍然是一次成功的推理。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InferenceResult {
  pub success: bool,
  pub detections: Vec<Detection>,
  pub count: usize,
  pub image_path: String,
  pub model_path: String,
  pub confidence_threshold: f32,
}

impl InferenceResult {
  /// 构造成功结果，count 恒等于检测数
  pub fn new(
    detections: Vec<Detection>,
    image_path: impl Into<String>,
    model_path: impl Into<String>,
    confidence_threshold: f32,
  ) -> Self {
    let count = detections.len();
    InferenceResult {
      success: true,
      detections,
      count,
      image_path: image_path.into(),
      model_path: model_path.into(),
      confidence_threshold,
    }
  }

  pub fn is_empty(&self) -> bool {
    self.detections.is_empty()
  }
}

/// 结构化失败对象：稳定的错误种类加可读消息。
/// 零检测与无法执行是两种不同的结果，后者永远不以空列表表示。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailureReport {
  pub success: bool,
  pub error: String,
  pub message: String,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn clipped_keeps_box_inside_image() {
    let bbox = BoundingBox::clipped(-10.0, -5.0, 650.0, 480.0, 640, 480).unwrap();
    assert_eq!(bbox.x, 0);
    assert_eq!(bbox.y, 0);
    assert_eq!(bbox.right(), 640);
    assert_eq!(bbox.bottom(), 480);
  }

  #[test]
  fn clipped_rejects_zero_area() {
    assert!(BoundingBox::clipped(700.0, 10.0, 720.0, 20.0, 640, 480).is_none());
    assert!(BoundingBox::clipped(50.0, 50.0, 50.0, 50.0, 640, 480).is_none());
    assert!(BoundingBox::clipped(80.0, 60.0, 20.0, 10.0, 640, 480).is_none());
  }

  #[test]
  fn clipped_preserves_interior_box() {
    let bbox = BoundingBox::clipped(150.0, 100.0, 230.0, 160.0, 640, 480).unwrap();
    assert_eq!(
      bbox,
      BoundingBox {
        x: 150,
        y: 100,
        width: 80,
        height: 60
      }
    );
  }

  #[test]
  fn round_confidence_keeps_three_decimals() {
    assert_eq!(round_confidence(0.123_456), 0.123);
    assert_eq!(round_confidence(0.899_9), 0.9);
    assert_eq!(round_confidence(1.0), 1.0);
  }

  #[test]
  fn result_count_matches_detections() {
    let detections = vec![Detection {
      class_name: "tiger".to_string(),
      confidence: 0.9,
      bbox: BoundingBox {
        x: 1,
        y: 2,
        width: 3,
        height: 4,
      },
    }];
    let result = InferenceResult::new(detections, "image:///a.png", "replay:///m.json", 0.5);
    assert!(result.success);
    assert_eq!(result.count, result.detections.len());
  }

  #[test]
  fn result_serializes_with_original_field_names() {
    let result = InferenceResult::new(
      vec![Detection {
        class_name: "deer".to_string(),
        confidence: 0.75,
        bbox: BoundingBox {
          x: 10,
          y: 20,
          width: 30,
          height: 40,
        },
      }],
      "image:///a.png",
      "replay:///m.json",
      0.5,
    );

    let json: serde_json::Value = serde_json::to_value(&result).unwrap();
    assert_eq!(json["success"], true);
    assert_eq!(json["count"], 1);
    assert_eq!(json["detections"][0]["class"], "deer");
    assert_eq!(json["detections"][0]["bbox"]["width"], 30);
    assert_eq!(json["image_path"], "image:///a.png");
    assert_eq!(json["model_path"], "replay:///m.json");
    assert_eq!(json["confidence_threshold"], 0.5);
  }
}
