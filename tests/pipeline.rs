// 该文件是 Shoulin （守林人） 项目的一部分。
// tests/pipeline.rs - 端到端推理流水线测试
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

#![cfg(feature = "model_replay")]

use std::path::Path;

use image::RgbImage;
use url::Url;

use shoulin::{
  FromUrl,
  detection::{InferenceRequest, InferenceResult},
  detector::Detector,
  error::{DetectError, ImageLoadError, ModelLoadError},
  input::ImageFileInput,
  model::load_model,
  output::{RecordJsonOutput, Render},
  task::{OneShotTask, Task},
};

fn write_artifact(path: &Path, body: &str) {
  std::fs::write(path, body).unwrap();
}

fn write_photo(path: &Path, width: u32, height: u32) {
  RgbImage::new(width, height).save(path).unwrap();
}

fn image_url(path: &Path) -> Url {
  Url::parse(&format!("image://{}", path.display())).unwrap()
}

fn replay_url(path: &Path) -> Url {
  Url::parse(&format!("replay://{}", path.display())).unwrap()
}

#[test]
fn pipeline_produces_recorded_envelope() {
  let dir = tempfile::tempdir().unwrap();

  let photo = dir.path().join("photo.png");
  write_photo(&photo, 640, 480);

  let artifact = dir.path().join("model.json");
  write_artifact(
    &artifact,
    r#"{
      "candidates": [
        {"class_index": 8, "confidence": 0.912, "x1": 150.0, "y1": 100.0, "x2": 230.0, "y2": 160.0},
        {"class_index": 7, "confidence": 0.3, "x1": 10.0, "y1": 10.0, "x2": 60.0, "y2": 60.0}
      ]
    }"#,
  );

  let input = ImageFileInput::from_url(&image_url(&photo)).unwrap();
  let model = load_model(&replay_url(&artifact)).unwrap();
  let detector = Detector::new(model.as_ref());

  let request = InferenceRequest::new(
    input.into_image(),
    image_url(&photo).to_string(),
    replay_url(&artifact).to_string(),
  );

  let record = dir.path().join("result.json");
  let output = RecordJsonOutput::to_file(&record);
  let result = OneShotTask.run_task(&request, &detector, &output).unwrap();

  // 0.3 的候选低于缺省阈值 0.5，只留下 tiger
  assert!(result.success);
  assert_eq!(result.count, 1);
  assert_eq!(result.detections[0].class_name, "tiger");
  assert_eq!(result.detections[0].confidence, 0.912);

  // 落盘记录与内存结果一致
  let recorded: InferenceResult =
    serde_json::from_str(&std::fs::read_to_string(&record).unwrap()).unwrap();
  assert_eq!(recorded, result);
  assert_eq!(recorded.count, recorded.detections.len());
}

#[test]
fn missing_model_artifact_fails_before_inference() {
  let dir = tempfile::tempdir().unwrap();
  let absent = dir.path().join("absent.json");

  let err = load_model(&replay_url(&absent)).unwrap_err();
  assert!(matches!(err, ModelLoadError::Missing(_)));
  assert_eq!(DetectError::from(err).kind(), "model_load_error");
}

#[test]
fn unknown_backend_scheme_is_reported_as_not_integrated() {
  let url = Url::parse("rknn:///opt/models/forest.rknn").unwrap();
  let err = DetectError::from(load_model(&url).unwrap_err());
  assert_eq!(err.kind(), "model_not_integrated");
}

#[test]
fn undecodable_image_fails_with_image_load_error() {
  let dir = tempfile::tempdir().unwrap();
  let empty = dir.path().join("empty.png");
  std::fs::write(&empty, b"").unwrap();

  let err = ImageFileInput::from_url(&image_url(&empty)).unwrap_err();
  assert!(matches!(err, ImageLoadError::Decode(_)));
  assert_eq!(DetectError::from(err).kind(), "image_load_error");
}

#[test]
fn out_of_bounds_candidate_is_clipped_into_image() {
  let dir = tempfile::tempdir().unwrap();

  let photo = dir.path().join("photo.png");
  write_photo(&photo, 320, 240);

  let artifact = dir.path().join("model.json");
  write_artifact(
    &artifact,
    r#"{
      "candidates": [
        {"class_index": 3, "confidence": 0.8, "x1": -15.0, "y1": 200.0, "x2": 100.0, "y2": 400.0}
      ]
    }"#,
  );

  let input = ImageFileInput::from_url(&image_url(&photo)).unwrap();
  let model = load_model(&replay_url(&artifact)).unwrap();
  let detector = Detector::new(model.as_ref());

  let detections = detector.detect(&input.into_image(), 0.5).unwrap();
  assert_eq!(detections.len(), 1);

  let bbox = &detections[0].bbox;
  assert!(bbox.x + bbox.width <= 320);
  assert!(bbox.y + bbox.height <= 240);
}

#[test]
fn same_request_twice_yields_identical_results() {
  let dir = tempfile::tempdir().unwrap();

  let photo = dir.path().join("photo.png");
  write_photo(&photo, 640, 480);

  let artifact = dir.path().join("model.json");
  write_artifact(
    &artifact,
    r#"{
      "candidates": [
        {"class_index": 0, "confidence": 0.7, "x1": 10.0, "y1": 10.0, "x2": 90.0, "y2": 120.0},
        {"class_index": 9, "confidence": 0.95, "x1": 300.0, "y1": 200.0, "x2": 500.0, "y2": 400.0}
      ]
    }"#,
  );

  let input = ImageFileInput::from_url(&image_url(&photo)).unwrap();
  let model = load_model(&replay_url(&artifact)).unwrap();
  let detector = Detector::new(model.as_ref());

  let request = InferenceRequest::new(
    input.into_image(),
    image_url(&photo).to_string(),
    replay_url(&artifact).to_string(),
  )
  .with_confidence_threshold(0.6);

  let first = detector.run(&request).unwrap();
  let second = detector.run(&request).unwrap();
  assert_eq!(first, second);

  for det in &first.detections {
    assert!(det.confidence >= request.confidence_threshold);
  }
}

/// 输出端失败不应被折叠成成功结果
#[test]
fn render_failure_propagates() {
  struct FailingSink;

  impl Render<RgbImage, InferenceResult> for FailingSink {
    type Error = std::io::Error;

    fn render_result(
      &self,
      _frame: &RgbImage,
      _result: &InferenceResult,
    ) -> Result<(), Self::Error> {
      Err(std::io::Error::other("磁盘已满"))
    }
  }

  let dir = tempfile::tempdir().unwrap();
  let artifact = dir.path().join("model.json");
  write_artifact(&artifact, r#"{"candidates": []}"#);

  let model = load_model(&replay_url(&artifact)).unwrap();
  let detector = Detector::new(model.as_ref());
  let request = InferenceRequest::new(
    RgbImage::new(32, 32),
    "image:///photo.png",
    replay_url(&artifact).to_string(),
  );

  assert!(
    OneShotTask
      .run_task(&request, &detector, &FailingSink)
      .is_err()
  );
}
