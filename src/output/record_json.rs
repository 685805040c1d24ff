// 该文件是 Shoulin （守林人） 项目的一部分。
// src/output/record_json.rs - JSON 结果记录输出
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

use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Utc;
use image::RgbImage;
use serde::Serialize;
use thiserror::Error;
use tracing::info;
use url::Url;

use crate::{FromUrl, FromUrlWithScheme, detection::InferenceResult, output::Render};

#[derive(Error, Debug)]
pub enum RecordJsonOutputError {
  #[error("URI 方案不匹配: {0}")]
  SchemeMismatch(String),
  #[error("输出路径错误: {0}")]
  PathError(String),
  #[error("序列化错误: {0}")]
  Serialize(#[from] serde_json::Error),
  #[error("I/O 错误: {0}")]
  Io(#[from] std::io::Error),
}

/// 带记录时间的结果信封
#[derive(Debug, Serialize)]
struct TimedRecord<'a> {
  timestamp: String,
  #[serde(flatten)]
  result: &'a InferenceResult,
}

/// JSON 记录输出：json:///path/to/result.json，
/// 路径为 - 时写到标准输出。
/// 查询参数 timestamp 在信封旁附加 RFC 3339 记录时间。
pub struct RecordJsonOutput {
  path: Option<PathBuf>,
  with_timestamp: bool,
}

impl FromUrlWithScheme for RecordJsonOutput {
  const SCHEME: &'static str = "json";
}

impl FromUrl for RecordJsonOutput {
  type Error = RecordJsonOutputError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      return Err(RecordJsonOutputError::SchemeMismatch(format!(
        "期望输出方案 '{}', 实际 '{}'",
        Self::SCHEME,
        url.scheme()
      )));
    }

    let path = urlencoding::decode(url.path())
      .map_err(|err| RecordJsonOutputError::PathError(err.to_string()))?;
    let path = if path.as_ref() == "-" {
      None
    } else {
      Some(PathBuf::from(path.as_ref()))
    };

    let with_timestamp = url.query_pairs().any(|(key, _)| key == "timestamp");

    Ok(RecordJsonOutput {
      path,
      with_timestamp,
    })
  }
}

impl RecordJsonOutput {
  pub fn to_stdout() -> Self {
    RecordJsonOutput {
      path: None,
      with_timestamp: false,
    }
  }

  pub fn to_file(path: impl Into<PathBuf>) -> Self {
    RecordJsonOutput {
      path: Some(path.into()),
      with_timestamp: false,
    }
  }

  fn encode(&self, result: &InferenceResult) -> Result<String, RecordJsonOutputError> {
    let encoded = if self.with_timestamp {
      serde_json::to_string_pretty(&TimedRecord {
        timestamp: Utc::now().to_rfc3339(),
        result,
      })?
    } else {
      serde_json::to_string_pretty(result)?
    };
    Ok(encoded)
  }

  fn write_record(&self, encoded: &str) -> Result<(), RecordJsonOutputError> {
    match &self.path {
      Some(path) => {
        if let Some(parent) = Path::new(path).parent()
          && !parent.as_os_str().is_empty()
        {
          std::fs::create_dir_all(parent)?;
        }
        let mut file = std::fs::File::create(path)?;
        file.write_all(encoded.as_bytes())?;
        file.write_all(b"\n")?;
        info!("结果已记录: {}", path.display());
      }
      None => {
        let stdout = std::io::stdout();
        let mut lock = stdout.lock();
        lock.write_all(encoded.as_bytes())?;
        lock.write_all(b"\n")?;
      }
    }
    Ok(())
  }
}

impl Render<RgbImage, InferenceResult> for RecordJsonOutput {
  type Error = RecordJsonOutputError;

  fn render_result(&self, _frame: &RgbImage, result: &InferenceResult) -> Result<(), Self::Error> {
    let encoded = self.encode(result)?;
    self.write_record(&encoded)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::detection::{BoundingBox, Detection};

  fn sample_result() -> InferenceResult {
    InferenceResult::new(
      vec![Detection {
        class_name: "fire".to_string(),
        confidence: 0.875,
        bbox: BoundingBox {
          x: 5,
          y: 6,
          width: 7,
          height: 8,
        },
      }],
      "image:///a.png",
      "replay:///m.json",
      0.5,
    )
  }

  #[test]
  fn record_is_written_to_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("result.json");
    let output = RecordJsonOutput::to_file(&path);

    let frame = RgbImage::new(16, 16);
    output.render_result(&frame, &sample_result()).unwrap();

    let content = std::fs::read_to_string(&path).unwrap();
    let parsed: InferenceResult = serde_json::from_str(&content).unwrap();
    assert_eq!(parsed, sample_result());
  }

  #[test]
  fn timestamp_query_adds_record_time() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("result.json");
    let url = Url::parse(&format!("json://{}?timestamp", path.display())).unwrap();
    let output = RecordJsonOutput::from_url(&url).unwrap();

    let frame = RgbImage::new(16, 16);
    output.render_result(&frame, &sample_result()).unwrap();

    let content = std::fs::read_to_string(&path).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&content).unwrap();
    assert!(parsed["timestamp"].is_string());
    assert_eq!(parsed["count"], 1);
  }

  #[test]
  fn dash_path_means_stdout() {
    let url = Url::parse("json:-").unwrap();
    let output = RecordJsonOutput::from_url(&url).unwrap();
    assert!(output.path.is_none());
  }

  #[test]
  fn wrong_scheme_is_rejected() {
    let url = Url::parse("file:///tmp/out.json").unwrap();
    assert!(matches!(
      RecordJsonOutput::from_url(&url),
      Err(RecordJsonOutputError::SchemeMismatch(_))
    ));
  }
}
