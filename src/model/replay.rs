// 该文件是 Shoulin （守林人） 项目的一部分。
// src/model/replay.rs - 回放模型后端
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

//! 回放模型：从 JSON 工件加载预录制的候选框序列，推理时逐次原样回放。
//! 用于流水线联调、结果格式验证与测试，输出对固定输入完全确定。

use std::path::{Path, PathBuf};

use image::RgbImage;
use serde::Deserialize;
use tracing::{debug, info};
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme,
  error::{InferenceError, ModelLoadError},
  label::LabelTable,
  model::{Model, RawCandidate},
};

/// 回放工件格式：可选标签表加候选框序列
#[derive(Debug, Deserialize)]
struct ReplayArtifact {
  #[serde(default)]
  labels: Option<Vec<String>>,
  candidates: Vec<RawCandidate>,
}

#[derive(Debug)]
pub struct ReplayModel {
  labels: LabelTable,
  candidates: Box<[RawCandidate]>,
}

impl FromUrlWithScheme for ReplayModel {
  const SCHEME: &'static str = "replay";
}

impl FromUrl for ReplayModel {
  type Error = ModelLoadError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      return Err(ModelLoadError::PathError(format!(
        "模型路径必须使用 {} 方案",
        Self::SCHEME
      )));
    }

    let path = urlencoding::decode(url.path())
      .map_err(|err| ModelLoadError::PathError(err.to_string()))?;
    Self::from_path(Path::new(path.as_ref()))
  }
}

impl ReplayModel {
  pub fn from_path(path: &Path) -> Result<Self, ModelLoadError> {
    info!("加载回放模型工件: {}", path.display());
    if !path.exists() {
      return Err(ModelLoadError::Missing(PathBuf::from(path)));
    }

    let data = std::fs::read(path)?;
    debug!("模型工件大小: {} 字节", data.len());

    let artifact: ReplayArtifact =
      serde_json::from_slice(&data).map_err(|err| ModelLoadError::Corrupt(err.to_string()))?;

    let labels = match artifact.labels {
      Some(names) => LabelTable::from_names(names),
      None => LabelTable::forest(),
    };

    info!(
      "模型加载完成: {} 个候选框, {} 个标签",
      artifact.candidates.len(),
      labels.len()
    );

    Ok(ReplayModel {
      labels,
      candidates: artifact.candidates.into_boxed_slice(),
    })
  }

  /// 直接由候选框构造，测试与嵌入场景使用
  pub fn from_candidates(labels: LabelTable, candidates: Vec<RawCandidate>) -> Self {
    ReplayModel {
      labels,
      candidates: candidates.into_boxed_slice(),
    }
  }
}

impl Model for ReplayModel {
  fn labels(&self) -> &LabelTable {
    &self.labels
  }

  fn infer(&self, _image: &RgbImage) -> Result<Box<[RawCandidate]>, InferenceError> {
    debug!("回放 {} 个候选框", self.candidates.len());
    Ok(self.candidates.clone())
  }
}
