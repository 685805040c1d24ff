// 该文件是 Shoulin （守林人） 项目的一部分。
// src/label.rs - 标签表
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

use std::path::Path;

/// 守林场景的内置标签集
pub const FOREST_LABELS: [&str; 10] = [
  "person", "animal", "vehicle", "fire", "firearm", "tree", "bird", "deer", "tiger", "elephant",
];

/// 超出标签表范围的类别索引统一映射为该名称
pub const UNKNOWN_LABEL: &str = "unknown";

/// 模型的固定标签表：类别索引到类别名称的映射
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelTable {
  names: Vec<String>,
}

impl Default for LabelTable {
  fn default() -> Self {
    Self::forest()
  }
}

impl LabelTable {
  pub fn forest() -> Self {
    Self::from_names(FOREST_LABELS.iter().map(|name| name.to_string()))
  }

  pub fn from_names<I>(names: I) -> Self
  where
    I: IntoIterator<Item = String>,
  {
    LabelTable {
      names: names.into_iter().collect(),
    }
  }

  /// 从标签文件加载：每行一个标签，忽略空行与 '#' 注释行
  pub fn from_file(path: &Path) -> Result<Self, std::io::Error> {
    let content = std::fs::read_to_string(path)?;
    let names = content
      .lines()
      .map(str::trim)
      .filter(|line| !line.is_empty() && !line.starts_with('#'))
      .map(str::to_string)
      .collect();
    Ok(LabelTable { names })
  }

  pub fn len(&self) -> usize {
    self.names.len()
  }

  pub fn is_empty(&self) -> bool {
    self.names.is_empty()
  }

  pub fn name(&self, index: u32) -> Option<&str> {
    self.names.get(index as usize).map(String::as_str)
  }

  pub fn name_or_unknown(&self, index: u32) -> &str {
    self.name(index).unwrap_or(UNKNOWN_LABEL)
  }
}
