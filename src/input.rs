// 该文件是 Shoulin （守林人） 项目的一部分。
// src/input.rs - 图像文件输入
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

use image::{ImageReader, RgbImage};
use tracing::{debug, error};
use url::Url;

use crate::{FromUrl, FromUrlWithScheme, error::ImageLoadError};

/// 单张图像输入，image:///path/to/photo.png
#[derive(Debug)]
pub struct ImageFileInput {
  image: RgbImage,
  path: String,
}

impl FromUrlWithScheme for ImageFileInput {
  const SCHEME: &'static str = "image";
}

impl FromUrl for ImageFileInput {
  type Error = ImageLoadError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      error!(
        "URI scheme mismatch: expected '{}', found '{}'",
        Self::SCHEME,
        url.scheme()
      );
      return Err(ImageLoadError::SchemeMismatch {
        expected: Self::SCHEME,
        found: url.scheme().to_string(),
      });
    }

    let path = urlencoding::decode(url.path())
      .map_err(|err| ImageLoadError::PathError(err.to_string()))?;

    let image = ImageReader::open(path.as_ref())?
      .with_guessed_format()?
      .decode()?;
    debug!("图像解码完成: {}", path);

    Ok(ImageFileInput {
      image: image.into(),
      path: path.into_owned(),
    })
  }
}

impl ImageFileInput {
  /// 从内存字节解码，供非文件来源的调用方使用
  pub fn decode_bytes(bytes: &[u8]) -> Result<RgbImage, ImageLoadError> {
    let image = image::load_from_memory(bytes)?;
    Ok(image.into())
  }

  pub fn width(&self) -> u32 {
    self.image.width()
  }

  pub fn height(&self) -> u32 {
    self.image.height()
  }

  pub fn path(&self) -> &str {
    &self.path
  }

  pub fn into_image(self) -> RgbImage {
    self.image
  }
}
