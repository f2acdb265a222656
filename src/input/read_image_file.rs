// 该文件是 ShelfGuard（货架守卫）项目的一部分。
// src/input/read_image_file.rs - 图像文件输入
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

use image::ImageReader;
use thiserror::Error;
use tracing::error;
use url::Url;

use crate::{FromUrl, FromUrlWithScheme, decoded_path, frame::ShelfFrame};

#[derive(Error, Debug)]
pub enum ImageFileInputError {
  #[error("URI schema mismatch")]
  SchemaMismatch,
  #[error("I/O error: {0}")]
  IoError(#[from] std::io::Error),
  #[error("Image loading error: {0}")]
  ImageLoadError(#[from] image::ImageError),
}

/// 单张图像文件，只产出一帧
pub struct ImageFileInput {
  frame: Option<ShelfFrame>,
}

impl FromUrlWithScheme for ImageFileInput {
  const SCHEME: &'static str = "image";
}

impl FromUrl for ImageFileInput {
  type Error = ImageFileInputError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      error!(
        "URI scheme mismatch: expected '{}', found '{}'",
        Self::SCHEME,
        url.scheme()
      );
      return Err(ImageFileInputError::SchemaMismatch);
    }

    let path = decoded_path(url);
    let frame = load_frame(&path)?;

    Ok(ImageFileInput { frame: Some(frame) })
  }
}

impl Iterator for ImageFileInput {
  type Item = ShelfFrame;

  fn next(&mut self) -> Option<Self::Item> {
    self.frame.take()
  }
}

pub(crate) fn load_frame(path: &std::path::Path) -> Result<ShelfFrame, ImageFileInputError> {
  let image = ImageReader::open(path)?.decode()?;
  Ok(ShelfFrame::from_path(path).with_image(image.into_rgb8()))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn loads_single_frame() {
    let file = tempfile::Builder::new().suffix(".png").tempfile().unwrap();
    let path = file.path().to_path_buf();
    image::RgbImage::new(8, 6).save(&path).unwrap();

    let url = Url::parse(&format!("image://{}", path.display())).unwrap();

    let mut input = ImageFileInput::from_url(&url).unwrap();
    let frame = input.next().unwrap();
    assert_eq!(frame.width(), Some(8));
    assert!(input.next().is_none());
  }

  #[test]
  fn missing_file_is_io_error() {
    let url = Url::parse("image:///nonexistent/shelfguard/none.jpg").unwrap();
    assert!(matches!(
      ImageFileInput::from_url(&url),
      Err(ImageFileInputError::IoError(_))
    ));
  }
}
