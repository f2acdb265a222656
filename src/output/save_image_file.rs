// 该文件是 ShelfGuard（货架守卫）项目的一部分。
// src/output/save_image_file.rs - 保存标注图像文件
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
use tracing::{info, warn};
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme,
  classify::ShelfAnalysis,
  decoded_path,
  frame::ShelfFrame,
  output::{
    Render,
    draw::{Draw, FontError},
    font_from_query,
  },
};

pub struct SaveImageFileOutput {
  path: PathBuf,
  draw: Draw,
}

#[derive(Error, Debug)]
pub enum SaveImageFileError {
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("图像错误: {0}")]
  ImageError(#[from] image::ImageError),
  #[error("字体错误: {0}")]
  FontError(#[from] FontError),
  #[error("URI 方案不匹配: {0}")]
  SchemeMismatch(String),
}

impl FromUrlWithScheme for SaveImageFileOutput {
  const SCHEME: &'static str = "image";
}

impl FromUrl for SaveImageFileOutput {
  type Error = SaveImageFileError;

  fn from_url(uri: &Url) -> Result<Self, Self::Error> {
    if uri.scheme() != Self::SCHEME {
      return Err(SaveImageFileError::SchemeMismatch(format!(
        "期望保存方式 '{}', 实际保存方式 '{}'",
        Self::SCHEME,
        uri.scheme()
      )));
    }

    Ok(SaveImageFileOutput {
      path: decoded_path(uri),
      draw: font_from_query(uri)?,
    })
  }
}

impl SaveImageFileOutput {
  pub fn new(path: PathBuf, draw: Draw) -> Self {
    Self { path, draw }
  }

  fn save_image(&self, image: image::RgbImage) -> Result<(), SaveImageFileError> {
    if let Some(parent) = self.path.parent()
      && !parent.as_os_str().is_empty()
    {
      std::fs::create_dir_all(parent)?;
    }

    image.save(&self.path)?;
    info!("保存标注图像到文件: {}", self.path.display());

    Ok(())
  }
}

impl Render<ShelfFrame, ShelfAnalysis> for SaveImageFileOutput {
  type Error = SaveImageFileError;

  fn render_result(&self, frame: &ShelfFrame, result: &ShelfAnalysis) -> Result<(), Self::Error> {
    let Some(source) = frame.image() else {
      warn!("{} 未解码，跳过保存标注图像", frame.name());
      return Ok(());
    };

    let mut image = source.clone();
    self.draw.draw_analysis(&mut image, result);
    self.save_image(image)
  }
}
