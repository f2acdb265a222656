// 该文件是 ShelfGuard（货架守卫）项目的一部分。
// src/frame.rs - 货架图像帧定义
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

use std::path::{Path, PathBuf};

use image::RgbImage;

/// 一张待分析的货架图像
#[derive(Debug, Clone)]
pub struct ShelfFrame {
  name: String,
  path: PathBuf,
  image: Option<RgbImage>,
}

impl ShelfFrame {
  /// 仅有路径、未解码的帧；检测器只依赖路径时使用
  pub fn from_path(path: impl Into<PathBuf>) -> Self {
    let path = path.into();
    let name = path
      .file_name()
      .map(|n| n.to_string_lossy().into_owned())
      .unwrap_or_else(|| path.to_string_lossy().into_owned());
    Self {
      name,
      path,
      image: None,
    }
  }

  pub fn with_image(mut self, image: RgbImage) -> Self {
    self.image = Some(image);
    self
  }

  /// 图像标识（文件名），写入分析日志的 image_name
  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn path(&self) -> &Path {
    &self.path
  }

  pub fn image(&self) -> Option<&RgbImage> {
    self.image.as_ref()
  }

  pub fn width(&self) -> Option<u32> {
    self.image.as_ref().map(|i| i.width())
  }

  pub fn height(&self) -> Option<u32> {
    self.image.as_ref().map(|i| i.height())
  }
}
