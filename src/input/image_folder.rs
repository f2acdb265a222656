// 该文件是 ShelfGuard（货架守卫）项目的一部分。
// src/input/image_folder.rs - 图像目录输入
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

use std::{collections::VecDeque, path::PathBuf};

use rand::seq::SliceRandom;
use thiserror::Error;
use tracing::{error, info};
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme, decoded_path,
  frame::ShelfFrame,
  input::{is_image_path, read_image_file::load_frame},
};

#[derive(Error, Debug)]
pub enum ImageFolderInputError {
  #[error("URI 方案不匹配")]
  SchemeMismatch,
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("目录中没有图像: {}", .0.display())]
  NoImages(PathBuf),
  #[error("未知的选取方式: {0}")]
  UnknownPick(String),
}

/// 目录中图像的选取方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pick {
  /// 随机一张（模拟单次巡检）
  Random,
  /// 按文件名顺序逐张
  All,
}

pub struct ImageFolderInput {
  pending: VecDeque<PathBuf>,
}

impl FromUrlWithScheme for ImageFolderInput {
  const SCHEME: &'static str = "folder";
}

impl FromUrl for ImageFolderInput {
  type Error = ImageFolderInputError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      return Err(ImageFolderInputError::SchemeMismatch);
    }

    let pick = match url.query_pairs().find(|(k, _)| k == "pick") {
      Some((_, v)) if v == "random" => Pick::Random,
      Some((_, v)) if v == "all" => Pick::All,
      Some((_, v)) => return Err(ImageFolderInputError::UnknownPick(v.into_owned())),
      None => Pick::Random,
    };

    Self::open(decoded_path(url), pick)
  }
}

impl ImageFolderInput {
  pub fn open(directory: PathBuf, pick: Pick) -> Result<Self, ImageFolderInputError> {
    let mut images: Vec<PathBuf> = std::fs::read_dir(&directory)?
      .filter_map(|entry| entry.ok().map(|e| e.path()))
      .filter(|path| path.is_file() && is_image_path(path))
      .collect();
    images.sort();

    if images.is_empty() {
      error!("目录中没有图像: {}", directory.display());
      return Err(ImageFolderInputError::NoImages(directory));
    }

    let pending: VecDeque<PathBuf> = match pick {
      Pick::All => images.into(),
      Pick::Random => images
        .choose(&mut rand::thread_rng())
        .cloned()
        .into_iter()
        .collect(),
    };

    info!(
      "图像目录 {}: 待处理 {} 张",
      directory.display(),
      pending.len()
    );
    Ok(Self { pending })
  }

  pub fn remaining(&self) -> usize {
    self.pending.len()
  }
}

impl Iterator for ImageFolderInput {
  type Item = ShelfFrame;

  fn next(&mut self) -> Option<Self::Item> {
    // 无法解码的文件跳过，不中断整批处理
    while let Some(path) = self.pending.pop_front() {
      match load_frame(&path) {
        Ok(frame) => return Some(frame),
        Err(e) => error!("跳过无法读取的图像 {}: {}", path.display(), e),
      }
    }
    None
  }
}
