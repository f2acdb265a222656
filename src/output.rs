// 该文件是 ShelfGuard（货架守卫）项目的一部分。
// src/output.rs - 输出定义
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

use thiserror::Error;
use url::Url;

use crate::FromUrl;
#[cfg(any(feature = "save_image_file", feature = "directory_record"))]
use crate::FromUrlWithScheme;
use crate::{classify::ShelfAnalysis, frame::ShelfFrame};

pub trait Render<Frame, Output>: Sized {
  type Error;
  fn render_result(&self, frame: &Frame, result: &Output) -> Result<(), Self::Error>;
}

/// 未配置输出时什么也不做
impl<Frame, Output, R: Render<Frame, Output>> Render<Frame, Output> for Option<R> {
  type Error = R::Error;

  fn render_result(&self, frame: &Frame, result: &Output) -> Result<(), Self::Error> {
    match self {
      Some(output) => output.render_result(frame, result),
      None => Ok(()),
    }
  }
}

/// 证据图像文件名前缀
pub const EVIDENCE_PREFIX: &str = "processed_";

/// 目录中最新的证据图像
pub fn latest_evidence(directory: &Path) -> Option<PathBuf> {
  let entries = std::fs::read_dir(directory).ok()?;
  entries
    .filter_map(|entry| entry.ok().map(|e| e.path()))
    .filter(|path| {
      path
        .file_name()
        .and_then(|n| n.to_str())
        .map(|n| n.starts_with(EVIDENCE_PREFIX) && n.ends_with(".jpg"))
        .unwrap_or(false)
    })
    .max_by_key(|path| {
      let modified = path.metadata().and_then(|m| m.modified()).ok();
      (modified, path.clone())
    })
}

#[cfg(any(feature = "save_image_file", feature = "directory_record"))]
pub mod draw;

/// `font=/path/to/font.ttf` 查询参数决定是否绘制文字标签
#[cfg(any(feature = "save_image_file", feature = "directory_record"))]
fn font_from_query(uri: &Url) -> Result<draw::Draw, draw::FontError> {
  match uri.query_pairs().find(|(k, _)| k == "font") {
    Some((_, path)) => draw::Draw::default().with_font_file(Path::new(path.as_ref())),
    None => Ok(draw::Draw::default()),
  }
}

#[cfg(feature = "save_image_file")]
mod save_image_file;
#[cfg(feature = "save_image_file")]
pub use self::save_image_file::{SaveImageFileError, SaveImageFileOutput};

#[cfg(feature = "directory_record")]
mod directory_record;
#[cfg(feature = "directory_record")]
pub use self::directory_record::{DirectoryRecordOutput, DirectoryRecordOutputError, Record};

#[derive(Error, Debug)]
pub enum OutputError {
  #[cfg(feature = "save_image_file")]
  #[error("保存图像文件错误: {0}")]
  SaveImageFileError(#[from] SaveImageFileError),
  #[cfg(feature = "directory_record")]
  #[error("目录记录输出错误: {0}")]
  DirectoryRecordOutputError(#[from] DirectoryRecordOutputError),
  #[error("URI 方案不匹配")]
  SchemeMismatch,
}

pub enum OutputWrapper {
  #[cfg(feature = "save_image_file")]
  SaveImageFileOutput(SaveImageFileOutput),
  #[cfg(feature = "directory_record")]
  DirectoryRecordOutput(DirectoryRecordOutput),
  /// 只记日志、不落盘
  Discard,
}

impl FromUrl for OutputWrapper {
  type Error = OutputError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    match url.scheme() {
      #[cfg(feature = "save_image_file")]
      SaveImageFileOutput::SCHEME => {
        let output = SaveImageFileOutput::from_url(url)?;
        Ok(OutputWrapper::SaveImageFileOutput(output))
      }
      #[cfg(feature = "directory_record")]
      DirectoryRecordOutput::SCHEME => {
        let output = DirectoryRecordOutput::from_url(url)?;
        Ok(OutputWrapper::DirectoryRecordOutput(output))
      }
      "null" => Ok(OutputWrapper::Discard),
      _ => Err(OutputError::SchemeMismatch),
    }
  }
}

impl Render<ShelfFrame, ShelfAnalysis> for OutputWrapper {
  type Error = OutputError;

  fn render_result(&self, frame: &ShelfFrame, result: &ShelfAnalysis) -> Result<(), Self::Error> {
    match self {
      #[cfg(feature = "save_image_file")]
      OutputWrapper::SaveImageFileOutput(output) => output
        .render_result(frame, result)
        .map_err(OutputError::from),
      #[cfg(feature = "directory_record")]
      OutputWrapper::DirectoryRecordOutput(output) => output
        .render_result(frame, result)
        .map_err(OutputError::from),
      OutputWrapper::Discard => {
        tracing::debug!(
          "{}: {} (不保存输出)",
          frame.name(),
          result.summary.status
        );
        Ok(())
      }
    }
  }
}
