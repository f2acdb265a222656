// 该文件是 ShelfGuard（货架守卫）项目的一部分。
// src/output/directory_record.rs - 巡检证据目录输出
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

use std::{
  path::{Path, PathBuf},
  sync::atomic::{AtomicU32, Ordering},
};

use chrono::Local;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::{
  FromUrl, FromUrlWithScheme,
  classify::ShelfAnalysis,
  decoded_path,
  frame::ShelfFrame,
  output::{
    EVIDENCE_PREFIX, Render,
    draw::{Draw, FontError},
    font_from_query,
  },
};

#[derive(Error, Debug)]
pub enum DirectoryRecordOutputError {
  #[error("URI 方案不匹配")]
  SchemeMismatch,
  #[error("图像错误: {0}")]
  ImageError(#[from] image::ImageError),
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("字体错误: {0}")]
  FontError(#[from] FontError),
}

/// 文本记录：每行 `label, score, x_min, y_min, x_max, y_max`
pub struct Record;

impl Record {
  pub fn record(&self, result: &ShelfAnalysis, path: &Path) -> Result<(), std::io::Error> {
    let records: Vec<String> = result
      .detections
      .iter()
      .map(|item| {
        format!(
          "{}, {:.4}, {:.4}, {:.4}, {:.4}, {:.4}",
          item.label, item.confidence, item.bbox[0], item.bbox[1], item.bbox[2], item.bbox[3]
        )
      })
      .collect();
    std::fs::write(path.with_extension("txt"), records.join("\n"))?;
    Ok(())
  }
}

pub struct DirectoryRecordOutput {
  directory: PathBuf,
  draw: Draw,
  record: Option<Record>,
  frame_counter: AtomicU32,
  always: bool,
}

impl FromUrlWithScheme for DirectoryRecordOutput {
  const SCHEME: &'static str = "folder";
}

impl FromUrl for DirectoryRecordOutput {
  type Error = DirectoryRecordOutputError;

  fn from_url(uri: &url::Url) -> Result<Self, Self::Error> {
    if uri.scheme() != Self::SCHEME {
      return Err(DirectoryRecordOutputError::SchemeMismatch);
    }

    let record = uri.query_pairs().any(|(k, _)| k == "record");
    let skip_empty = uri.query_pairs().any(|(k, _)| k == "skip-empty");

    Ok(DirectoryRecordOutput::new(decoded_path(uri), font_from_query(uri)?)
      .with_record(record)
      .with_always(!skip_empty))
  }
}

impl DirectoryRecordOutput {
  pub fn new(directory: PathBuf, draw: Draw) -> Self {
    Self {
      directory,
      draw,
      record: None,
      frame_counter: AtomicU32::new(0),
      always: true,
    }
  }

  pub fn with_record(mut self, record: bool) -> Self {
    self.record = record.then_some(Record);
    self
  }

  /// 为 false 时，没有任何检测的帧不保存
  pub fn with_always(mut self, always: bool) -> Self {
    self.always = always;
    self
  }

  pub fn directory(&self) -> &Path {
    &self.directory
  }

  fn frame_id(&self) -> u32 {
    self.frame_counter.fetch_add(1, Ordering::Relaxed) + 1
  }

  fn frame_path(&self) -> Result<PathBuf, DirectoryRecordOutputError> {
    if !self.directory.exists() {
      std::fs::create_dir_all(&self.directory)?;
    }

    // 同一秒内的多帧靠序号区分
    let filename = format!(
      "{}{}-{:04X}.jpg",
      EVIDENCE_PREFIX,
      Local::now().format("%Y-%m-%d_%H-%M-%S"),
      self.frame_id()
    );
    Ok(self.directory.join(filename))
  }
}

impl Render<ShelfFrame, ShelfAnalysis> for DirectoryRecordOutput {
  type Error = DirectoryRecordOutputError;

  fn render_result(&self, frame: &ShelfFrame, result: &ShelfAnalysis) -> Result<(), Self::Error> {
    if !self.always && result.is_empty() {
      debug!("{} 无检测结果，跳过保存", frame.name());
      return Ok(());
    }

    let Some(source) = frame.image() else {
      warn!("{} 未解码，跳过保存证据图像", frame.name());
      return Ok(());
    };

    let path = self.frame_path()?;
    let mut image = source.clone();
    self.draw.draw_analysis(&mut image, result);
    image.save(&path)?;
    if let Some(record) = &self.record {
      record.record(result, &path)?;
    }
    info!("证据图像已保存: {}", path.display());
    Ok(())
  }
}
