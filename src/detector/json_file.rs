// 该文件是 ShelfGuard（货架守卫）项目的一部分。
// src/detector/json_file.rs - JSON 检测结果回放
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
use tracing::debug;
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme,
  classify::Detection,
  detector::{Detector, optional_directory, sidecar_path},
  frame::ShelfFrame,
};

#[derive(Error, Debug)]
pub enum JsonFileError {
  #[error("URI 方案不匹配")]
  SchemeMismatch,
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("JSON 解析错误: {0}")]
  JsonError(#[from] serde_json::Error),
}

/// 读取外部推理服务写出的 `[{"label", "confidence", "bbox"}]` 数组
#[derive(Debug, Clone)]
pub struct JsonFileDetector {
  directory: Option<PathBuf>,
}

impl FromUrlWithScheme for JsonFileDetector {
  const SCHEME: &'static str = "detections";
}

impl FromUrl for JsonFileDetector {
  type Error = JsonFileError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      return Err(JsonFileError::SchemeMismatch);
    }

    Ok(JsonFileDetector {
      directory: optional_directory(url),
    })
  }
}

impl Detector for JsonFileDetector {
  type Error = JsonFileError;

  fn detect(&self, frame: &ShelfFrame) -> Result<Vec<Detection>, Self::Error> {
    let path = sidecar_path(self.directory.as_deref(), "detections", frame, "json");
    if !path.exists() {
      debug!("检测结果文件不存在: {}", path.display());
      return Ok(Vec::new());
    }

    let content = std::fs::read_to_string(&path)?;
    let detections: Vec<Detection> = serde_json::from_str(&content)?;
    Ok(detections)
  }
}
