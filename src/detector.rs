// 该文件是 ShelfGuard（货架守卫）项目的一部分。
// src/detector.rs - 目标检测能力
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
  collections::HashMap,
  convert::Infallible,
  path::{Path, PathBuf},
};

use thiserror::Error;
use url::Url;

use crate::{FromUrl, FromUrlWithScheme, classify::Detection, frame::ShelfFrame};

/// 检测器：给定一帧图像，输出带标签的检测框。具体推理引擎可以任意替换。
pub trait Detector {
  type Error;

  fn detect(&self, frame: &ShelfFrame) -> Result<Vec<Detection>, Self::Error>;
}

/// 固定输出的检测器
#[derive(Debug, Clone, Default)]
pub struct StaticDetector {
  detections: Vec<Detection>,
}

impl StaticDetector {
  pub fn new(detections: Vec<Detection>) -> Self {
    Self { detections }
  }
}

impl Detector for StaticDetector {
  type Error = Infallible;

  fn detect(&self, _frame: &ShelfFrame) -> Result<Vec<Detection>, Self::Error> {
    Ok(self.detections.clone())
  }
}

mod json_file;
mod label_file;

pub use self::json_file::{JsonFileDetector, JsonFileError};
pub use self::label_file::{LabelFileDetector, LabelFileError};

#[derive(Error, Debug)]
pub enum DetectorError {
  #[error("标注文件检测器错误: {0}")]
  LabelFileError(#[from] LabelFileError),
  #[error("JSON 检测结果错误: {0}")]
  JsonFileError(#[from] JsonFileError),
  #[error("URI 方案不匹配")]
  SchemeMismatch,
}

pub enum DetectorWrapper {
  LabelFile(LabelFileDetector),
  JsonFile(JsonFileDetector),
}

impl FromUrl for DetectorWrapper {
  type Error = DetectorError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    match url.scheme() {
      LabelFileDetector::SCHEME => Ok(DetectorWrapper::LabelFile(LabelFileDetector::from_url(url)?)),
      JsonFileDetector::SCHEME => Ok(DetectorWrapper::JsonFile(JsonFileDetector::from_url(url)?)),
      _ => Err(DetectorError::SchemeMismatch),
    }
  }
}

impl Detector for DetectorWrapper {
  type Error = DetectorError;

  fn detect(&self, frame: &ShelfFrame) -> Result<Vec<Detection>, Self::Error> {
    match self {
      DetectorWrapper::LabelFile(detector) => detector.detect(frame).map_err(DetectorError::from),
      DetectorWrapper::JsonFile(detector) => detector.detect(frame).map_err(DetectorError::from),
    }
  }
}

/// 检测结果文件的位置：URL 给出目录时在该目录下按图像名查找，
/// 否则按数据集布局 `.../images/x.jpg` -> `.../<sibling>/x.<ext>` 推断。
pub(crate) fn sidecar_path(
  directory: Option<&Path>,
  sibling: &str,
  frame: &ShelfFrame,
  extension: &str,
) -> PathBuf {
  let image_path = frame.path();
  let mut file_name = image_path
    .file_stem()
    .map(|s| s.to_os_string())
    .unwrap_or_default();
  file_name.push(".");
  file_name.push(extension);

  let directory = match directory {
    Some(dir) => dir.to_path_buf(),
    None => {
      let parent = image_path.parent().unwrap_or_else(|| Path::new(""));
      match (parent.file_name(), parent.parent()) {
        (Some(name), Some(grand)) if name == "images" => grand.join(sibling),
        _ => parent.to_path_buf(),
      }
    }
  };

  directory.join(file_name)
}

/// URL 路径为空时返回 None
pub(crate) fn optional_directory(url: &Url) -> Option<PathBuf> {
  let path = crate::decoded_path(url);
  if path.as_os_str().is_empty() {
    None
  } else {
    Some(path)
  }
}

pub(crate) fn query_map(url: &Url) -> HashMap<String, String> {
  url
    .query_pairs()
    .map(|(k, v)| (k.into_owned(), v.into_owned()))
    .collect()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn sidecar_follows_dataset_layout() {
    let frame = ShelfFrame::from_path("/data/test/images/shelf1.jpg");
    assert_eq!(
      sidecar_path(None, "labels", &frame, "txt"),
      PathBuf::from("/data/test/labels/shelf1.txt")
    );
  }

  #[test]
  fn sidecar_defaults_to_image_directory() {
    let frame = ShelfFrame::from_path("/tmp/shots/shelf1.jpg");
    assert_eq!(
      sidecar_path(None, "labels", &frame, "json"),
      PathBuf::from("/tmp/shots/shelf1.json")
    );
  }

  #[test]
  fn sidecar_uses_given_directory() {
    let frame = ShelfFrame::from_path("/data/test/images/shelf1.jpg");
    assert_eq!(
      sidecar_path(Some(Path::new("/preds")), "labels", &frame, "txt"),
      PathBuf::from("/preds/shelf1.txt")
    );
  }

  #[test]
  fn static_detector_replays() {
    let detector = StaticDetector::new(vec![Detection::new("Empty", 0.8, [0.0, 0.0, 0.5, 0.5])]);
    let out = detector.detect(&ShelfFrame::from_path("a.jpg")).unwrap();
    assert_eq!(out.len(), 1);
    assert!(out[0].is_empty_slot());
  }

  #[test]
  fn wrapper_rejects_unknown_scheme() {
    let url = Url::parse("onnx:///models/best.onnx").unwrap();
    assert!(matches!(
      DetectorWrapper::from_url(&url),
      Err(DetectorError::SchemeMismatch)
    ));
  }
}
