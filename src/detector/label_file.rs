// 该文件是 ShelfGuard（货架守卫）项目的一部分。
// src/detector/label_file.rs - YOLO 标注/预测文件回放检测器
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
use tracing::{debug, error, info};
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme,
  classify::Detection,
  detector::{Detector, optional_directory, query_map, sidecar_path},
  frame::ShelfFrame,
};

/// 零售货架数据集的类别表
const DEFAULT_CLASS_NAMES: [&str; 2] = ["Empty", "Product"];
/// 默认推理置信度阈值
const DEFAULT_CONFIDENCE: f32 = 0.25;

#[derive(Error, Debug)]
pub enum LabelFileError {
  #[error("URI 方案不匹配: {0}")]
  SchemeMismatch(String),
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("标注文件 {} 第 {line} 行格式错误: {reason}", path.display())]
  Malformed {
    path: PathBuf,
    line: usize,
    reason: String,
  },
  #[error("标注文件 {} 第 {line} 行类别编号 {class_id} 超出类别表", path.display())]
  UnknownClass {
    path: PathBuf,
    line: usize,
    class_id: usize,
  },
  #[error("无效参数 {key}={value}")]
  InvalidQuery { key: String, value: String },
}

/// 读取 YOLO 格式（`class cx cy w h [conf]`，归一化中心坐标）的逐图标注文件
#[derive(Debug, Clone)]
pub struct LabelFileDetector {
  directory: Option<PathBuf>,
  class_names: Vec<String>,
  confidence: f32,
}

impl FromUrlWithScheme for LabelFileDetector {
  const SCHEME: &'static str = "yolo-label";
}

impl FromUrl for LabelFileDetector {
  type Error = LabelFileError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      error!(
        "URI scheme mismatch: expected '{}', found '{}'",
        Self::SCHEME,
        url.scheme()
      );
      return Err(LabelFileError::SchemeMismatch(format!(
        "期望检测方式 '{}', 实际检测方式 '{}'",
        Self::SCHEME,
        url.scheme()
      )));
    }

    let query = query_map(url);

    let class_names = match query.get("names") {
      Some(names) => names.split(',').map(|n| n.trim().to_string()).collect(),
      None => DEFAULT_CLASS_NAMES.iter().map(|n| n.to_string()).collect(),
    };

    let confidence = match query.get("conf") {
      Some(value) => value
        .parse::<f32>()
        .ok()
        .filter(|c| (0.0..=1.0).contains(c))
        .ok_or_else(|| LabelFileError::InvalidQuery {
          key: "conf".to_string(),
          value: value.clone(),
        })?,
      None => DEFAULT_CONFIDENCE,
    };

    let detector = LabelFileDetector {
      directory: optional_directory(url),
      class_names,
      confidence,
    };
    info!(
      "标注文件检测器: 类别 {:?}, 置信度阈值 {}",
      detector.class_names, detector.confidence
    );
    Ok(detector)
  }
}

impl LabelFileDetector {
  pub fn new(directory: Option<PathBuf>, class_names: Vec<String>, confidence: f32) -> Self {
    Self {
      directory,
      class_names,
      confidence,
    }
  }

  pub fn class_names(&self) -> &[String] {
    &self.class_names
  }

  pub fn confidence(&self) -> f32 {
    self.confidence
  }

  /// 解析标注文本；低于阈值的行被丢弃
  pub fn parse(&self, content: &str, path: &Path) -> Result<Vec<Detection>, LabelFileError> {
    let mut detections = Vec::new();

    for (index, raw) in content.lines().enumerate() {
      let line = index + 1;
      let raw = raw.trim();
      if raw.is_empty() || raw.starts_with('#') {
        continue;
      }

      let malformed = |reason: String| LabelFileError::Malformed {
        path: path.to_path_buf(),
        line,
        reason,
      };

      let fields: Vec<&str> = raw.split_whitespace().collect();
      if fields.len() != 5 && fields.len() != 6 {
        return Err(malformed(format!("期望 5 或 6 列, 实际 {} 列", fields.len())));
      }

      let class_id: usize = fields[0]
        .parse()
        .map_err(|_| malformed(format!("类别编号 '{}' 不是非负整数", fields[0])))?;

      let mut values = [0f32; 5];
      for (slot, field) in values.iter_mut().zip(&fields[1..]) {
        *slot = field
          .parse::<f32>()
          .ok()
          .filter(|v| v.is_finite())
          .ok_or_else(|| malformed(format!("数值 '{}' 无法解析或不是有限值", field)))?;
      }
      let [cx, cy, w, h, _] = values;
      let score = if fields.len() == 6 { values[4] } else { 1.0 };

      if score < self.confidence {
        debug!("丢弃低置信度检测: 第 {} 行, 置信度 {:.2}", line, score);
        continue;
      }

      let label = self
        .class_names
        .get(class_id)
        .ok_or_else(|| LabelFileError::UnknownClass {
          path: path.to_path_buf(),
          line,
          class_id,
        })?;

      let bbox = [
        (cx - w / 2.0).clamp(0.0, 1.0),
        (cy - h / 2.0).clamp(0.0, 1.0),
        (cx + w / 2.0).clamp(0.0, 1.0),
        (cy + h / 2.0).clamp(0.0, 1.0),
      ];
      detections.push(Detection::new(label.clone(), score, bbox));
    }

    Ok(detections)
  }
}

impl Detector for LabelFileDetector {
  type Error = LabelFileError;

  fn detect(&self, frame: &ShelfFrame) -> Result<Vec<Detection>, Self::Error> {
    let path = sidecar_path(self.directory.as_deref(), "labels", frame, "txt");
    if !path.exists() {
      // 无标注文件即没有检测到任何目标
      debug!("标注文件不存在: {}", path.display());
      return Ok(Vec::new());
    }

    let content = std::fs::read_to_string(&path)?;
    let detections = self.parse(&content, &path)?;
    debug!("{}: 读取到 {} 个检测", frame.name(), detections.len());
    Ok(detections)
  }
}
