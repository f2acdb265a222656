// 该文件是 ShelfGuard（货架守卫）项目的一部分。
// src/classify.rs - 检测结果分类
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

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 空位哨兵标签，大小写敏感、精确匹配
pub const EMPTY_LABEL: &str = "Empty";

/// 归一化坐标 [x_min, y_min, x_max, y_max]
pub type BoundingBox = [f32; 4];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
  pub label: String,
  pub confidence: f32,
  pub bbox: BoundingBox,
}

impl Detection {
  pub fn new(label: impl Into<String>, confidence: f32, bbox: BoundingBox) -> Self {
    Self {
      label: label.into(),
      confidence,
      bbox,
    }
  }

  pub fn is_empty_slot(&self) -> bool {
    self.label == EMPTY_LABEL
  }
}

/// 货架状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShelfStatus {
  #[serde(rename = "OK")]
  Ok,
  #[serde(rename = "RESTOCK_NEEDED")]
  RestockNeeded,
}

impl ShelfStatus {
  pub fn from_empty_count(empty_count: u32) -> Self {
    if empty_count > 0 {
      ShelfStatus::RestockNeeded
    } else {
      ShelfStatus::Ok
    }
  }

  pub fn as_str(&self) -> &'static str {
    match self {
      ShelfStatus::Ok => "OK",
      ShelfStatus::RestockNeeded => "RESTOCK_NEEDED",
    }
  }

  pub fn needs_restock(&self) -> bool {
    matches!(self, ShelfStatus::RestockNeeded)
  }
}

impl fmt::Display for ShelfStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

#[derive(Error, Debug, PartialEq, Eq)]
#[error("未知的货架状态: {0}")]
pub struct UnknownStatus(pub String);

impl FromStr for ShelfStatus {
  type Err = UnknownStatus;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "OK" => Ok(ShelfStatus::Ok),
      "RESTOCK_NEEDED" => Ok(ShelfStatus::RestockNeeded),
      other => Err(UnknownStatus(other.to_string())),
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShelfSummary {
  pub product_count: u32,
  pub empty_count: u32,
  pub status: ShelfStatus,
}

impl ShelfSummary {
  pub fn new(product_count: u32, empty_count: u32) -> Self {
    Self {
      product_count,
      empty_count,
      status: ShelfStatus::from_empty_count(empty_count),
    }
  }

  pub fn total(&self) -> u64 {
    u64::from(self.product_count) + u64::from(self.empty_count)
  }

  /// 货架填充率（百分比），无检测时为 0
  pub fn fill_rate(&self) -> f64 {
    fill_rate(self.product_count, self.empty_count)
  }
}

pub fn fill_rate(product_count: u32, empty_count: u32) -> f64 {
  let total = u64::from(product_count) + u64::from(empty_count);
  if total == 0 {
    0.0
  } else {
    product_count as f64 / total as f64 * 100.0
  }
}

/// 将检测结果归约为商品数、空位数和货架状态。
///
/// 标签不是 [`EMPTY_LABEL`] 的检测（包括空字符串、未知标签）一律计为商品。
pub fn classify(detections: &[Detection]) -> ShelfSummary {
  let (mut product_count, mut empty_count) = (0u32, 0u32);
  for detection in detections {
    if detection.is_empty_slot() {
      empty_count += 1;
    } else {
      product_count += 1;
    }
  }
  ShelfSummary::new(product_count, empty_count)
}

/// 一帧的检测结果及其归约
#[derive(Debug, Clone, PartialEq)]
pub struct ShelfAnalysis {
  pub detections: Vec<Detection>,
  pub summary: ShelfSummary,
}

impl ShelfAnalysis {
  pub fn from_detections(detections: Vec<Detection>) -> Self {
    let summary = classify(&detections);
    Self {
      detections,
      summary,
    }
  }

  pub fn is_empty(&self) -> bool {
    self.detections.is_empty()
  }
}
