// 该文件是 ShelfGuard（货架守卫）项目的一部分。
// src/store/record.rs - 分析记录定义
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

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::classify::{ShelfStatus, ShelfSummary, fill_rate};

/// 记录时间戳格式，秒级精度，本地时间
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// 一次分析运行的持久化记录，写入后不可变
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRecord {
  pub id: i64,
  #[serde(with = "timestamp_text")]
  pub timestamp: NaiveDateTime,
  pub image_name: String,
  pub product_count: u32,
  pub empty_count: u32,
  pub status: ShelfStatus,
}

impl AnalysisRecord {
  pub fn summary(&self) -> ShelfSummary {
    ShelfSummary {
      product_count: self.product_count,
      empty_count: self.empty_count,
      status: self.status,
    }
  }

  pub fn total(&self) -> u64 {
    self.summary().total()
  }

  pub fn fill_rate(&self) -> f64 {
    fill_rate(self.product_count, self.empty_count)
  }

  pub fn timestamp_text(&self) -> String {
    self.timestamp.format(TIMESTAMP_FORMAT).to_string()
  }
}

mod timestamp_text {
  use chrono::NaiveDateTime;
  use serde::{Deserialize, Deserializer, Serializer, de::Error};

  use super::TIMESTAMP_FORMAT;

  pub fn serialize<S: Serializer>(value: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(&value.format(TIMESTAMP_FORMAT))
  }

  pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDateTime, D::Error> {
    let raw = String::deserialize(deserializer)?;
    NaiveDateTime::parse_from_str(&raw, TIMESTAMP_FORMAT).map_err(D::Error::custom)
  }
}
