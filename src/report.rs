// 该文件是 ShelfGuard（货架守卫）项目的一部分。
// src/report.rs - 巡检报告
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
  fmt,
  io::Write,
  path::{Path, PathBuf},
  str::FromStr,
};

use serde::Serialize;
use thiserror::Error;

use crate::store::AnalysisRecord;

pub const REPORT_TITLE: &str = "ShelfGuard AI - Inspection Report";
pub const REPORT_FOOTER: &str = "Generated automatically by ShelfGuard AI System";

#[derive(Error, Debug)]
pub enum ReportError {
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("JSON 序列化错误: {0}")]
  JsonError(#[from] serde_json::Error),
  #[error("未知报告格式: {0}")]
  UnknownFormat(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportFormat {
  #[default]
  Text,
  Json,
}

impl FromStr for ReportFormat {
  type Err = ReportError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.to_ascii_lowercase().as_str() {
      "text" | "txt" => Ok(ReportFormat::Text),
      "json" => Ok(ReportFormat::Json),
      other => Err(ReportError::UnknownFormat(other.to_string())),
    }
  }
}

/// 单条记录的巡检报告，可附带证据图像
#[derive(Debug, Clone, Serialize)]
pub struct InspectionReport {
  pub title: &'static str,
  #[serde(flatten)]
  pub record: AnalysisRecord,
  pub fill_rate: f64,
  pub evidence: Option<PathBuf>,
}

impl InspectionReport {
  pub fn new(record: &AnalysisRecord, evidence: Option<PathBuf>) -> Self {
    Self {
      title: REPORT_TITLE,
      record: record.clone(),
      fill_rate: record.fill_rate(),
      evidence,
    }
  }

  pub fn evidence(&self) -> Option<&Path> {
    self.evidence.as_deref()
  }

  pub fn write<W: Write>(&self, format: ReportFormat, out: &mut W) -> Result<(), ReportError> {
    match format {
      ReportFormat::Text => write!(out, "{self}")?,
      ReportFormat::Json => {
        serde_json::to_writer_pretty(&mut *out, self)?;
        writeln!(out)?;
      }
    }
    Ok(())
  }
}

impl fmt::Display for InspectionReport {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    writeln!(f, "{}", self.title)?;
    writeln!(f, "{}", "=".repeat(self.title.len()))?;
    writeln!(f, "Date & Time: {}", self.record.timestamp_text())?;
    writeln!(f, "Image: {}", self.record.image_name)?;
    writeln!(f)?;
    writeln!(f, "Operational Metrics")?;
    writeln!(f, "  Status: {}", self.record.status)?;
    writeln!(f, "  Products Detected: {}", self.record.product_count)?;
    writeln!(f, "  Empty Spots: {}", self.record.empty_count)?;
    writeln!(f, "  Fill Rate: {:.1}%", self.fill_rate)?;
    writeln!(f)?;
    writeln!(f, "Visual Evidence")?;
    match &self.evidence {
      Some(path) => writeln!(f, "  {}", path.display())?,
      None => writeln!(f, "  (no evidence image available)")?,
    }
    writeln!(f)?;
    writeln!(f, "{REPORT_FOOTER}")
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{classify::ShelfStatus, store::TIMESTAMP_FORMAT};
  use chrono::NaiveDateTime;

  fn record() -> AnalysisRecord {
    AnalysisRecord {
      id: 7,
      timestamp: NaiveDateTime::parse_from_str("2026-01-14 09:30:05", TIMESTAMP_FORMAT).unwrap(),
      image_name: "aisle3.jpg".to_string(),
      product_count: 3,
      empty_count: 1,
      status: ShelfStatus::RestockNeeded,
    }
  }

  #[test]
  fn text_report_layout() {
    let report = InspectionReport::new(&record(), Some(PathBuf::from("runs/processed_x.jpg")));
    let mut buf = Vec::new();
    report.write(ReportFormat::Text, &mut buf).unwrap();
    let text = String::from_utf8(buf).unwrap();

    assert!(text.starts_with(REPORT_TITLE));
    assert!(text.contains("Date & Time: 2026-01-14 09:30:05"));
    assert!(text.contains("Status: RESTOCK_NEEDED"));
    assert!(text.contains("Products Detected: 3"));
    assert!(text.contains("Empty Spots: 1"));
    assert!(text.contains("runs/processed_x.jpg"));
    assert!(text.trim_end().ends_with(REPORT_FOOTER));
  }

  #[test]
  fn text_report_without_evidence() {
    let text = InspectionReport::new(&record(), None).to_string();
    assert!(text.contains("no evidence image available"));
  }

  #[test]
  fn json_report_fields() {
    let report = InspectionReport::new(&record(), None);
    let mut buf = Vec::new();
    report.write(ReportFormat::Json, &mut buf).unwrap();
    let value: serde_json::Value = serde_json::from_slice(&buf).unwrap();

    assert_eq!(value["id"], 7);
    assert_eq!(value["status"], "RESTOCK_NEEDED");
    assert_eq!(value["timestamp"], "2026-01-14 09:30:05");
    assert_eq!(value["fill_rate"], 75.0);
    assert!(value["evidence"].is_null());
  }

  #[test]
  fn parse_format() {
    assert_eq!("JSON".parse::<ReportFormat>().unwrap(), ReportFormat::Json);
    assert_eq!("text".parse::<ReportFormat>().unwrap(), ReportFormat::Text);
    assert!("pdf".parse::<ReportFormat>().is_err());
  }
}
