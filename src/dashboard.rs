// 该文件是 ShelfGuard（货架守卫）项目的一部分。
// src/dashboard.rs - 终端看板
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

use std::io::{self, Write};

use chrono::NaiveDateTime;

use crate::{classify::ShelfStatus, store::AnalysisRecord};

/// 填充率目标（百分比）
pub const TARGET_FILL_RATE: f64 = 95.0;
const TREND_BAR_WIDTH: usize = 40;

/// 看板状态，由日志记录一次性计算得出，渲染时只读
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardState {
  pub latest: Option<AnalysisRecord>,
  /// 日志中的全部记录数，不受显示窗口限制
  pub total_scans: u64,
  /// (时间, 填充率)，按时间升序
  pub trend: Vec<(NaiveDateTime, f64)>,
  /// 按 id 倒序
  pub records: Vec<AnalysisRecord>,
}

impl DashboardState {
  /// `records` 须按 id 倒序（最新在前），与日志读取顺序一致；
  /// `total_scans` 取自 [`AnalysisLog::count`](crate::store::AnalysisLog::count)
  pub fn from_records(records: &[AnalysisRecord], total_scans: u64) -> Self {
    let mut trend: Vec<(NaiveDateTime, f64)> = records
      .iter()
      .map(|r| (r.timestamp, r.fill_rate()))
      .collect();
    trend.sort_by_key(|(timestamp, _)| *timestamp);

    Self {
      latest: records.first().cloned(),
      total_scans: total_scans.max(records.len() as u64),
      trend,
      records: records.to_vec(),
    }
  }

  pub fn is_empty(&self) -> bool {
    self.latest.is_none()
  }

  pub fn fill_rate(&self) -> f64 {
    self.latest.as_ref().map(|r| r.fill_rate()).unwrap_or(0.0)
  }

  pub fn action_required(&self) -> bool {
    self
      .latest
      .as_ref()
      .map(|r| r.status.needs_restock())
      .unwrap_or(false)
  }
}

/// 将看板渲染为纯文本
pub fn render_dashboard<W: Write>(state: &DashboardState, out: &mut W) -> io::Result<()> {
  writeln!(out, "Smart Shelf Analytics")?;
  writeln!(out, "Real-Time Inventory Intelligence System")?;
  writeln!(out)?;

  let Some(latest) = &state.latest else {
    writeln!(out, "System Ready. Run a scan to begin.")?;
    return Ok(());
  };

  writeln!(
    out,
    "Shelf Fill Rate: {:.1}% (Target: {:.0}%)",
    state.fill_rate(),
    TARGET_FILL_RATE
  )?;
  writeln!(out, "Total Scans: {}", state.total_scans)?;
  writeln!(out, "Products Detected: {}", latest.product_count)?;
  writeln!(
    out,
    "Action Required: {} ({})",
    latest.status,
    if state.action_required() {
      "Critical"
    } else {
      "Normal"
    }
  )?;
  writeln!(out)?;

  writeln!(out, "Current Status [{}]", latest.timestamp_text())?;
  match latest.status {
    ShelfStatus::Ok => writeln!(out, "  FULLY STOCKED")?,
    ShelfStatus::RestockNeeded => {
      writeln!(out, "  {} GAPS FOUND", latest.empty_count)?;
      writeln!(out, "  Alert Sent to: Store Manager")?;
    }
  }
  writeln!(out, "  Products: {}", latest.product_count)?;
  writeln!(out, "  Empty Spots: {}", latest.empty_count)?;
  writeln!(out)?;

  writeln!(out, "Historical Trends")?;
  for (timestamp, rate) in &state.trend {
    let filled = ((rate / 100.0) * TREND_BAR_WIDTH as f64).round() as usize;
    writeln!(
      out,
      "  {} |{:<width$}| {:5.1}%",
      timestamp.format(crate::store::TIMESTAMP_FORMAT),
      "#".repeat(filled.min(TREND_BAR_WIDTH)),
      rate,
      width = TREND_BAR_WIDTH
    )?;
  }
  writeln!(out)?;

  writeln!(
    out,
    "{:>6}  {:<19}  {:<24}  {:>8}  {:>6}  {:<14}",
    "id", "timestamp", "image_name", "products", "empty", "status"
  )?;
  for record in &state.records {
    writeln!(
      out,
      "{:>6}  {:<19}  {:<24}  {:>8}  {:>6}  {:<14}",
      record.id,
      record.timestamp_text(),
      record.image_name,
      record.product_count,
      record.empty_count,
      record.status.as_str()
    )?;
  }

  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::store::TIMESTAMP_FORMAT;

  fn record(id: i64, at: &str, products: u32, empty: u32) -> AnalysisRecord {
    AnalysisRecord {
      id,
      timestamp: NaiveDateTime::parse_from_str(at, TIMESTAMP_FORMAT).unwrap(),
      image_name: format!("shelf{id}.jpg"),
      product_count: products,
      empty_count: empty,
      status: ShelfStatus::from_empty_count(empty),
    }
  }

  fn render(state: &DashboardState) -> String {
    let mut buf = Vec::new();
    render_dashboard(state, &mut buf).unwrap();
    String::from_utf8(buf).unwrap()
  }

  #[test]
  fn empty_dashboard_prompts_for_scan() {
    let state = DashboardState::from_records(&[], 0);
    assert!(state.is_empty());
    assert_eq!(state.fill_rate(), 0.0);
    assert!(render(&state).contains("System Ready"));
  }

  #[test]
  fn metrics_follow_latest_record() {
    let records = vec![
      record(2, "2026-01-14 10:00:00", 3, 1),
      record(1, "2026-01-14 09:00:00", 10, 0),
    ];
    let state = DashboardState::from_records(&records, 2);
    assert_eq!(state.fill_rate(), 75.0);
    assert_eq!(state.total_scans, 2);
    assert!(state.action_required());

    let text = render(&state);
    assert!(text.contains("Shelf Fill Rate: 75.0%"));
    assert!(text.contains("1 GAPS FOUND"));
    assert!(text.contains("RESTOCK_NEEDED"));
  }

  #[test]
  fn trend_is_chronological() {
    let records = vec![
      record(3, "2026-01-14 11:00:00", 1, 1),
      record(2, "2026-01-14 10:00:00", 4, 0),
      record(1, "2026-01-14 09:00:00", 0, 0),
    ];
    let state = DashboardState::from_records(&records, 3);
    let rates: Vec<f64> = state.trend.iter().map(|(_, r)| *r).collect();
    assert_eq!(rates, vec![0.0, 100.0, 50.0]);
  }

  #[test]
  fn total_scans_counts_whole_log_not_window() {
    let mut log = crate::store::AnalysisLog::open_in_memory().unwrap();
    for i in 0..5 {
      log.append(&format!("shelf{i}.jpg"), 4, 0, ShelfStatus::Ok).unwrap();
    }
    let window = log.fetch_recent(std::num::NonZeroUsize::new(3).unwrap());
    let state = DashboardState::from_records(&window, log.count().unwrap());

    assert_eq!(state.records.len(), 3);
    assert_eq!(state.total_scans, 5);
    assert!(render(&state).contains("Total Scans: 5"));
  }

  #[test]
  fn counts_at_u32_limit_do_not_overflow() {
    let mut log = crate::store::AnalysisLog::open_in_memory().unwrap();
    log
      .append("big.jpg", u32::MAX, 1, ShelfStatus::RestockNeeded)
      .unwrap();
    let state = DashboardState::from_records(&log.fetch_all(), log.count().unwrap());
    assert!(state.fill_rate() > 99.9 && state.fill_rate() < 100.0);
    assert!(render(&state).contains("1 GAPS FOUND"));
  }

  #[test]
  fn fully_stocked_shelf() {
    let state = DashboardState::from_records(&[record(1, "2026-01-14 09:00:00", 8, 0)], 1);
    assert!(!state.action_required());
    let text = render(&state);
    assert!(text.contains("FULLY STOCKED"));
    assert!(!text.contains("Alert Sent"));
  }
}
