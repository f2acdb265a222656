// 该文件是 ShelfGuard（货架守卫）项目的一部分。
// src/alert.rs - 补货告警
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

use std::{cell::RefCell, convert::Infallible};

use tracing::warn;

use crate::store::AnalysisRecord;

/// 告警通道。即时通讯、邮件等外部通知在此接入。
pub trait AlertSink {
  type Error;

  fn notify(&self, record: &AnalysisRecord) -> Result<(), Self::Error>;
}

impl<T: AlertSink> AlertSink for &T {
  type Error = T::Error;

  fn notify(&self, record: &AnalysisRecord) -> Result<(), Self::Error> {
    (**self).notify(record)
  }
}

/// 仅写日志的告警
#[derive(Debug, Clone)]
pub struct LogAlert {
  recipient: String,
}

impl Default for LogAlert {
  fn default() -> Self {
    Self {
      recipient: "Store Manager".to_string(),
    }
  }
}

impl LogAlert {
  pub fn new(recipient: impl Into<String>) -> Self {
    Self {
      recipient: recipient.into(),
    }
  }
}

impl AlertSink for LogAlert {
  type Error = Infallible;

  fn notify(&self, record: &AnalysisRecord) -> Result<(), Self::Error> {
    warn!(
      "库存告警 -> {}: {} 发现 {} 处空位 (记录 #{})",
      self.recipient, record.image_name, record.empty_count, record.id
    );
    Ok(())
  }
}

/// 收集告警，便于检查
#[derive(Debug, Default)]
pub struct CollectAlert {
  sent: RefCell<Vec<i64>>,
}

impl CollectAlert {
  pub fn sent(&self) -> Vec<i64> {
    self.sent.borrow().clone()
  }
}

impl AlertSink for CollectAlert {
  type Error = Infallible;

  fn notify(&self, record: &AnalysisRecord) -> Result<(), Self::Error> {
    self.sent.borrow_mut().push(record.id);
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::classify::ShelfStatus;
  use chrono::NaiveDateTime;

  fn record(id: i64) -> AnalysisRecord {
    AnalysisRecord {
      id,
      timestamp: NaiveDateTime::parse_from_str("2026-01-14 09:30:05", crate::store::TIMESTAMP_FORMAT)
        .unwrap(),
      image_name: "shelf1.jpg".to_string(),
      product_count: 3,
      empty_count: 1,
      status: ShelfStatus::RestockNeeded,
    }
  }

  #[test]
  fn collect_alert_through_reference() {
    let alert = CollectAlert::default();
    let by_ref = &alert;
    by_ref.notify(&record(1)).unwrap();
    by_ref.notify(&record(2)).unwrap();
    assert_eq!(alert.sent(), vec![1, 2]);
  }

  #[test]
  fn log_alert_never_fails() {
    assert!(LogAlert::new("Shift Lead").notify(&record(3)).is_ok());
  }
}
