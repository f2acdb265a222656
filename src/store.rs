// 该文件是 ShelfGuard（货架守卫）项目的一部分。
// src/store.rs - 分析日志存储
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
  num::NonZeroUsize,
  path::{Path, PathBuf},
};

use chrono::{Local, NaiveDateTime};
use rusqlite::{Connection, Row, params};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::classify::{ShelfStatus, ShelfSummary};

mod record;
pub use self::record::{AnalysisRecord, TIMESTAMP_FORMAT};

/// 默认数据库文件名
pub const DEFAULT_DB_PATH: &str = "shelf_analytics.db";

const CURRENT_SCHEMA_VERSION: i32 = 1;

const SELECT_COLUMNS: &str =
  "SELECT id, timestamp, image_name, product_count, empty_count, status FROM analysis_logs";

#[derive(Error, Debug)]
pub enum StoreError {
  #[error("SQLite 错误: {0}")]
  Sqlite(#[from] rusqlite::Error),
  #[error("I/O 错误: {0}")]
  Io(#[from] std::io::Error),
  #[error("数据库文件不存在: {}", .0.display())]
  NotFound(PathBuf),
  #[error("数据库版本 ({found}) 高于支持的版本 ({supported})")]
  UnsupportedSchema { found: i32, supported: i32 },
  #[error("无效记录: {0}")]
  InvalidRecord(String),
}

/// 追加写入的分析日志。
///
/// 连接在打开时建立，随句柄释放而关闭；每次写入使用独立事务。
pub struct AnalysisLog {
  conn: Connection,
  path: Option<PathBuf>,
}

impl AnalysisLog {
  /// 打开（必要时创建）数据库文件并初始化表结构
  pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
    let path = path.as_ref();
    if let Some(parent) = path.parent()
      && !parent.as_os_str().is_empty()
    {
      std::fs::create_dir_all(parent)?;
    }

    let conn = Connection::open(path)?;
    let mut log = Self {
      conn,
      path: Some(path.to_path_buf()),
    };
    log.initialize()?;
    info!("分析日志已打开: {}", path.display());
    Ok(log)
  }

  /// 只打开已存在的数据库，不建表。供只读的看板与报告使用。
  pub fn open_existing(path: impl AsRef<Path>) -> Result<Self, StoreError> {
    let path = path.as_ref();
    if !path.is_file() {
      return Err(StoreError::NotFound(path.to_path_buf()));
    }

    let conn = Connection::open(path)?;
    debug!("打开已有分析日志: {}", path.display());
    Ok(Self {
      conn,
      path: Some(path.to_path_buf()),
    })
  }

  pub fn open_in_memory() -> Result<Self, StoreError> {
    let mut log = Self {
      conn: Connection::open_in_memory()?,
      path: None,
    };
    log.initialize()?;
    Ok(log)
  }

  pub fn path(&self) -> Option<&Path> {
    self.path.as_deref()
  }

  /// 确保表结构存在，重复调用无副作用
  pub fn initialize(&mut self) -> Result<(), StoreError> {
    let version: i32 = self
      .conn
      .pragma_query_value(None, "user_version", |row| row.get(0))?;

    if version > CURRENT_SCHEMA_VERSION {
      return Err(StoreError::UnsupportedSchema {
        found: version,
        supported: CURRENT_SCHEMA_VERSION,
      });
    }

    if version == CURRENT_SCHEMA_VERSION {
      return Ok(());
    }

    // 旧工具建出的库有表无版本号，CREATE TABLE IF NOT EXISTS 会直接沿用
    let tx = self.conn.transaction()?;
    tx.execute_batch(include_str!("store/schema_v1.sql"))?;
    tx.pragma_update(None, "user_version", CURRENT_SCHEMA_VERSION)?;
    tx.commit()?;
    debug!("表结构已初始化到版本 {}", CURRENT_SCHEMA_VERSION);
    Ok(())
  }

  /// 追加一条记录，返回分配的 id
  pub fn append(
    &mut self,
    image_name: &str,
    product_count: u32,
    empty_count: u32,
    status: ShelfStatus,
  ) -> Result<i64, StoreError> {
    if status != ShelfStatus::from_empty_count(empty_count) {
      return Err(StoreError::InvalidRecord(format!(
        "状态 {} 与空位数 {} 不一致",
        status, empty_count
      )));
    }

    let timestamp = Local::now().format(TIMESTAMP_FORMAT).to_string();

    let tx = self.conn.transaction()?;
    tx.execute(
      "INSERT INTO analysis_logs (timestamp, image_name, product_count, empty_count, status)
       VALUES (?1, ?2, ?3, ?4, ?5)",
      params![timestamp, image_name, product_count, empty_count, status.as_str()],
    )?;
    let id = tx.last_insert_rowid();
    tx.commit()?;

    info!("分析记录已保存: #{} {} (空位: {})", id, status, empty_count);
    Ok(id)
  }

  pub fn append_summary(&mut self, image_name: &str, summary: &ShelfSummary) -> Result<i64, StoreError> {
    self.append(
      image_name,
      summary.product_count,
      summary.empty_count,
      summary.status,
    )
  }

  /// 全部记录，按 id 倒序。读取失败时记录告警并返回空列表。
  pub fn fetch_all(&self) -> Vec<AnalysisRecord> {
    self.try_fetch_all().unwrap_or_else(|e| {
      warn!("读取分析日志失败，按无数据处理: {}", e);
      Vec::new()
    })
  }

  /// 最近 `limit` 条记录，按 id 倒序。读取失败时记录告警并返回空列表。
  pub fn fetch_recent(&self, limit: NonZeroUsize) -> Vec<AnalysisRecord> {
    self.try_fetch_recent(limit).unwrap_or_else(|e| {
      warn!("读取最近 {} 条分析日志失败，按无数据处理: {}", limit, e);
      Vec::new()
    })
  }

  pub fn try_fetch_all(&self) -> Result<Vec<AnalysisRecord>, StoreError> {
    self.query_records(None)
  }

  pub fn try_fetch_recent(&self, limit: NonZeroUsize) -> Result<Vec<AnalysisRecord>, StoreError> {
    self.query_records(Some(limit))
  }

  pub fn get(&self, id: i64) -> Result<Option<AnalysisRecord>, StoreError> {
    let mut stmt = self.conn.prepare(&format!("{SELECT_COLUMNS} WHERE id = ?1"))?;
    let mut rows = stmt.query(params![id])?;
    let record = match rows.next()? {
      Some(row) => Some(row_to_record(row)?),
      None => None,
    };
    Ok(record)
  }

  pub fn count(&self) -> Result<u64, StoreError> {
    let count: i64 = self
      .conn
      .query_row("SELECT COUNT(*) FROM analysis_logs", [], |row| row.get(0))?;
    u64::try_from(count).map_err(|_| StoreError::InvalidRecord(format!("记录数为负: {count}")))
  }

  fn query_records(&self, limit: Option<NonZeroUsize>) -> Result<Vec<AnalysisRecord>, StoreError> {
    // SQLite 中 LIMIT -1 表示不限制
    let limit = limit
      .map(|n| i64::try_from(n.get()).unwrap_or(i64::MAX))
      .unwrap_or(-1);

    let mut stmt = self
      .conn
      .prepare(&format!("{SELECT_COLUMNS} ORDER BY id DESC LIMIT ?1"))?;
    let mut rows = stmt.query(params![limit])?;
    let mut records = Vec::new();
    while let Some(row) = rows.next()? {
      records.push(row_to_record(row)?);
    }
    Ok(records)
  }
}

fn row_to_record(row: &Row) -> Result<AnalysisRecord, StoreError> {
  let timestamp: String = row.get("timestamp")?;
  let status: String = row.get("status")?;

  Ok(AnalysisRecord {
    id: row.get("id")?,
    timestamp: NaiveDateTime::parse_from_str(&timestamp, TIMESTAMP_FORMAT)
      .map_err(|e| StoreError::InvalidRecord(format!("时间戳 '{timestamp}' 无法解析: {e}")))?,
    image_name: row.get("image_name")?,
    product_count: row.get("product_count")?,
    empty_count: row.get("empty_count")?,
    status: status
      .parse()
      .map_err(|e| StoreError::InvalidRecord(format!("{e}")))?,
  })
}

#[cfg(test)]
mod tests {
  use super::*;
  use tempfile::TempDir;

  fn limit(n: usize) -> NonZeroUsize {
    NonZeroUsize::new(n).unwrap()
  }

  /// 目录随返回的 `TempDir` 一起删除
  fn temp_db() -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("shelf_analytics.db");
    (dir, path)
  }

  #[test]
  fn append_then_fetch_recent_round_trips() {
    let mut log = AnalysisLog::open_in_memory().unwrap();
    let first = log.append("a.jpg", 5, 0, ShelfStatus::Ok).unwrap();
    let id = log
      .append("img.jpg", 3, 1, ShelfStatus::RestockNeeded)
      .unwrap();
    assert!(id > first);

    let recent = log.fetch_recent(limit(1));
    assert_eq!(recent.len(), 1);
    let record = &recent[0];
    assert_eq!(record.id, id);
    assert_eq!(record.image_name, "img.jpg");
    assert_eq!(record.product_count, 3);
    assert_eq!(record.empty_count, 1);
    assert_eq!(record.status, ShelfStatus::RestockNeeded);
  }

  #[test]
  fn fetch_all_is_newest_first() {
    let mut log = AnalysisLog::open_in_memory().unwrap();
    let r1 = log.append("r1.jpg", 1, 0, ShelfStatus::Ok).unwrap();
    let r2 = log.append("r2.jpg", 2, 1, ShelfStatus::RestockNeeded).unwrap();
    let r3 = log.append("r3.jpg", 3, 0, ShelfStatus::Ok).unwrap();

    let ids: Vec<i64> = log.fetch_all().iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![r3, r2, r1]);
  }

  #[test]
  fn fetch_recent_is_bounded() {
    let mut log = AnalysisLog::open_in_memory().unwrap();
    let ids: Vec<i64> = (0..5)
      .map(|i| log.append(&format!("{i}.jpg"), i, 0, ShelfStatus::Ok).unwrap())
      .collect();

    let recent: Vec<i64> = log.fetch_recent(limit(3)).iter().map(|r| r.id).collect();
    assert_eq!(recent, vec![ids[4], ids[3], ids[2]]);

    assert_eq!(log.fetch_recent(limit(10)).len(), 5);
    assert_eq!(log.count().unwrap(), 5);
  }

  #[test]
  fn empty_store_reads_as_no_data() {
    let log = AnalysisLog::open_in_memory().unwrap();
    assert!(log.fetch_all().is_empty());
    assert!(log.try_fetch_all().unwrap().is_empty());
    assert_eq!(log.count().unwrap(), 0);
  }

  #[test]
  fn initialize_twice_keeps_content() {
    let mut log = AnalysisLog::open_in_memory().unwrap();
    log.append("keep.jpg", 2, 2, ShelfStatus::RestockNeeded).unwrap();
    let before = log.fetch_all();

    log.initialize().unwrap();
    log.initialize().unwrap();

    assert_eq!(log.fetch_all(), before);
  }

  #[test]
  fn status_must_follow_empty_count() {
    let mut log = AnalysisLog::open_in_memory().unwrap();
    let err = log.append("bad.jpg", 3, 1, ShelfStatus::Ok).unwrap_err();
    assert!(matches!(err, StoreError::InvalidRecord(_)));
    assert!(log.fetch_all().is_empty());
  }

  #[test]
  fn timestamps_use_second_resolution_text() {
    let mut log = AnalysisLog::open_in_memory().unwrap();
    let id = log.append("t.jpg", 1, 0, ShelfStatus::Ok).unwrap();
    let raw: String = log
      .conn
      .query_row(
        "SELECT timestamp FROM analysis_logs WHERE id = ?1",
        params![id],
        |row| row.get(0),
      )
      .unwrap();
    assert_eq!(raw.len(), "YYYY-MM-DD HH:MM:SS".len());
    assert!(NaiveDateTime::parse_from_str(&raw, TIMESTAMP_FORMAT).is_ok());
  }

  #[test]
  fn get_by_id() {
    let mut log = AnalysisLog::open_in_memory().unwrap();
    let id = log.append("x.jpg", 4, 0, ShelfStatus::Ok).unwrap();
    assert_eq!(log.get(id).unwrap().unwrap().image_name, "x.jpg");
    assert!(log.get(id + 100).unwrap().is_none());
  }

  #[test]
  fn file_store_persists_across_handles() {
    let (_dir, path) = temp_db();
    {
      let mut log = AnalysisLog::open(&path).unwrap();
      log.append("shelf1.jpg", 3, 1, ShelfStatus::RestockNeeded).unwrap();
    }
    let log = AnalysisLog::open(&path).unwrap();
    let records = log.try_fetch_all().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].status, ShelfStatus::RestockNeeded);
  }

  #[test]
  fn open_existing_reports_missing_file() {
    let (_dir, path) = temp_db();
    match AnalysisLog::open_existing(&path) {
      Err(StoreError::NotFound(p)) => assert_eq!(p, path),
      Err(other) => panic!("unexpected error: {other}"),
      Ok(_) => panic!("missing file must not open"),
    }
  }

  #[test]
  fn unreadable_file_is_strict_error_but_lenient_empty() {
    let (_dir, path) = temp_db();
    std::fs::write(&path, b"this is definitely not a sqlite database, just text padding it out").unwrap();

    let log = AnalysisLog::open_existing(&path).unwrap();
    assert!(log.try_fetch_all().is_err());
    assert!(log.fetch_all().is_empty());
    assert!(log.fetch_recent(limit(3)).is_empty());

  }

  #[test]
  fn adopts_table_created_without_version() {
    let (_dir, path) = temp_db();
    {
      let conn = Connection::open(&path).unwrap();
      conn
        .execute_batch(include_str!("store/schema_v1.sql"))
        .unwrap();
      conn
        .execute(
          "INSERT INTO analysis_logs (timestamp, image_name, product_count, empty_count, status)
           VALUES ('2026-01-14 10:00:00', 'old.jpg', 9, 0, 'OK')",
          [],
        )
        .unwrap();
    }

    let mut log = AnalysisLog::open(&path).unwrap();
    log.append("new.jpg", 1, 1, ShelfStatus::RestockNeeded).unwrap();
    let names: Vec<String> = log.fetch_all().into_iter().map(|r| r.image_name).collect();
    assert_eq!(names, vec!["new.jpg".to_string(), "old.jpg".to_string()]);

  }

  #[test]
  fn rejects_newer_schema() {
    let (_dir, path) = temp_db();
    {
      let conn = Connection::open(&path).unwrap();
      conn.pragma_update(None, "user_version", 99).unwrap();
    }
    assert!(matches!(
      AnalysisLog::open(&path),
      Err(StoreError::UnsupportedSchema { found: 99, .. })
    ));
  }
}
