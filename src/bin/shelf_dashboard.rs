// 该文件是 ShelfGuard（货架守卫）项目的一部分。
// src/bin/shelf_dashboard.rs - 终端看板
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

use std::{num::NonZeroUsize, path::PathBuf};

use anyhow::Result;
use clap::Parser;

use shelfguard::{
  dashboard::{DashboardState, render_dashboard},
  store::{AnalysisLog, DEFAULT_DB_PATH, StoreError},
};
use tracing::{info, warn};

/// 货架分析看板
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
  /// 分析日志数据库
  #[arg(long, env = "SHELFGUARD_DB", default_value = DEFAULT_DB_PATH, value_name = "FILE")]
  pub db: PathBuf,
  /// 只显示最近 N 条记录
  #[arg(long, value_name = "COUNT")]
  pub recent: Option<NonZeroUsize>,
}

fn main() -> Result<()> {
  tracing_subscriber::fmt::init();

  let args = Args::parse();
  info!("数据库: {}", args.db.display());

  let state = match AnalysisLog::open_existing(&args.db) {
    Ok(log) => {
      let records = match args.recent {
        Some(limit) => log.fetch_recent(limit),
        None => log.fetch_all(),
      };
      // 计数失败同样按无数据处理，与宽松读取一致
      let total = log.count().unwrap_or_else(|e| {
        warn!("统计记录数失败: {}", e);
        records.len() as u64
      });
      DashboardState::from_records(&records, total)
    }
    Err(StoreError::NotFound(path)) => {
      warn!("数据库不存在: {}", path.display());
      DashboardState::from_records(&[], 0)
    }
    Err(e) => return Err(e.into()),
  };

  let stdout = std::io::stdout();
  render_dashboard(&state, &mut stdout.lock())?;

  Ok(())
}
