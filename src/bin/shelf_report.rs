// 该文件是 ShelfGuard（货架守卫）项目的一部分。
// src/bin/shelf_report.rs - 巡检报告
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

use anyhow::{Context, Result, bail};
use clap::Parser;

use shelfguard::{
  output::latest_evidence,
  report::{InspectionReport, ReportFormat},
  store::{AnalysisLog, DEFAULT_DB_PATH},
};
use tracing::info;

/// 为一条分析记录生成巡检报告
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
  /// 分析日志数据库
  #[arg(long, env = "SHELFGUARD_DB", default_value = DEFAULT_DB_PATH, value_name = "FILE")]
  pub db: PathBuf,
  /// 记录 id，缺省为最新一条
  #[arg(long, value_name = "ID")]
  pub id: Option<i64>,
  /// 证据图像目录，取其中最新的一张
  #[arg(long, value_name = "DIR")]
  pub evidence: Option<PathBuf>,
  /// 报告格式: text 或 json
  #[arg(long, default_value = "text", value_name = "FORMAT")]
  pub format: ReportFormat,
  /// 报告输出文件，缺省写到标准输出
  #[arg(long, value_name = "FILE")]
  pub output: Option<PathBuf>,
}

fn main() -> Result<()> {
  tracing_subscriber::fmt::init();

  let args = Args::parse();
  info!("数据库: {}", args.db.display());

  let log = AnalysisLog::open_existing(&args.db)?;
  let record = match args.id {
    Some(id) => log.get(id)?.with_context(|| format!("记录 #{id} 不存在"))?,
    None => match log.try_fetch_recent(NonZeroUsize::MIN)?.into_iter().next() {
      Some(record) => record,
      None => bail!("分析日志为空，请先运行巡检"),
    },
  };

  let evidence = args.evidence.as_deref().and_then(latest_evidence);
  let report = InspectionReport::new(&record, evidence);

  match &args.output {
    Some(path) => {
      let mut file = std::fs::File::create(path)?;
      report.write(args.format, &mut file)?;
      info!("报告已写入: {}", path.display());
    }
    None => {
      let stdout = std::io::stdout();
      report.write(args.format, &mut stdout.lock())?;
    }
  }

  Ok(())
}
