// 该文件是 ShelfGuard（货架守卫）项目的一部分。
// src/bin/shelf_scan.rs - 货架巡检
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

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use url::Url;

use shelfguard::{
  FromUrl,
  alert::LogAlert,
  detector::DetectorWrapper,
  input::InputWrapper,
  output::OutputWrapper,
  store::{AnalysisLog, DEFAULT_DB_PATH},
  task::{ScanTask, Task},
};
use tracing::info;

/// 货架巡检：检测、分类、写入分析日志
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
  /// 输入来源，例如 image:///data/shelf.jpg 或 folder:///data/images?pick=all
  #[arg(long, value_name = "SOURCE")]
  pub input: Url,
  /// 检测器，例如 yolo-label:///data/labels?names=Empty,Product
  #[arg(long, value_name = "DETECTOR")]
  pub detector: Url,
  /// 证据输出，例如 folder:///data/runs?record
  #[arg(long, value_name = "OUTPUT")]
  pub output: Option<Url>,
  /// 分析日志数据库
  #[arg(long, env = "SHELFGUARD_DB", default_value = DEFAULT_DB_PATH, value_name = "FILE")]
  pub db: PathBuf,
  /// 告警接收人
  #[arg(long, default_value = "Store Manager", value_name = "NAME")]
  pub recipient: String,
  /// 最大处理帧数
  #[arg(long, value_name = "COUNT")]
  pub max_frames: Option<usize>,
}

fn main() -> Result<()> {
  tracing_subscriber::fmt::init();

  let args = Args::parse();

  info!("输入来源: {}", args.input);
  info!("检测器: {}", args.detector);
  info!("数据库: {}", args.db.display());

  let input = InputWrapper::from_url(&args.input)?;
  let detector = DetectorWrapper::from_url(&args.detector)?;
  let output = args
    .output
    .as_ref()
    .map(OutputWrapper::from_url)
    .transpose()?;
  let mut log = AnalysisLog::open(&args.db)?;

  let records = ScanTask::new(&mut log, LogAlert::new(args.recipient))
    .with_max_frames(args.max_frames)
    .run_task(input, detector, output)?;

  for record in &records {
    println!(
      "#{} {} products={} empty={} status={}",
      record.id, record.image_name, record.product_count, record.empty_count, record.status
    );
  }

  Ok(())
}
