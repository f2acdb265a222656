// 该文件是 ShelfGuard（货架守卫）项目的一部分。
// src/task.rs - 巡检任务
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

use anyhow::Context;
use tracing::{info, warn};

use crate::{
  alert::AlertSink,
  classify::ShelfAnalysis,
  detector::Detector,
  frame::ShelfFrame,
  output::Render,
  store::{AnalysisLog, AnalysisRecord},
};

pub trait Task<I, D, O>: Sized {
  type Error;
  type Output;
  fn run_task(self, input: I, detector: D, output: O) -> Result<Self::Output, Self::Error>;
}

/// 一次巡检：检测 -> 分类 -> 写日志 -> 保存证据 -> 告警。
///
/// 写日志失败时本次运行终止，记录丢失，不重试。
pub struct ScanTask<'a, A> {
  log: &'a mut AnalysisLog,
  alert: A,
  max_frames: Option<usize>,
}

impl<'a, A> ScanTask<'a, A> {
  pub fn new(log: &'a mut AnalysisLog, alert: A) -> Self {
    Self {
      log,
      alert,
      max_frames: None,
    }
  }

  pub fn with_max_frames(mut self, max_frames: Option<usize>) -> Self {
    self.max_frames = max_frames;
    self
  }
}

impl<
  'a,
  DE: std::error::Error + Sync + Send + 'static,
  RE: std::error::Error + Sync + Send + 'static,
  AE: std::error::Error + Sync + Send + 'static,
  A: AlertSink<Error = AE>,
  I: Iterator<Item = ShelfFrame>,
  D: Detector<Error = DE>,
  O: Render<ShelfFrame, ShelfAnalysis, Error = RE>,
> Task<I, D, O> for ScanTask<'a, A>
{
  type Error = anyhow::Error;
  type Output = Vec<AnalysisRecord>;

  fn run_task(mut self, input: I, detector: D, output: O) -> Result<Self::Output, Self::Error> {
    info!("开始巡检任务...");
    let mut records = Vec::new();

    // 先截断再迭代，超出的帧不会被读取解码
    let limit = self.max_frames.unwrap_or(usize::MAX);
    for frame in input.take(limit) {
      let now = std::time::Instant::now();
      let detections = detector
        .detect(&frame)
        .with_context(|| format!("检测失败: {}", frame.name()))?;
      let analysis = ShelfAnalysis::from_detections(detections);
      info!(
        "{}: 商品 {}, 空位 {}, 状态 {} (耗时 {:.2?})",
        frame.name(),
        analysis.summary.product_count,
        analysis.summary.empty_count,
        analysis.summary.status,
        now.elapsed()
      );

      let id = self
        .log
        .append_summary(frame.name(), &analysis.summary)
        .with_context(|| format!("写入分析日志失败: {}", frame.name()))?;
      let record = self
        .log
        .get(id)?
        .with_context(|| format!("写入后未找到记录 #{id}"))?;

      output.render_result(&frame, &analysis)?;

      if record.status.needs_restock() {
        warn!("需要补货: {} 处空位", record.empty_count);
        self.alert.notify(&record)?;
      }

      records.push(record);
    }

    if self.max_frames == Some(records.len()) {
      info!("达到指定帧数 {}", records.len());
    }
    if records.is_empty() {
      warn!("没有可处理的输入帧");
    }
    info!("巡检任务完成，共 {} 帧", records.len());
    Ok(records)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{
    alert::CollectAlert,
    classify::{Detection, ShelfStatus},
    detector::StaticDetector,
  };

  fn frames(names: &[&str]) -> Vec<ShelfFrame> {
    names.iter().map(|n| ShelfFrame::from_path(*n)).collect()
  }

  #[test]
  fn scan_logs_and_alerts_on_gaps() {
    let mut log = AnalysisLog::open_in_memory().unwrap();
    let alert = CollectAlert::default();
    let detector = StaticDetector::new(
      ["Product", "Product", "Empty", "Product"]
        .iter()
        .map(|l| Detection::new(*l, 0.9, [0.0, 0.0, 0.1, 0.1]))
        .collect(),
    );

    let records = ScanTask::new(&mut log, &alert)
      .run_task(frames(&["shelf1.jpg"]).into_iter(), detector, None::<crate::output::OutputWrapper>)
      .unwrap();

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].product_count, 3);
    assert_eq!(records[0].empty_count, 1);
    assert_eq!(alert.sent(), vec![records[0].id]);
    assert_eq!(log.fetch_all()[0].status, ShelfStatus::RestockNeeded);
  }

  #[test]
  fn full_shelf_does_not_alert() {
    let mut log = AnalysisLog::open_in_memory().unwrap();
    let alert = CollectAlert::default();
    let detector = StaticDetector::new(vec![Detection::new("Product", 0.9, [0.0, 0.0, 0.1, 0.1])]);

    let records = ScanTask::new(&mut log, &alert)
      .run_task(frames(&["a.jpg", "b.jpg"]).into_iter(), detector, None::<crate::output::OutputWrapper>)
      .unwrap();

    assert_eq!(records.len(), 2);
    assert!(records.iter().all(|r| r.status == ShelfStatus::Ok));
    assert!(alert.sent().is_empty());
  }

  #[test]
  fn max_frames_bounds_the_run() {
    let mut log = AnalysisLog::open_in_memory().unwrap();
    let records = ScanTask::new(&mut log, CollectAlert::default())
      .with_max_frames(Some(2))
      .run_task(
        frames(&["a.jpg", "b.jpg", "c.jpg"]).into_iter(),
        StaticDetector::default(),
        None::<crate::output::OutputWrapper>,
      )
      .unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(log.count().unwrap(), 2);
  }

  #[test]
  fn max_frames_stops_pulling_input() {
    let pulled = std::cell::Cell::new(0usize);
    let input = frames(&["a.jpg", "b.jpg", "c.jpg", "d.jpg"])
      .into_iter()
      .inspect(|_| pulled.set(pulled.get() + 1));

    let mut log = AnalysisLog::open_in_memory().unwrap();
    ScanTask::new(&mut log, CollectAlert::default())
      .with_max_frames(Some(2))
      .run_task(input, StaticDetector::default(), None::<crate::output::OutputWrapper>)
      .unwrap();
    assert_eq!(pulled.get(), 2);
  }
}
