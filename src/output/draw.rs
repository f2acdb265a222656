// 该文件是 ShelfGuard（货架守卫）项目的一部分。
// src/output/draw.rs - 货架检测结果可视化
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

use std::path::Path;

use ab_glyph::{FontArc, PxScale};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_text_mut};
use thiserror::Error;

use crate::classify::{Detection, ShelfAnalysis};

// 文本渲染常量
const LABEL_FONT_SIZE: f32 = 20.0;
const LABEL_TEXT_HEIGHT: i32 = 24;
const LABEL_CHAR_WIDTH: f32 = 11.0; // 每字符平均宽度（粗略估计）
const LABEL_TEXT_VERTICAL_PADDING: i32 = 2;
const PRODUCT_COLOR: [u8; 3] = [0, 200, 0]; // 绿色
const EMPTY_COLOR: [u8; 3] = [230, 0, 0]; // 红色
const BANNER_COLOR: [u8; 3] = [32, 32, 32];

#[derive(Error, Debug)]
pub enum FontError {
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("无效字体文件: {0}")]
  InvalidFont(#[from] ab_glyph::InvalidFont),
}

/// 检测框绘制器；未配置字体时只画框，不写标签
#[derive(Clone)]
pub struct Draw {
  font_size: f32,
  label_text_height: i32,
  label_char_width: f32,
  label_text_vertical_padding: i32,
  font: Option<FontArc>,
  product_color: [u8; 3],
  empty_color: [u8; 3],
}

impl Default for Draw {
  fn default() -> Self {
    Self {
      font_size: LABEL_FONT_SIZE,
      label_text_height: LABEL_TEXT_HEIGHT,
      label_char_width: LABEL_CHAR_WIDTH,
      label_text_vertical_padding: LABEL_TEXT_VERTICAL_PADDING,
      font: None,
      product_color: PRODUCT_COLOR,
      empty_color: EMPTY_COLOR,
    }
  }
}

impl Draw {
  pub fn with_font_file(mut self, path: &Path) -> Result<Self, FontError> {
    let data = std::fs::read(path)?;
    self.font = Some(FontArc::try_from_vec(data)?);
    Ok(self)
  }

  pub fn has_font(&self) -> bool {
    self.font.is_some()
  }

  /// 在图像上绘制所有检测框，并在顶部写出状态栏
  pub fn draw_analysis(&self, image: &mut RgbImage, analysis: &ShelfAnalysis) {
    for detection in &analysis.detections {
      let color = if detection.is_empty_slot() {
        self.empty_color
      } else {
        self.product_color
      };
      self.draw_bbox_with_label(image, detection, color);
    }

    let summary = &analysis.summary;
    let banner = format!(
      "Status: {} | Empty: {} | Products: {}",
      summary.status, summary.empty_count, summary.product_count
    );
    self.draw_label(image, 0, 0, &banner, BANNER_COLOR);
  }

  // bbox 为归一化坐标 [x_min, y_min, x_max, y_max]
  fn draw_bbox_with_label(&self, image: &mut RgbImage, detection: &Detection, color: [u8; 3]) {
    let (w, h) = (image.width() as f32, image.height() as f32);
    if w < 1.0 || h < 1.0 {
      return;
    }
    let bbox = &detection.bbox;

    let x_min = ((bbox[0] * w).floor() as i32).clamp(0, w as i32 - 1);
    let y_min = ((bbox[1] * h).floor() as i32).clamp(0, h as i32 - 1);
    let x_max = ((bbox[2] * w).ceil() as i32).clamp(0, w as i32 - 1);
    let y_max = ((bbox[3] * h).ceil() as i32).clamp(0, h as i32 - 1);

    if x_min >= x_max || y_min >= y_max {
      return;
    }

    // 绘制边框（加粗为2像素）
    for thickness in 0..2 {
      let x_min_t = (x_min + thickness).min(x_max);
      let y_min_t = (y_min + thickness).min(y_max);
      let x_max_t = (x_max - thickness).max(x_min);
      let y_max_t = (y_max - thickness).max(y_min);

      for x in x_min_t..=x_max_t {
        image.put_pixel(x as u32, y_min_t as u32, Rgb(color));
        image.put_pixel(x as u32, y_max_t as u32, Rgb(color));
      }
      for y in y_min_t..=y_max_t {
        image.put_pixel(x_min_t as u32, y as u32, Rgb(color));
        image.put_pixel(x_max_t as u32, y as u32, Rgb(color));
      }
    }

    let label = format!("{} {:.2}", detection.label, detection.confidence);
    let label_y = (y_min - self.label_text_height).max(0);
    self.draw_label(image, x_min, label_y, &label, color);
  }

  fn draw_label(&self, image: &mut RgbImage, x: i32, y: i32, text: &str, background: [u8; 3]) {
    let Some(font) = &self.font else {
      return;
    };

    // 估算文本大小（粗略估计）
    let text_width = (text.chars().count() as f32 * self.label_char_width) as i32;
    let max_width = (image.width() as i32 - x).max(0);
    let label_width = text_width.min(max_width) as u32;
    let label_height = self.label_text_height as u32;

    if label_width == 0 || label_height == 0 {
      return;
    }

    let rect = imageproc::rect::Rect::at(x, y).of_size(label_width, label_height);
    draw_filled_rect_mut(image, rect, Rgb(background));
    draw_text_mut(
      image,
      Rgb([255u8, 255u8, 255u8]),
      x,
      y + self.label_text_vertical_padding,
      PxScale::from(self.font_size),
      font,
      text,
    );
  }
}
