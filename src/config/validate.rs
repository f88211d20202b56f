//! 設定驗證
//!
//! 在任何外部工具執行前檢查數值範圍，錯誤訊息指出欄位名稱。

use crate::config::types::{
    CutterSettings, FrameExtractionSettings, ImageOrder, MergerSettings, OverlaySettings,
    SlideshowSettings, TrailerSettings, UserSettings,
};
use crate::tools::parse_clock_duration;
use anyhow::{Context, Result, bail, ensure};

/// 投影片清單項目上限，以 5 秒一張計約 138 小時
pub const MAX_SLIDESHOW_IMAGES: usize = 100_000;

fn ensure_positive(value: f64, field: &str) -> Result<()> {
    ensure!(
        value.is_finite() && value > 0.0,
        "{field} 必須大於 0（目前為 {value}）"
    );
    Ok(())
}

fn ensure_unit_range(value: f64, field: &str) -> Result<()> {
    ensure!(
        (0.0..=1.0).contains(&value),
        "{field} 必須介於 0 與 1 之間（目前為 {value}）"
    );
    Ok(())
}

impl FrameExtractionSettings {
    pub fn validate(&self) -> Result<()> {
        ensure_unit_range(self.scene_threshold, "frame_extraction.scene_threshold")?;
        ensure!(
            self.samples_per_scene > 0,
            "frame_extraction.samples_per_scene 必須大於 0"
        );
        ensure_positive(self.sample_spacing, "frame_extraction.sample_spacing")?;
        ensure!(
            self.frame_width >= 16,
            "frame_extraction.frame_width 太小（目前為 {}）",
            self.frame_width
        );
        ensure!(
            (1..=31).contains(&self.jpeg_quality),
            "frame_extraction.jpeg_quality 必須介於 1 與 31 之間"
        );
        ensure!(
            self.darkness_threshold >= 0.0,
            "frame_extraction.darkness_threshold 不可為負數"
        );
        ensure!(
            self.blur_threshold >= 0.0,
            "frame_extraction.blur_threshold 不可為負數"
        );
        Ok(())
    }
}

impl OverlaySettings {
    pub fn validate(&self) -> Result<()> {
        let hex = self
            .key_color
            .strip_prefix("0x")
            .or_else(|| self.key_color.strip_prefix('#'))
            .unwrap_or(&self.key_color);
        ensure!(
            hex.len() == 6 && hex.chars().all(|c| c.is_ascii_hexdigit()),
            "slideshow.overlay.key_color 格式錯誤: {}",
            self.key_color
        );
        ensure_unit_range(self.similarity, "slideshow.overlay.similarity")?;
        ensure_unit_range(self.blend, "slideshow.overlay.blend")?;
        Ok(())
    }
}

impl SlideshowSettings {
    pub fn validate(&self) -> Result<()> {
        ensure_positive(self.image_duration, "slideshow.image_duration")?;
        ensure_positive(self.total_duration, "slideshow.total_duration")?;
        let count = (self.total_duration / self.image_duration).ceil();
        ensure!(
            count <= MAX_SLIDESHOW_IMAGES as f64,
            "slideshow.total_duration / slideshow.image_duration 需要 {count} 張圖片，超過上限 {MAX_SLIDESHOW_IMAGES}"
        );
        if self.expected_image_count.is_some() && self.order != ImageOrder::Sorted {
            bail!("slideshow.expected_image_count 只適用於 sorted 排列");
        }
        if let Some(overlay) = &self.overlay {
            overlay.validate()?;
        }
        Ok(())
    }
}

impl TrailerSettings {
    pub fn validate(&self) -> Result<()> {
        ensure!(self.clip_duration > 0, "trailer.clip_duration 必須大於 0");
        ensure!(
            self.clip_count() > 0,
            "trailer.total_duration 必須至少為一個片段長度"
        );
        if !self.intro_images.is_empty() {
            ensure_positive(self.intro_render_duration, "trailer.intro_render_duration")?;
            ensure_positive(self.intro_display_duration, "trailer.intro_display_duration")?;
        }
        ensure!(
            self.music_start_offset >= 0.0,
            "trailer.music_start_offset 不可為負數"
        );
        ensure!(self.source_volume >= 0.0, "trailer.source_volume 不可為負數");
        ensure!(self.music_volume >= 0.0, "trailer.music_volume 不可為負數");
        if let Some(factor) = self.slow_factor {
            ensure_positive(factor, "trailer.slow_factor")?;
        }
        Ok(())
    }
}

impl MergerSettings {
    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.inputs.len() >= 2,
            "merger.inputs 至少需要兩個影片（目前 {} 個）",
            self.inputs.len()
        );
        ensure!(
            !self.inputs.contains(&self.output),
            "merger.output 不可與輸入檔相同"
        );
        Ok(())
    }
}

impl CutterSettings {
    pub fn validate(&self) -> Result<()> {
        let seconds = parse_clock_duration(&self.length).context("cutter.length 格式錯誤")?;
        ensure_positive(seconds, "cutter.length")?;
        ensure!(self.input != self.output, "cutter.output 不可與輸入檔相同");
        Ok(())
    }
}

impl UserSettings {
    pub fn validate(&self) -> Result<()> {
        self.frame_extraction.validate()?;
        self.slideshow.validate()?;
        self.trailer.validate()?;
        self.merger.validate()?;
        self.cutter.validate()?;
        Ok(())
    }
}
