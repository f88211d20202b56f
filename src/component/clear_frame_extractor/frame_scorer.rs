//! 從每個場景的候選畫面中挑出最清晰的一張
//!
//! 評分方式:
//! 1. 所有通道的平均亮度低於 `darkness` 視為黑畫面
//! 2. 灰階 (BT.601) Laplacian (3x3 四鄰域) 的變異數低於 `blur` 視為模糊
//! 3. 通過的候選中變異數最高者勝出，同分取檔名較前者

use crate::config::FrameExtractionSettings;
use crate::tools::{list_images, list_subdirectories, recreate_directory};
use anyhow::{Context, Result};
use image::{DynamicImage, GrayImage, Luma};
use log::{debug, info, warn};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QualityThresholds {
    pub darkness: f64,
    pub blur: f64,
}

impl Default for QualityThresholds {
    fn default() -> Self {
        Self {
            darkness: 10.0,
            blur: 100.0,
        }
    }
}

impl From<&FrameExtractionSettings> for QualityThresholds {
    fn from(settings: &FrameExtractionSettings) -> Self {
        Self {
            darkness: settings.darkness_threshold,
            blur: settings.blur_threshold,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameMetrics {
    pub mean_intensity: f64,
    pub sharpness: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FrameVerdict {
    Accepted { sharpness: f64 },
    TooDark { mean_intensity: f64 },
    TooBlurry { sharpness: f64 },
}

impl FrameVerdict {
    #[must_use]
    pub const fn sharpness(&self) -> Option<f64> {
        match self {
            Self::Accepted { sharpness } => Some(*sharpness),
            _ => None,
        }
    }
}

impl QualityThresholds {
    /// 先判斷亮度，再判斷清晰度
    #[must_use]
    pub fn judge(&self, metrics: &FrameMetrics) -> FrameVerdict {
        if metrics.mean_intensity < self.darkness {
            FrameVerdict::TooDark {
                mean_intensity: metrics.mean_intensity,
            }
        } else if metrics.sharpness < self.blur {
            FrameVerdict::TooBlurry {
                sharpness: metrics.sharpness,
            }
        } else {
            FrameVerdict::Accepted {
                sharpness: metrics.sharpness,
            }
        }
    }
}

/// 所有通道所有像素的平均值（0-255），空圖回傳 0
#[must_use]
pub fn mean_intensity(image: &DynamicImage) -> f64 {
    let rgb = image.to_rgb8();
    let raw = rgb.as_raw();
    if raw.is_empty() {
        return 0.0;
    }
    let sum: u64 = raw.iter().map(|&v| u64::from(v)).sum();
    sum as f64 / raw.len() as f64
}

/// 邊界以 reflect-101 方式延伸（`dcb|abcd|cba`）
const fn reflect101(index: i64, len: i64) -> i64 {
    if len == 1 {
        return 0;
    }
    if index < 0 {
        -index
    } else if index >= len {
        2 * len - 2 - index
    } else {
        index
    }
}

/// BT.601 灰階，使用與 OpenCV `COLOR_RGB2GRAY` 相同的 14 位元定點係數與四捨五入
#[must_use]
pub fn grayscale(image: &DynamicImage) -> GrayImage {
    const R: u32 = 4899;
    const G: u32 = 9617;
    const B: u32 = 1868;
    const SHIFT: u32 = 14;

    let rgb = image.to_rgb8();
    GrayImage::from_fn(rgb.width(), rgb.height(), |x, y| {
        let [r, g, b] = rgb.get_pixel(x, y).0;
        let luma = (u32::from(r) * R + u32::from(g) * G + u32::from(b) * B + (1 << (SHIFT - 1)))
            >> SHIFT;
        Luma([luma.min(255) as u8])
    })
}

/// 灰階影像套用 `[[0,1,0],[1,-4,1],[0,1,0]]` 後的母體變異數
#[must_use]
pub fn laplacian_variance(gray: &GrayImage) -> f64 {
    let (width, height) = gray.dimensions();
    if width == 0 || height == 0 {
        return 0.0;
    }
    let (w, h) = (i64::from(width), i64::from(height));
    let at = |x: i64, y: i64| -> f64 {
        let px = reflect101(x, w) as u32;
        let py = reflect101(y, h) as u32;
        f64::from(gray.get_pixel(px, py).0[0])
    };

    let mut responses = Vec::with_capacity((width as usize) * (height as usize));
    for y in 0..h {
        for x in 0..w {
            let value = at(x, y - 1) + at(x - 1, y) + at(x + 1, y) + at(x, y + 1) - 4.0 * at(x, y);
            responses.push(value);
        }
    }

    let n = responses.len() as f64;
    let mean = responses.iter().sum::<f64>() / n;
    responses.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n
}

#[must_use]
pub fn measure(image: &DynamicImage) -> FrameMetrics {
    FrameMetrics {
        mean_intensity: mean_intensity(image),
        sharpness: laplacian_variance(&grayscale(image)),
    }
}

/// 回傳分數最高者的索引；同分保留較前者
#[must_use]
pub fn pick_sharpest(scores: &[Option<f64>]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (index, score) in scores.iter().enumerate() {
        let Some(score) = *score else {
            continue;
        };
        match best {
            Some((_, best_score)) if score <= best_score => {}
            _ => best = Some((index, score)),
        }
    }
    best.map(|(index, _)| index)
}

/// 單一場景資料夾的挑選結果
#[derive(Debug, Clone)]
pub struct SceneSelection {
    pub scene_dir: PathBuf,
    pub best: Option<PathBuf>,
    pub sharpness: Option<f64>,
    pub candidates: usize,
    pub rejected_dark: usize,
    pub rejected_blurry: usize,
    pub unreadable: usize,
}

/// 評估資料夾中所有候選畫面（依檔名排序），挑出最清晰的一張
pub fn select_best_frame(scene_dir: &Path, thresholds: &QualityThresholds) -> Result<SceneSelection> {
    let candidates = list_images(scene_dir)?;
    let mut selection = SceneSelection {
        scene_dir: scene_dir.to_path_buf(),
        best: None,
        sharpness: None,
        candidates: candidates.len(),
        rejected_dark: 0,
        rejected_blurry: 0,
        unreadable: 0,
    };

    let mut scores = Vec::with_capacity(candidates.len());
    for candidate in &candidates {
        let image = match image::open(candidate) {
            Ok(image) => image,
            Err(e) => {
                warn!("無法讀取圖片，略過: {} ({e})", candidate.display());
                selection.unreadable += 1;
                scores.push(None);
                continue;
            }
        };

        let verdict = thresholds.judge(&measure(&image));
        match verdict {
            FrameVerdict::TooDark { mean_intensity } => {
                debug!("過暗 {:.2}: {}", mean_intensity, candidate.display());
                selection.rejected_dark += 1;
            }
            FrameVerdict::TooBlurry { sharpness } => {
                debug!("模糊 {:.2}: {}", sharpness, candidate.display());
                selection.rejected_blurry += 1;
            }
            FrameVerdict::Accepted { .. } => {}
        }
        scores.push(verdict.sharpness());
    }

    if let Some(index) = pick_sharpest(&scores) {
        selection.best = Some(candidates[index].clone());
        selection.sharpness = scores[index];
    }

    Ok(selection)
}

/// 整體篩選結果
#[derive(Debug, Clone, Default)]
pub struct FilterSummary {
    pub scenes: usize,
    pub selected: Vec<PathBuf>,
    pub skipped_scenes: Vec<PathBuf>,
}

/// 對 `raw_dir` 下每個場景資料夾挑出最佳畫面，複製到 `output_dir`
///
/// `output_dir` 會先清空。輸出檔名為 `scene_NNNN.<原副檔名>`，
/// NNNN 是場景資料夾排序後的位置。
pub fn filter_best_frames(
    raw_dir: &Path,
    output_dir: &Path,
    thresholds: &QualityThresholds,
) -> Result<FilterSummary> {
    recreate_directory(output_dir)
        .with_context(|| format!("無法建立輸出資料夾: {}", output_dir.display()))?;

    let scene_dirs = list_subdirectories(raw_dir)?;
    let mut summary = FilterSummary {
        scenes: scene_dirs.len(),
        ..FilterSummary::default()
    };

    for (index, scene_dir) in scene_dirs.iter().enumerate() {
        let selection = select_best_frame(scene_dir, thresholds)?;
        let Some(best) = selection.best else {
            info!(
                "場景 {} 沒有合格畫面 (候選 {}，過暗 {}，模糊 {})",
                scene_dir.display(),
                selection.candidates,
                selection.rejected_dark,
                selection.rejected_blurry
            );
            summary.skipped_scenes.push(scene_dir.clone());
            continue;
        };

        let extension = best
            .extension()
            .map_or_else(|| "jpg".to_string(), |e| e.to_string_lossy().to_string());
        let target = output_dir.join(format!("scene_{index:04}.{extension}"));
        fs::copy(&best, &target).with_context(|| {
            format!("無法複製 {} -> {}", best.display(), target.display())
        })?;
        debug!(
            "場景 {index}: {} (清晰度 {:.2})",
            best.display(),
            selection.sharpness.unwrap_or_default()
        );
        summary.selected.push(target);
    }

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn checkerboard(size: u32, low: u8, high: u8) -> RgbImage {
        RgbImage::from_fn(size, size, |x, y| {
            let v = if (x + y) % 2 == 0 { high } else { low };
            Rgb([v, v, v])
        })
    }

    fn gradient(size: u32) -> RgbImage {
        RgbImage::from_fn(size, size, |x, _| {
            let v = (x * 255 / size.max(1)) as u8;
            Rgb([v, v, v])
        })
    }

    #[test]
    fn test_reflect101() {
        assert_eq!(reflect101(-1, 5), 1);
        assert_eq!(reflect101(5, 5), 3);
        assert_eq!(reflect101(2, 5), 2);
        assert_eq!(reflect101(-1, 1), 0);
        assert_eq!(reflect101(1, 1), 0);
    }

    #[test]
    fn test_flat_image_has_zero_variance() {
        let gray = GrayImage::from_pixel(8, 8, Luma([128]));
        assert!(laplacian_variance(&gray).abs() < f64::EPSILON);
    }

    #[test]
    fn test_checkerboard_variance() {
        // 每個像素的響應為 ±4*255，變異數 = (4*255)^2
        let image = DynamicImage::ImageRgb8(checkerboard(8, 0, 255));
        let variance = laplacian_variance(&grayscale(&image));
        assert!((variance - 1_040_400.0).abs() < 1e-6);
    }

    #[test]
    fn test_mean_intensity() {
        let black = DynamicImage::ImageRgb8(RgbImage::new(4, 4));
        assert!(mean_intensity(&black).abs() < f64::EPSILON);

        let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(2, 2, Rgb([30, 60, 90])));
        assert!((mean_intensity(&image) - 60.0).abs() < f64::EPSILON);

        let empty = DynamicImage::ImageRgb8(RgbImage::new(0, 0));
        assert!(mean_intensity(&empty).abs() < f64::EPSILON);
    }

    #[test]
    fn test_black_frame_rejected_as_dark() {
        let thresholds = QualityThresholds::default();
        let metrics = measure(&DynamicImage::ImageRgb8(RgbImage::new(16, 16)));
        assert!(matches!(thresholds.judge(&metrics), FrameVerdict::TooDark { .. }));
    }

    #[test]
    fn test_sharp_but_dark_is_rejected_as_dark() {
        // 平均 9 < 10，即使 Laplacian 變異數很高
        let metrics = measure(&DynamicImage::ImageRgb8(checkerboard(16, 0, 18)));
        assert!(metrics.sharpness > 100.0);
        assert!(matches!(
            QualityThresholds::default().judge(&metrics),
            FrameVerdict::TooDark { .. }
        ));
    }

    #[test]
    fn test_gradient_rejected_as_blurry() {
        let metrics = measure(&DynamicImage::ImageRgb8(gradient(64)));
        assert!(metrics.mean_intensity >= 10.0);
        assert!(matches!(
            QualityThresholds::default().judge(&metrics),
            FrameVerdict::TooBlurry { .. }
        ));
    }

    #[test]
    fn test_checkerboard_accepted() {
        let metrics = measure(&DynamicImage::ImageRgb8(checkerboard(16, 0, 255)));
        assert!(matches!(
            QualityThresholds::default().judge(&metrics),
            FrameVerdict::Accepted { .. }
        ));
    }

    #[test]
    fn test_pick_sharpest_stable() {
        assert_eq!(pick_sharpest(&[Some(5.0), Some(9.0), Some(9.0)]), Some(1));
        assert_eq!(pick_sharpest(&[None, Some(1.0)]), Some(1));
        assert_eq!(pick_sharpest(&[None, None]), None);
        assert_eq!(pick_sharpest(&[]), None);
    }

    #[test]
    fn test_select_best_frame_picks_sharpest() {
        let dir = tempfile::tempdir().unwrap();
        gradient(32).save(dir.path().join("img_00.png")).unwrap();
        checkerboard(32, 40, 200).save(dir.path().join("img_01.png")).unwrap();
        checkerboard(32, 0, 255).save(dir.path().join("img_02.png")).unwrap();
        RgbImage::new(32, 32).save(dir.path().join("img_03.png")).unwrap();

        let selection = select_best_frame(dir.path(), &QualityThresholds::default()).unwrap();
        assert_eq!(selection.candidates, 4);
        assert_eq!(selection.rejected_dark, 1);
        assert_eq!(selection.rejected_blurry, 1);
        assert_eq!(selection.best, Some(dir.path().join("img_02.png")));
    }

    #[test]
    fn test_grayscale_uses_bt601_weights() {
        let pixel = |rgb: [u8; 3]| {
            let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(1, 1, Rgb(rgb)));
            grayscale(&image).get_pixel(0, 0).0[0]
        };
        assert_eq!(pixel([255, 0, 0]), 76);
        assert_eq!(pixel([0, 255, 0]), 150);
        assert_eq!(pixel([0, 0, 255]), 29);
        assert_eq!(pixel([60, 60, 60]), 60);
        assert_eq!(pixel([255, 255, 255]), 255);
    }

    #[test]
    fn test_red_edges_outscore_dim_gray_edges() {
        // 紅黑棋盤灰階為 76/0，變異數 (4*76)^2 = 92416；灰色 60/0 為 (4*60)^2 = 57600
        let dir = tempfile::tempdir().unwrap();
        RgbImage::from_fn(16, 16, |x, y| {
            if (x + y) % 2 == 0 { Rgb([255, 0, 0]) } else { Rgb([0, 0, 0]) }
        })
        .save(dir.path().join("img_00.png"))
        .unwrap();
        checkerboard(16, 0, 60).save(dir.path().join("img_01.png")).unwrap();

        let selection = select_best_frame(dir.path(), &QualityThresholds::default()).unwrap();
        assert_eq!(selection.best, Some(dir.path().join("img_00.png")));
        assert!((selection.sharpness.unwrap() - 92416.0).abs() < 1e-6);
    }

    #[test]
    fn test_select_best_frame_tie_prefers_first_name() {
        let dir = tempfile::tempdir().unwrap();
        checkerboard(16, 0, 255).save(dir.path().join("b.png")).unwrap();
        checkerboard(16, 0, 255).save(dir.path().join("a.png")).unwrap();

        let selection = select_best_frame(dir.path(), &QualityThresholds::default()).unwrap();
        assert_eq!(selection.best, Some(dir.path().join("a.png")));
    }

    #[test]
    fn test_select_best_frame_is_deterministic() {
        let dir = tempfile::tempdir().unwrap();
        checkerboard(16, 20, 220).save(dir.path().join("img_00.png")).unwrap();
        checkerboard(16, 0, 255).save(dir.path().join("img_01.png")).unwrap();

        let thresholds = QualityThresholds::default();
        let first = select_best_frame(dir.path(), &thresholds).unwrap();
        let second = select_best_frame(dir.path(), &thresholds).unwrap();
        assert_eq!(first.best, second.best);
        assert_eq!(first.sharpness, second.sharpness);
    }

    #[test]
    fn test_all_rejected_has_no_best() {
        let dir = tempfile::tempdir().unwrap();
        RgbImage::new(16, 16).save(dir.path().join("img_00.png")).unwrap();
        gradient(16).save(dir.path().join("img_01.png")).unwrap();

        let selection = select_best_frame(dir.path(), &QualityThresholds::default()).unwrap();
        assert!(selection.best.is_none());
    }

    #[test]
    fn test_unreadable_candidate_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("img_00.jpg"), b"not an image").unwrap();
        checkerboard(16, 0, 255).save(dir.path().join("img_01.png")).unwrap();

        let selection = select_best_frame(dir.path(), &QualityThresholds::default()).unwrap();
        assert_eq!(selection.unreadable, 1);
        assert_eq!(selection.best, Some(dir.path().join("img_01.png")));
    }

    #[test]
    fn test_filter_best_frames_names_by_scene_position() {
        let dir = tempfile::tempdir().unwrap();
        let raw = dir.path().join("raw_frames");
        let out = dir.path().join("clear_scenes");

        for scene in ["scene_0000", "scene_0001", "scene_0002"] {
            fs::create_dir_all(raw.join(scene)).unwrap();
        }
        checkerboard(16, 0, 255).save(raw.join("scene_0000/img_00.png")).unwrap();
        RgbImage::new(16, 16).save(raw.join("scene_0001/img_00.png")).unwrap();
        checkerboard(16, 0, 255).save(raw.join("scene_0002/img_00.png")).unwrap();

        fs::create_dir_all(&out).unwrap();
        fs::write(out.join("stale.jpg"), b"old").unwrap();

        let summary = filter_best_frames(&raw, &out, &QualityThresholds::default()).unwrap();
        assert_eq!(summary.scenes, 3);
        assert_eq!(summary.selected.len(), 2);
        assert_eq!(summary.skipped_scenes.len(), 1);
        assert!(out.join("scene_0000.png").exists());
        assert!(!out.join("scene_0001.png").exists());
        assert!(out.join("scene_0002.png").exists());
        assert!(!out.join("stale.jpg").exists());
    }
}
