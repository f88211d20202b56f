use super::image_sequence::{ordered_sequence, pick_random_sequence, required_image_count};
use super::renderer::{apply_overlay, render_slideshow};
use crate::config::{Config, ImageOrder, MAX_SLIDESHOW_IMAGES, SlideshowSettings};
use crate::signal::check_shutdown;
use crate::tools::{
    ConcatManifest, DurationProbe, FfprobeDurationProbe, TempWorkspace, ensure_parent_exists,
    list_images, loop_music_under, validate_directory_exists, validate_file_exists,
};
use anyhow::{Context, Result, bail, ensure};
use console::style;
use dialoguer::Input;
use log::info;
use rand::Rng;
use std::path::{self, PathBuf};
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

pub const MANIFEST_FILE: &str = "images.txt";

#[derive(Debug)]
pub struct SlideshowResult {
    pub images_available: usize,
    pub manifest_entries: usize,
    pub output: PathBuf,
    pub overlay_output: Option<PathBuf>,
}

/// 依設定建立 concat 清單
///
/// - `Random`: 抽取 `ceil(T / D)` 張（可重複）
/// - `Sorted`: 每張一次並重複最後一張
pub fn build_manifest<R: Rng + ?Sized>(
    images: &[PathBuf],
    settings: &SlideshowSettings,
    rng: &mut R,
) -> Result<ConcatManifest> {
    let sequence = match settings.order {
        ImageOrder::Random => {
            let count = required_image_count(settings.total_duration, settings.image_duration);
            ensure!(
                count <= MAX_SLIDESHOW_IMAGES,
                "投影片需要 {count} 張圖片，超過上限 {MAX_SLIDESHOW_IMAGES}"
            );
            pick_random_sequence(images, count, rng)?
        }
        ImageOrder::Sorted => ordered_sequence(images, settings.expected_image_count)?,
    };

    Ok(
        ConcatManifest::with_uniform_duration(&sequence, settings.image_duration)
            .repeat_last_entry(settings.order == ImageOrder::Sorted),
    )
}

/// 投影片產生器
///
/// 圖片清單 -> 無聲影片 -> 循環背景音樂 -> (可選) 綠幕疊加
pub struct SlideshowBuilder {
    config: Config,
    shutdown_signal: Arc<AtomicBool>,
}

impl SlideshowBuilder {
    pub const fn new(config: Config, shutdown_signal: Arc<AtomicBool>) -> Self {
        Self {
            config,
            shutdown_signal,
        }
    }

    pub fn run(&self) -> Result<()> {
        println!("{}", style("=== 圖片投影片產生 ===").cyan().bold());

        let defaults = &self.config.settings.slideshow;
        let image_dir: String = Input::new()
            .with_prompt("請輸入圖片資料夾")
            .default(defaults.image_dir.display().to_string())
            .interact_text()?;
        let output: String = Input::new()
            .with_prompt("請輸入輸出影片路徑")
            .default(defaults.output.display().to_string())
            .interact_text()?;

        let settings = SlideshowSettings {
            image_dir: PathBuf::from(image_dir.trim()),
            output: PathBuf::from(output.trim()),
            ..defaults.clone()
        };
        settings.validate()?;

        let result = self.build(&settings, &mut rand::rng())?;

        println!();
        println!(
            "{} 投影片已建立: {} ({} 張圖片，清單 {} 項)",
            style("✓").green(),
            result.output.display(),
            result.images_available,
            result.manifest_entries
        );
        if let Some(overlay) = &result.overlay_output {
            println!("{} 綠幕疊加完成: {}", style("✓").green(), overlay.display());
        }
        Ok(())
    }

    pub fn build<R: Rng + ?Sized>(
        &self,
        settings: &SlideshowSettings,
        rng: &mut R,
    ) -> Result<SlideshowResult> {
        validate_directory_exists(&settings.image_dir)?;
        if let Some(music) = &settings.music {
            validate_file_exists(music)?;
        }
        if let Some(overlay) = &settings.overlay {
            validate_file_exists(&overlay.video)?;
        }
        ensure_parent_exists(&settings.output)?;

        // concat 清單中的相對路徑以清單所在位置為基準
        let image_dir = path::absolute(&settings.image_dir)
            .with_context(|| format!("無法解析路徑: {}", settings.image_dir.display()))?;
        let images = list_images(&image_dir)?;
        if images.is_empty() {
            bail!("資料夾中找不到圖片: {}", settings.image_dir.display());
        }

        let manifest = build_manifest(&images, settings, rng)?;
        info!(
            "投影片: {} 張可用圖片，清單 {} 項，每張 {}s",
            images.len(),
            manifest.len(),
            settings.image_duration
        );

        let mut workspace = TempWorkspace::create(&self.config.settings.work_dir, "slideshow")?;
        workspace.keep_on_drop(self.config.settings.keep_intermediates);

        let manifest_path = workspace.path(MANIFEST_FILE);
        manifest.write_to(&manifest_path)?;

        let max_duration = match (settings.order, &settings.music) {
            (ImageOrder::Sorted, None) => Some(settings.total_duration),
            _ => None,
        };

        match &settings.music {
            Some(music) => {
                let silent = workspace.path("temp_video.mp4");
                render_slideshow(&manifest_path, settings.effect, max_duration, &silent)?;
                check_shutdown(&self.shutdown_signal, "產生投影片")?;
                loop_music_under(&silent, music, &settings.output)?;
            }
            None => {
                render_slideshow(&manifest_path, settings.effect, max_duration, &settings.output)?;
            }
        }

        let overlay_output = match &settings.overlay {
            Some(overlay) => {
                check_shutdown(&self.shutdown_signal, "產生投影片")?;
                let duration = FfprobeDurationProbe
                    .duration_seconds(&settings.output)
                    .with_context(|| format!("無法取得影片長度: {}", settings.output.display()))?;
                apply_overlay(&settings.output, overlay, duration, &overlay.output)?;
                Some(overlay.output.clone())
            }
            None => None,
        };

        Ok(SlideshowResult {
            images_available: images.len(),
            manifest_entries: manifest.len(),
            output: settings.output.clone(),
            overlay_output,
        })
    }
}
