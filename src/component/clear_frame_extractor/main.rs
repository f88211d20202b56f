use super::frame_sampler::{FrameSamplerConfig, sample_frames};
use super::frame_scorer::{FilterSummary, QualityThresholds, filter_best_frames};
use super::scene_detector::{SceneDetection, detect_scenes, read_timestamps, write_timestamps};
use crate::config::{Config, FrameExtractionSettings};
use crate::tools::{TempWorkspace, format_clock, get_video_info, validate_file_exists};
use anyhow::{Context, Result};
use console::style;
use dialoguer::Input;
use log::info;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

pub const TIMESTAMPS_FILE: &str = "scene_timestamps.txt";
pub const RAW_FRAMES_DIR: &str = "raw_frames";

/// 擷取結果
#[derive(Debug)]
pub struct ExtractionResult {
    pub scenes: usize,
    pub scene_detection_available: bool,
    pub frames_extracted: usize,
    pub frames_missing: usize,
    pub filter: FilterSummary,
}

/// 清晰場景畫面擷取器
///
/// 四階段流程：
/// A. 場景變換偵測，時間點寫入 `scene_timestamps.txt`
/// B. 每個場景擷取多張候選畫面
/// C. 依亮度與 Laplacian 變異數評分
/// D. 每個場景輸出最清晰的一張
pub struct ClearFrameExtractor {
    config: Config,
    shutdown_signal: Arc<AtomicBool>,
}

impl ClearFrameExtractor {
    pub const fn new(config: Config, shutdown_signal: Arc<AtomicBool>) -> Self {
        Self {
            config,
            shutdown_signal,
        }
    }

    pub fn run(&self) -> Result<()> {
        println!("{}", style("=== 清晰場景畫面擷取 ===").cyan().bold());

        let defaults = &self.config.settings.frame_extraction;
        let input: String = Input::new()
            .with_prompt("請輸入影片路徑")
            .default(defaults.input_video.display().to_string())
            .interact_text()?;
        let output: String = Input::new()
            .with_prompt("請輸入輸出資料夾")
            .default(defaults.output_dir.display().to_string())
            .interact_text()?;

        let settings = FrameExtractionSettings {
            input_video: PathBuf::from(input.trim()),
            output_dir: PathBuf::from(output.trim()),
            ..defaults.clone()
        };
        settings.validate()?;

        let result = self.extract(&settings)?;
        self.print_summary(&settings.output_dir, &result);
        Ok(())
    }

    /// 執行完整流程，中間檔放在暫存工作區
    pub fn extract(&self, settings: &FrameExtractionSettings) -> Result<ExtractionResult> {
        let video = &settings.input_video;
        validate_file_exists(video)?;

        let (media, stream) = get_video_info(video)
            .with_context(|| format!("無法讀取影片資訊: {}", video.display()))?;
        info!(
            "影片 {}: {} ({}x{}, {:.2} fps)",
            video.display(),
            format_clock(media.duration_seconds),
            stream.width,
            stream.height,
            stream.frame_rate
        );

        let mut workspace =
            TempWorkspace::create(&self.config.settings.work_dir, "clear_frames")?;
        workspace.keep_on_drop(self.config.settings.keep_intermediates);

        // Stage A
        println!("  {} 偵測場景變換...", style("A").dim());
        let detection = detect_scenes(video, settings.scene_threshold);
        if let SceneDetection::Unavailable { reason } = &detection {
            println!("  {} 場景偵測失敗，以零個場景繼續: {reason}", style("!").yellow());
        }
        let timestamps_file = workspace.path(TIMESTAMPS_FILE);
        write_timestamps(&timestamps_file, &detection.timestamps())?;
        let timestamps = read_timestamps(&timestamps_file)?;
        println!("      找到 {} 個場景變換點", timestamps.len());

        // Stage B
        println!("  {} 擷取候選畫面...", style("B").dim());
        let raw_dir = workspace.path(RAW_FRAMES_DIR);
        let report = sample_frames(
            video,
            &timestamps,
            &raw_dir,
            &FrameSamplerConfig::from(settings),
            &self.shutdown_signal,
        )?;

        // Stage C + D
        println!("  {} 評分並挑選最清晰畫面...", style("C").dim());
        let filter = filter_best_frames(
            &raw_dir,
            &settings.output_dir,
            &QualityThresholds::from(settings),
        )?;

        info!(
            "清晰畫面擷取完成: {} 個場景，輸出 {} 張",
            timestamps.len(),
            filter.selected.len()
        );

        Ok(ExtractionResult {
            scenes: timestamps.len(),
            scene_detection_available: !detection.is_unavailable(),
            frames_extracted: report.extracted,
            frames_missing: report.missing.len(),
            filter,
        })
    }

    fn print_summary(&self, output_dir: &Path, result: &ExtractionResult) {
        println!();
        println!("{}", style("=== 擷取摘要 ===").cyan().bold());
        println!("  場景: {} 個", result.scenes);
        println!("  候選畫面: {} 張", result.frames_extracted);
        if result.frames_missing > 0 {
            println!("  未能擷取: {} 張", style(result.frames_missing).yellow());
        }
        println!(
            "  輸出: {} 張 -> {}",
            style(result.filter.selected.len()).green(),
            output_dir.display()
        );
        if !result.filter.skipped_scenes.is_empty() {
            println!(
                "  無合格畫面的場景: {} 個",
                style(result.filter.skipped_scenes.len()).yellow()
            );
        }
    }
}
