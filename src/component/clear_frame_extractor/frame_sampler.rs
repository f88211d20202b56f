use crate::config::FrameExtractionSettings;
use crate::tools::{FfmpegCommand, create_progress_bar, recreate_directory};
use anyhow::{Context, Result, bail};
use log::{debug, warn};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// 取樣設定
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameSamplerConfig {
    pub samples_per_scene: usize,
    /// 相鄰兩張之間的秒數
    pub spacing: f64,
    /// 輸出寬度，高度依比例
    pub width: u32,
    pub jpeg_quality: u8,
}

impl Default for FrameSamplerConfig {
    fn default() -> Self {
        Self::from(&FrameExtractionSettings::default())
    }
}

impl From<&FrameExtractionSettings> for FrameSamplerConfig {
    fn from(settings: &FrameExtractionSettings) -> Self {
        Self {
            samples_per_scene: settings.samples_per_scene,
            spacing: settings.sample_spacing,
            width: settings.frame_width,
            jpeg_quality: settings.jpeg_quality,
        }
    }
}

/// 單張擷取任務
#[derive(Debug, Clone, PartialEq)]
pub struct FrameTask {
    pub scene_index: usize,
    pub slot: usize,
    pub timestamp: f64,
    pub output_path: PathBuf,
}

/// 沒有產生的畫面
#[derive(Debug, Clone)]
pub struct MissingFrame {
    pub scene_index: usize,
    pub slot: usize,
    pub reason: String,
}

/// 取樣結果：個別畫面擷取失敗是可容忍的缺口，列在 `missing`
#[derive(Debug, Clone, Default)]
#[must_use]
pub struct SamplingReport {
    pub scene_dirs: Vec<PathBuf>,
    pub extracted: usize,
    pub missing: Vec<MissingFrame>,
}

impl SamplingReport {
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty()
    }
}

#[must_use]
pub fn scene_dir_name(scene_index: usize) -> String {
    format!("scene_{scene_index:04}")
}

/// 建立每個場景的擷取任務：`scene_NNNN/img_NN.jpg`
#[must_use]
pub fn plan_frame_tasks(
    timestamps: &[f64],
    config: &FrameSamplerConfig,
    raw_dir: &Path,
) -> Vec<FrameTask> {
    timestamps
        .iter()
        .enumerate()
        .flat_map(|(scene_index, &timestamp)| {
            let scene_dir = raw_dir.join(scene_dir_name(scene_index));
            (0..config.samples_per_scene).map(move |slot| FrameTask {
                scene_index,
                slot,
                timestamp: timestamp + slot as f64 * config.spacing,
                output_path: scene_dir.join(format!("img_{slot:02}.jpg")),
            })
        })
        .collect()
}

/// 擷取單張畫面的命令（`-ss` 放在 `-i` 前做快速 seek）
#[must_use]
pub fn frame_command(video: &Path, task: &FrameTask, config: &FrameSamplerConfig) -> FfmpegCommand {
    FfmpegCommand::ffmpeg()
        .loglevel("error")
        .args(["-ss", &format!("{:.3}", task.timestamp)])
        .input(video)
        .args(["-frames:v", "1"])
        .args(["-q:v", &config.jpeg_quality.to_string()])
        .args(["-vf", &format!("scale={}:-1", config.width)])
        .arg(&task.output_path)
}

/// 清空 `raw_dir` 後，為每個時間點擷取多張畫面
pub fn sample_frames(
    video: &Path,
    timestamps: &[f64],
    raw_dir: &Path,
    config: &FrameSamplerConfig,
    shutdown_signal: &Arc<AtomicBool>,
) -> Result<SamplingReport> {
    recreate_directory(raw_dir)
        .with_context(|| format!("無法建立畫面資料夾: {}", raw_dir.display()))?;

    let mut report = SamplingReport::default();
    for scene_index in 0..timestamps.len() {
        let scene_dir = raw_dir.join(scene_dir_name(scene_index));
        fs::create_dir_all(&scene_dir)
            .with_context(|| format!("無法建立場景資料夾: {}", scene_dir.display()))?;
        report.scene_dirs.push(scene_dir);
    }

    let tasks = plan_frame_tasks(timestamps, config, raw_dir);
    if tasks.is_empty() {
        return Ok(report);
    }

    let progress_bar = create_progress_bar(tasks.len() as u64, "擷取畫面中...");

    for task in &tasks {
        if shutdown_signal.load(Ordering::SeqCst) {
            progress_bar.abandon_with_message("操作已中斷");
            bail!("收到中斷信號，停止擷取畫面");
        }

        let result = frame_command(video, task, config).run();
        match result {
            Ok(_) if task.output_path.exists() => report.extracted += 1,
            Ok(_) => report.missing.push(MissingFrame {
                scene_index: task.scene_index,
                slot: task.slot,
                reason: "ffmpeg 沒有輸出畫面".to_string(),
            }),
            Err(e) => {
                debug!(
                    "畫面擷取失敗 [{}:{}] {:.3}s: {e}",
                    task.scene_index, task.slot, task.timestamp
                );
                report.missing.push(MissingFrame {
                    scene_index: task.scene_index,
                    slot: task.slot,
                    reason: e.to_string(),
                });
            }
        }
        progress_bar.inc(1);
    }

    progress_bar.finish_with_message("完成");

    if !report.is_complete() {
        warn!(
            "{} 張畫面未能擷取（通常是時間點超過影片結尾）",
            report.missing.len()
        );
    }

    Ok(report)
}
