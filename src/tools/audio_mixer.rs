//! 背景音樂處理
//!
//! - 循環背景音樂並裁切到影片長度（投影片）
//! - 依音量權重混音，或直接取代音軌（預告片）
//! - 從指定秒數開始裁切音樂

use crate::tools::ffmpeg_command::FfmpegCommand;
use anyhow::{Context, Result};
use log::info;
use std::path::Path;

/// 混音時原始音軌與背景音樂的音量
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MixLevels {
    pub source_volume: f64,
    pub music_volume: f64,
}

impl Default for MixLevels {
    fn default() -> Self {
        Self {
            source_volume: 0.08,
            music_volume: 1.0,
        }
    }
}

impl MixLevels {
    #[must_use]
    pub fn filter_graph(&self) -> String {
        format!(
            "[0:a]volume={}[a1];[1:a]volume={}[a2];[a1][a2]amix=inputs=2:duration=shortest[aout]",
            self.source_volume, self.music_volume
        )
    }
}

/// 循環背景音樂並與無聲影片合併，長度以較短者為準
#[must_use]
pub fn loop_music_command(video: &Path, music: &Path, output: &Path) -> FfmpegCommand {
    FfmpegCommand::ffmpeg()
        .loglevel("error")
        .args(["-stream_loop", "-1"])
        .input(music)
        .input(video)
        .args(["-map", "1:v:0", "-map", "0:a:0", "-shortest"])
        .args(["-c:v", "copy", "-c:a", "aac", "-b:a", "192k"])
        .arg(output)
}

pub fn loop_music_under(video: &Path, music: &Path, output: &Path) -> Result<()> {
    loop_music_command(video, music, output)
        .run()
        .with_context(|| format!("加入背景音樂失敗: {}", output.display()))?;
    info!("已加入循環背景音樂: {}", output.display());
    Ok(())
}

/// 原始音軌與背景音樂依權重混音
#[must_use]
pub fn mix_music_command(
    video: &Path,
    music: &Path,
    output: &Path,
    levels: MixLevels,
) -> FfmpegCommand {
    FfmpegCommand::ffmpeg()
        .loglevel("error")
        .input(video)
        .input(music)
        .args(["-filter_complex", &levels.filter_graph()])
        .args(["-map", "0:v", "-map", "[aout]"])
        .args(["-c:v", "copy", "-c:a", "aac", "-shortest"])
        .arg(output)
}

/// 以背景音樂取代音軌（影片本身沒有音訊時使用）
#[must_use]
pub fn replace_audio_command(video: &Path, music: &Path, output: &Path) -> FfmpegCommand {
    FfmpegCommand::ffmpeg()
        .loglevel("error")
        .input(video)
        .input(music)
        .args(["-map", "0:v:0", "-map", "1:a:0"])
        .args(["-c:v", "copy", "-c:a", "aac", "-shortest"])
        .arg(output)
}

/// 加入背景音樂：影片有音軌時混音，否則直接取代
pub fn add_background_music(
    video: &Path,
    music: &Path,
    output: &Path,
    video_has_audio: bool,
    levels: MixLevels,
) -> Result<()> {
    let command = if video_has_audio {
        info!("偵測到原始音軌，與背景音樂混音");
        mix_music_command(video, music, output, levels)
    } else {
        info!("沒有原始音軌，僅使用背景音樂");
        replace_audio_command(video, music, output)
    };

    command
        .run()
        .with_context(|| format!("加入背景音樂失敗: {}", output.display()))?;
    Ok(())
}

/// 從 `start` 秒開始裁切音樂（不重新編碼）
pub fn trim_music_start(music: &Path, start: f64, output: &Path) -> Result<()> {
    FfmpegCommand::ffmpeg()
        .loglevel("error")
        .args(["-ss", &start.to_string()])
        .input(music)
        .args(["-c", "copy"])
        .arg(output)
        .run()
        .with_context(|| format!("裁切背景音樂失敗: {}", music.display()))?;
    Ok(())
}
