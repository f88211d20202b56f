use crate::tools::{ConcatManifest, FfmpegCommand, TempWorkspace};
use anyhow::{Context, Result};
use log::{debug, info};
use std::path::{Path, PathBuf};

/// 片頭圖片的渲染與顯示秒數
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntroTiming {
    pub render_seconds: f64,
    pub display_seconds: f64,
}

impl Default for IntroTiming {
    fn default() -> Self {
        Self {
            render_seconds: 3.0,
            display_seconds: 2.0,
        }
    }
}

/// 靜態圖片轉為 1280x720 影片
#[must_use]
pub fn image_clip_command(image: &Path, seconds: f64, output: &Path) -> FfmpegCommand {
    FfmpegCommand::ffmpeg()
        .loglevel("error")
        .args(["-loop", "1"])
        .input(image)
        .args(["-t", &seconds.to_string()])
        .args(["-vf", "scale=1280:720"])
        .args(["-c:v", "libx264", "-pix_fmt", "yuv420p"])
        .arg(output)
}

/// 以 concat demuxer 串接，不重新編碼
#[must_use]
pub fn stream_copy_concat_command(manifest: &Path, output: &Path) -> FfmpegCommand {
    FfmpegCommand::ffmpeg()
        .loglevel("error")
        .args(["-f", "concat", "-safe", "0"])
        .input(manifest)
        .args(["-c", "copy"])
        .arg(output)
}

/// 每張圖片各自產生短片，再串接為 `intro.mp4`
pub fn build_intro(
    images: &[PathBuf],
    timing: IntroTiming,
    workspace: &TempWorkspace,
) -> Result<PathBuf> {
    let mut manifest = ConcatManifest::new();

    for (index, image) in images.iter().enumerate() {
        let clip = workspace.path(&format!("intro_{index:02}.mp4"));
        image_clip_command(image, timing.render_seconds, &clip)
            .run()
            .with_context(|| format!("片頭圖片轉檔失敗: {}", image.display()))?;
        debug!("片頭圖片: {} -> {}", image.display(), clip.display());
        manifest.push(clip, Some(timing.display_seconds));
    }

    let manifest_path = workspace.path("image_list.txt");
    manifest.write_to(&manifest_path)?;

    let intro = workspace.path("intro.mp4");
    stream_copy_concat_command(&manifest_path, &intro)
        .run()
        .context("片頭串接失敗")?;
    info!("片頭已建立: {} 張圖片", images.len());
    Ok(intro)
}
