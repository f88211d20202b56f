use crate::config::{OverlaySettings, SlideshowEffect};
use crate::tools::FfmpegCommand;
use anyhow::{Context, Result};
use log::info;
use std::path::Path;

/// 各畫面效果對應的 `-vf` 濾鏡
#[must_use]
pub const fn effect_filter(effect: SlideshowEffect) -> &'static str {
    match effect {
        SlideshowEffect::ZoomPan => {
            "zoompan=z='zoom+0.001':d=300:x='iw/2-(iw/zoom/2)':y='ih/2-(ih/zoom/2)',fps=30"
        }
        SlideshowEffect::Plain => "format=yuv420p",
        SlideshowEffect::Scaled => "scale=1280:720,fps=25",
    }
}

/// 以 concat 清單產生無聲投影片
///
/// `max_duration` 有值時以 `-t` 截斷輸出長度。
#[must_use]
pub fn render_command(
    manifest: &Path,
    effect: SlideshowEffect,
    max_duration: Option<f64>,
    output: &Path,
) -> FfmpegCommand {
    let mut command = FfmpegCommand::ffmpeg()
        .loglevel("error")
        .args(["-f", "concat", "-safe", "0"])
        .input(manifest)
        .args(["-vf", effect_filter(effect)])
        .args(["-c:v", "libx264", "-pix_fmt", "yuv420p"]);
    if let Some(duration) = max_duration {
        command = command.args(["-t", &duration.to_string()]);
    }
    command.arg(output)
}

pub fn render_slideshow(
    manifest: &Path,
    effect: SlideshowEffect,
    max_duration: Option<f64>,
    output: &Path,
) -> Result<()> {
    info!("產生投影片 ({effect}): {}", output.display());
    render_command(manifest, effect, max_duration, output)
        .run()
        .with_context(|| format!("產生投影片失敗: {}", output.display()))?;
    Ok(())
}

/// 綠幕去背濾鏡：縮放循環影片、轉為含 alpha 的格式後去除指定顏色
#[must_use]
pub fn chroma_key_filter(settings: &OverlaySettings) -> String {
    format!(
        "[1:v]scale=1280:720,fps=25,format=yuva420p,colorkey={}:{}:{}[overlay];[0:v][overlay]overlay=shortest=1",
        settings.key_color, settings.similarity, settings.blend
    )
}

/// 將循環的綠幕影片疊加在投影片上，長度固定為 `duration`
#[must_use]
pub fn overlay_command(
    base: &Path,
    settings: &OverlaySettings,
    duration: f64,
    output: &Path,
) -> FfmpegCommand {
    FfmpegCommand::ffmpeg()
        .loglevel("error")
        .input(base)
        .args(["-stream_loop", "-1"])
        .input(&settings.video)
        .args(["-filter_complex", &chroma_key_filter(settings)])
        .args(["-c:v", "libx264", "-preset", "fast", "-crf", "23"])
        .args(["-pix_fmt", "yuv420p"])
        .args(["-t", &duration.to_string()])
        .args(["-movflags", "+faststart"])
        .arg(output)
}

pub fn apply_overlay(
    base: &Path,
    settings: &OverlaySettings,
    duration: f64,
    output: &Path,
) -> Result<()> {
    info!(
        "疊加綠幕影片 {} ({:.2}s): {}",
        settings.video.display(),
        duration,
        output.display()
    );
    overlay_command(base, settings, duration, output)
        .run()
        .with_context(|| format!("疊加綠幕影片失敗: {}", output.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn joined(cmd: &FfmpegCommand) -> String {
        cmd.arguments()
            .iter()
            .map(|a| a.to_string_lossy().to_string())
            .collect::<Vec<_>>()
            .join(" ")
    }

    #[test]
    fn test_render_command_zoompan() {
        let cmd = render_command(
            Path::new("images.txt"),
            SlideshowEffect::ZoomPan,
            None,
            Path::new("temp_video.mp4"),
        );
        let args = joined(&cmd);
        assert!(args.contains("-f concat -safe 0 -i images.txt"));
        assert!(args.contains("zoompan=z='zoom+0.001':d=300"));
        assert!(args.contains("-c:v libx264 -pix_fmt yuv420p"));
        assert!(!args.contains(" -t "));
        assert!(args.ends_with("temp_video.mp4"));
    }

    #[test]
    fn test_render_command_with_limit() {
        let cmd = render_command(
            Path::new("list.txt"),
            SlideshowEffect::Plain,
            Some(8100.0),
            Path::new("loading.mp4"),
        );
        let args = joined(&cmd);
        assert!(args.contains("-vf format=yuv420p"));
        assert!(args.contains("-t 8100 loading.mp4"));
    }

    #[test]
    fn test_chroma_key_filter() {
        let filter = chroma_key_filter(&OverlaySettings::default());
        assert_eq!(
            filter,
            "[1:v]scale=1280:720,fps=25,format=yuva420p,colorkey=0x41CE43:0.3:0.2[overlay];[0:v][overlay]overlay=shortest=1"
        );
    }

    #[test]
    fn test_overlay_command_loops_second_input() {
        let settings = OverlaySettings {
            video: PathBuf::from("complete.mp4"),
            ..OverlaySettings::default()
        };
        let args = joined(&overlay_command(
            Path::new("promotion.mp4"),
            &settings,
            90.5,
            Path::new("overlay.mp4"),
        ));
        assert!(args.contains("-i promotion.mp4 -stream_loop -1 -i complete.mp4"));
        assert!(args.contains("-t 90.5"));
        assert!(args.contains("-movflags +faststart"));
    }
}
