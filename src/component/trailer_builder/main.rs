use super::intro::{IntroTiming, build_intro, stream_copy_concat_command};
use super::slot_sampler::pick_clip_starts;
use crate::config::{Config, TrailerSettings};
use crate::signal::check_shutdown;
use crate::tools::{
    ConcatManifest, DurationProbe, FfmpegCommand, FfprobeDurationProbe, MixLevels, TempWorkspace,
    add_background_music, create_progress_bar, ensure_parent_exists, has_audio_stream,
    trim_music_start, validate_file_exists, validate_files_exist,
};
use anyhow::{Context, Result, bail};
use console::style;
use dialoguer::Input;
use log::info;
use rand::Rng;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Debug)]
pub struct TrailerResult {
    pub video_seconds: u64,
    pub clip_starts: Vec<u64>,
    pub with_intro: bool,
    pub output: PathBuf,
}

/// 擷取單一片段（重新編碼確保每段都從關鍵幀開始）
#[must_use]
pub fn clip_command(source: &Path, start: u64, seconds: u64, output: &Path) -> FfmpegCommand {
    FfmpegCommand::ffmpeg()
        .loglevel("error")
        .args(["-ss", &start.to_string()])
        .args(["-t", &seconds.to_string()])
        .input(source)
        .args(["-c:v", "libx264", "-c:a", "aac"])
        .arg(output)
}

#[must_use]
pub fn clips_concat_command(manifest: &Path, output: &Path) -> FfmpegCommand {
    FfmpegCommand::ffmpeg()
        .loglevel("error")
        .args(["-f", "concat", "-safe", "0"])
        .input(manifest)
        .args(["-vsync", "vfr", "-pix_fmt", "yuv420p"])
        .arg(output)
}

/// 鏡像與放慢的濾鏡，兩者皆未設定時回傳 None
#[must_use]
pub fn finishing_filter(mirror: bool, slow_factor: Option<f64>) -> Option<String> {
    let mut filters = Vec::new();
    if mirror {
        filters.push("hflip".to_string());
    }
    if let Some(factor) = slow_factor {
        filters.push(format!("setpts={factor}*PTS"));
    }
    if filters.is_empty() {
        None
    } else {
        Some(filters.join(","))
    }
}

#[must_use]
pub fn finishing_command(input: &Path, filter: &str, output: &Path) -> FfmpegCommand {
    FfmpegCommand::ffmpeg()
        .loglevel("error")
        .input(input)
        .args(["-vf", filter])
        .args(["-c:a", "copy"])
        .arg(output)
}

/// 隨機預告片產生器
///
/// 取得長度 -> 抽取片段起點 -> 擷取並串接 -> (可選) 片頭 -> 背景音樂 -> (可選) 鏡像/放慢
pub struct TrailerBuilder<P: DurationProbe = FfprobeDurationProbe> {
    config: Config,
    shutdown_signal: Arc<AtomicBool>,
    probe: P,
}

impl TrailerBuilder {
    pub const fn new(config: Config, shutdown_signal: Arc<AtomicBool>) -> Self {
        Self::with_probe(config, shutdown_signal, FfprobeDurationProbe)
    }
}

impl<P: DurationProbe> TrailerBuilder<P> {
    pub const fn with_probe(config: Config, shutdown_signal: Arc<AtomicBool>, probe: P) -> Self {
        Self {
            config,
            shutdown_signal,
            probe,
        }
    }

    pub fn run(&self) -> Result<()> {
        println!("{}", style("=== 隨機預告片產生 ===").cyan().bold());

        let defaults = &self.config.settings.trailer;
        let input: String = Input::new()
            .with_prompt("請輸入來源影片路徑")
            .default(defaults.input_video.display().to_string())
            .interact_text()?;
        let output: String = Input::new()
            .with_prompt("請輸入輸出影片路徑")
            .default(defaults.output.display().to_string())
            .interact_text()?;

        let settings = TrailerSettings {
            input_video: PathBuf::from(input.trim()),
            output: PathBuf::from(output.trim()),
            ..defaults.clone()
        };
        settings.validate()?;

        let result = self.build(&settings, &mut rand::rng())?;

        println!();
        println!(
            "{} 預告片已建立: {} ({} 個片段{})",
            style("✓").green(),
            result.output.display(),
            result.clip_starts.len(),
            if result.with_intro { "，含片頭" } else { "" }
        );
        Ok(())
    }

    /// 抽取片段起點；影片長度取整數秒，不足時在擷取前失敗
    pub fn plan<R: Rng + ?Sized>(
        &self,
        settings: &TrailerSettings,
        rng: &mut R,
    ) -> Result<(u64, Vec<u64>)> {
        let duration = self
            .probe
            .duration_seconds(&settings.input_video)
            .with_context(|| format!("無法取得影片長度: {}", settings.input_video.display()))?;
        let video_seconds = duration.max(0.0).trunc() as u64;
        info!("影片長度: {video_seconds} 秒");

        let starts = pick_clip_starts(
            video_seconds,
            u64::from(settings.clip_duration),
            settings.clip_count() as usize,
            rng,
        )?;
        Ok((video_seconds, starts))
    }

    pub fn build<R: Rng + ?Sized>(
        &self,
        settings: &TrailerSettings,
        rng: &mut R,
    ) -> Result<TrailerResult> {
        validate_file_exists(&settings.input_video)?;
        validate_file_exists(&settings.music)?;
        validate_files_exist(&settings.intro_images)?;
        ensure_parent_exists(&settings.output)?;

        let (video_seconds, starts) = self.plan(settings, rng)?;

        let mut workspace = TempWorkspace::create(&self.config.settings.work_dir, "trailer")?;
        workspace.keep_on_drop(self.config.settings.keep_intermediates);

        let clip_seconds = u64::from(settings.clip_duration);
        let clips = self.extract_clips(settings, &starts, clip_seconds, &workspace)?;

        let manifest_path = workspace.path("clip_list.txt");
        ConcatManifest::with_uniform_duration(&clips, f64::from(settings.clip_duration))
            .write_to(&manifest_path)?;
        let clips_video = workspace.path("temp1_video.mp4");
        clips_concat_command(&manifest_path, &clips_video)
            .run()
            .context("片段串接失敗")?;
        check_shutdown(&self.shutdown_signal, "產生預告片")?;

        let with_intro = !settings.intro_images.is_empty();
        let full_video = if with_intro {
            let timing = IntroTiming {
                render_seconds: settings.intro_render_duration,
                display_seconds: settings.intro_display_duration,
            };
            let images = settings
                .intro_images
                .iter()
                .map(std::path::absolute)
                .collect::<std::io::Result<Vec<_>>>()
                .context("無法解析片頭圖片路徑")?;
            let intro = build_intro(&images, timing, &workspace)?;

            let final_list = workspace.path("final_list.txt");
            ConcatManifest::from_files(&[intro, clips_video]).write_to(&final_list)?;
            let full = workspace.path("temp2_full_video.mp4");
            stream_copy_concat_command(&final_list, &full)
                .run()
                .context("片頭與片段串接失敗")?;
            full
        } else {
            clips_video
        };
        check_shutdown(&self.shutdown_signal, "產生預告片")?;

        let music = if settings.music_start_offset > 0.0 {
            let extension = settings
                .music
                .extension()
                .map_or_else(|| "mp3".to_string(), |e| e.to_string_lossy().to_string());
            let trimmed = workspace.path(&format!("trimmed_music.{extension}"));
            trim_music_start(&settings.music, settings.music_start_offset, &trimmed)?;
            trimmed
        } else {
            settings.music.clone()
        };

        let levels = MixLevels {
            source_volume: settings.source_volume,
            music_volume: settings.music_volume,
        };
        let video_has_audio = has_audio_stream(&full_video)?;

        match finishing_filter(settings.mirror, settings.slow_factor) {
            Some(filter) => {
                let mixed = workspace.path("audio_video_mix.mp4");
                add_background_music(&full_video, &music, &mixed, video_has_audio, levels)?;
                check_shutdown(&self.shutdown_signal, "產生預告片")?;
                info!("套用最終濾鏡: {filter}");
                finishing_command(&mixed, &filter, &settings.output)
                    .run()
                    .context("鏡像/放慢處理失敗")?;
            }
            None => {
                add_background_music(&full_video, &music, &settings.output, video_has_audio, levels)?;
            }
        }

        info!("預告片已建立: {}", settings.output.display());

        Ok(TrailerResult {
            video_seconds,
            clip_starts: starts,
            with_intro,
            output: settings.output.clone(),
        })
    }

    fn extract_clips(
        &self,
        settings: &TrailerSettings,
        starts: &[u64],
        clip_seconds: u64,
        workspace: &TempWorkspace,
    ) -> Result<Vec<PathBuf>> {
        let clip_dir = workspace.path("clips");
        fs::create_dir_all(&clip_dir)
            .with_context(|| format!("無法建立片段資料夾: {}", clip_dir.display()))?;

        let progress_bar = create_progress_bar(starts.len() as u64, "擷取片段中...");
        let mut clips = Vec::with_capacity(starts.len());

        for &start in starts {
            if self.shutdown_signal.load(Ordering::SeqCst) {
                progress_bar.abandon_with_message("操作已中斷");
                bail!("收到中斷信號，停止擷取片段");
            }

            let clip = clip_dir.join(format!("clip_{start}.mp4"));
            clip_command(&settings.input_video, start, clip_seconds, &clip)
                .run()
                .with_context(|| format!("片段擷取失敗 ({start}s)"))?;
            clips.push(clip);
            progress_bar.inc(1);
        }

        progress_bar.finish_with_message("完成");
        Ok(clips)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::UserSettings;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    struct FixedProbe(f64);

    impl DurationProbe for FixedProbe {
        fn duration_seconds(&self, _path: &Path) -> Result<f64> {
            Ok(self.0)
        }
    }

    fn builder(seconds: f64) -> TrailerBuilder<FixedProbe> {
        let config = Config {
            settings: UserSettings::default(),
        };
        TrailerBuilder::with_probe(config, Arc::new(AtomicBool::new(false)), FixedProbe(seconds))
    }

    fn joined(cmd: &FfmpegCommand) -> String {
        cmd.arguments()
            .iter()
            .map(|a| a.to_string_lossy().to_string())
            .collect::<Vec<_>>()
            .join(" ")
    }

    #[test]
    fn test_plan_truncates_duration() {
        let (seconds, starts) = builder(120.96)
            .plan(&TrailerSettings::default(), &mut StdRng::seed_from_u64(1))
            .unwrap();
        assert_eq!(seconds, 120);
        assert_eq!(starts.len(), 11);
        assert!(starts.iter().all(|s| s % 3 == 0 && s + 3 <= 120));
    }

    #[test]
    fn test_plan_rejects_short_video() {
        let err = builder(35.9)
            .plan(&TrailerSettings::default(), &mut StdRng::seed_from_u64(1))
            .unwrap_err();
        assert!(err.to_string().contains("影片長度不足"));
    }

    #[test]
    fn test_build_fails_before_work_when_music_missing() {
        let dir = tempfile::tempdir().unwrap();
        let video = dir.path().join("input.mp4");
        fs::write(&video, b"").unwrap();
        let settings = TrailerSettings {
            input_video: video,
            music: dir.path().join("music.mp3"),
            ..TrailerSettings::default()
        };
        assert!(
            builder(600.0)
                .build(&settings, &mut StdRng::seed_from_u64(0))
                .is_err()
        );
    }

    #[test]
    fn test_clip_command() {
        let args = joined(&clip_command(
            Path::new("input.mp4"),
            42,
            3,
            Path::new("clip_42.mp4"),
        ));
        assert!(args.contains("-ss 42 -t 3 -i input.mp4 -c:v libx264 -c:a aac clip_42.mp4"));
    }

    #[test]
    fn test_clips_concat_command() {
        let args = joined(&clips_concat_command(
            Path::new("clip_list.txt"),
            Path::new("temp1_video.mp4"),
        ));
        assert!(args.contains("-vsync vfr -pix_fmt yuv420p"));
    }

    #[test]
    fn test_finishing_filter() {
        assert_eq!(finishing_filter(false, None), None);
        assert_eq!(finishing_filter(true, None).as_deref(), Some("hflip"));
        assert_eq!(
            finishing_filter(true, Some(1.2)).as_deref(),
            Some("hflip,setpts=1.2*PTS")
        );
        assert_eq!(
            finishing_filter(false, Some(1.5)).as_deref(),
            Some("setpts=1.5*PTS")
        );
    }

    #[test]
    fn test_finishing_command_copies_audio() {
        let args = joined(&finishing_command(
            Path::new("mix.mp4"),
            "hflip",
            Path::new("trailer.mp4"),
        ));
        assert!(args.ends_with("-i mix.mp4 -vf hflip -c:a copy trailer.mp4"));
    }
}
