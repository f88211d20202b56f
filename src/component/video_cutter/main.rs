use crate::config::{Config, CutterSettings};
use crate::tools::{
    FfmpegCommand, ensure_parent_exists, format_clock, parse_clock_duration, validate_file_exists,
};
use anyhow::{Context, Result};
use console::style;
use dialoguer::Input;
use log::info;
use std::path::{Path, PathBuf};

/// 從開頭保留 `length` 秒，不重新編碼
#[must_use]
pub fn cut_command(input: &Path, length: f64, output: &Path) -> FfmpegCommand {
    FfmpegCommand::ffmpeg()
        .loglevel("error")
        .input(input)
        .args(["-t", &length.to_string()])
        .args(["-c", "copy"])
        .arg(output)
}

/// 影片裁切器
pub struct VideoCutter {
    config: Config,
}

impl VideoCutter {
    pub const fn new(config: Config) -> Self {
        Self { config }
    }

    pub fn run(&self) -> Result<()> {
        println!("{}", style("=== 影片裁切 ===").cyan().bold());

        let defaults = &self.config.settings.cutter;
        let input: String = Input::new()
            .with_prompt("請輸入影片路徑")
            .default(defaults.input.display().to_string())
            .interact_text()?;
        let length: String = Input::new()
            .with_prompt("保留長度 (HH:MM:SS)")
            .default(defaults.length.clone())
            .interact_text()?;
        let output: String = Input::new()
            .with_prompt("請輸入輸出影片路徑")
            .default(defaults.output.display().to_string())
            .interact_text()?;

        let settings = CutterSettings {
            input: PathBuf::from(input.trim()),
            output: PathBuf::from(output.trim()),
            length: length.trim().to_string(),
        };

        let output = self.cut(&settings)?;
        println!("{} 已輸出: {}", style("✓").green(), output.display());
        Ok(())
    }

    pub fn cut(&self, settings: &CutterSettings) -> Result<PathBuf> {
        settings.validate()?;
        validate_file_exists(&settings.input)?;
        ensure_parent_exists(&settings.output)?;

        let length = parse_clock_duration(&settings.length)?;
        info!(
            "裁切 {} 前 {} -> {}",
            settings.input.display(),
            format_clock(length),
            settings.output.display()
        );

        cut_command(&settings.input, length, &settings.output)
            .run()
            .with_context(|| format!("裁切失敗: {}", settings.input.display()))?;
        Ok(settings.output.clone())
    }
}
