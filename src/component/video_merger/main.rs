use super::normalizer::{merge_command, normalize_command, remediation_hints};
use crate::config::{Config, MergerSettings};
use crate::tools::{
    ConcatManifest, DurationProbe, FfprobeDurationProbe, TempWorkspace, create_progress_bar,
    ensure_parent_exists, format_clock, validate_files_exist,
};
use anyhow::{Context, Result, bail};
use console::style;
use dialoguer::Input;
use log::{info, warn};
use std::path::{self, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// 超過此差距才視為長度偏移
const DRIFT_TOLERANCE_SECONDS: f64 = 0.5;

#[derive(Debug, Clone)]
pub struct SegmentDuration {
    pub source: PathBuf,
    pub seconds: f64,
}

#[derive(Debug)]
pub struct MergeResult {
    pub segments: Vec<SegmentDuration>,
    pub expected_seconds: f64,
    pub final_seconds: f64,
    pub output: PathBuf,
}

impl MergeResult {
    /// 實際長度減去預期長度
    #[must_use]
    pub fn drift(&self) -> f64 {
        self.final_seconds - self.expected_seconds
    }
}

/// 影片合併器
///
/// 每個輸入先正規化為相同格式，再以 concat demuxer 串接。
pub struct VideoMerger {
    config: Config,
    shutdown_signal: Arc<AtomicBool>,
}

impl VideoMerger {
    pub const fn new(config: Config, shutdown_signal: Arc<AtomicBool>) -> Self {
        Self {
            config,
            shutdown_signal,
        }
    }

    pub fn run(&self) -> Result<()> {
        println!("{}", style("=== 影片合併 ===").cyan().bold());

        let defaults = &self.config.settings.merger;
        println!("輸入影片（依序）:");
        for (index, input) in defaults.inputs.iter().enumerate() {
            println!("  {}. {}", index + 1, input.display());
        }
        let output: String = Input::new()
            .with_prompt("請輸入輸出影片路徑")
            .default(defaults.output.display().to_string())
            .interact_text()?;

        let settings = MergerSettings {
            output: PathBuf::from(output.trim()),
            ..defaults.clone()
        };
        settings.validate()?;

        match self.merge(&settings) {
            Ok(result) => {
                self.print_summary(&result);
                Ok(())
            }
            Err(e) => {
                println!("\n{}", style("可嘗試以下方式:").yellow());
                for (index, hint) in remediation_hints(settings.profile).iter().enumerate() {
                    println!("  {}. {hint}", index + 1);
                }
                Err(e)
            }
        }
    }

    pub fn merge(&self, settings: &MergerSettings) -> Result<MergeResult> {
        validate_files_exist(&settings.inputs)?;
        ensure_parent_exists(&settings.output)?;

        let mut workspace = TempWorkspace::create(&self.config.settings.work_dir, "merge")?;
        workspace.keep_on_drop(self.config.settings.keep_intermediates);

        info!(
            "合併 {} 個影片 ({})",
            settings.inputs.len(),
            settings.profile
        );

        let segments = self.normalize_all(settings, &workspace)?;
        let probe = FfprobeDurationProbe;

        println!("\n{}", style("各段影片長度:").green());
        let mut durations = Vec::with_capacity(segments.len());
        for (source, segment) in settings.inputs.iter().zip(&segments) {
            let seconds = probe
                .duration_seconds(segment)
                .with_context(|| format!("無法取得影片長度: {}", segment.display()))?;
            println!("  {}: {}", source.display(), format_clock(seconds));
            durations.push(SegmentDuration {
                source: source.clone(),
                seconds,
            });
        }
        let expected_seconds: f64 = durations.iter().map(|d| d.seconds).sum();

        let manifest_path = workspace.path("temp_list.txt");
        ConcatManifest::from_files(&segments).write_to(&manifest_path)?;
        merge_command(&manifest_path, &settings.output)
            .run()
            .context("影片串接失敗")?;

        let final_seconds = probe
            .duration_seconds(&settings.output)
            .with_context(|| format!("無法取得影片長度: {}", settings.output.display()))?;

        let result = MergeResult {
            segments: durations,
            expected_seconds,
            final_seconds,
            output: settings.output.clone(),
        };

        if result.drift().abs() > DRIFT_TOLERANCE_SECONDS {
            warn!(
                "合併後長度偏移 {:.2}s (預期 {:.2}s，實際 {:.2}s)",
                result.drift(),
                expected_seconds,
                final_seconds
            );
        } else {
            info!("合併完成: {:.2}s", final_seconds);
        }

        Ok(result)
    }

    /// 依設定正規化每個輸入；`StreamCopy` 直接使用原始檔
    fn normalize_all(
        &self,
        settings: &MergerSettings,
        workspace: &TempWorkspace,
    ) -> Result<Vec<PathBuf>> {
        let progress_bar = create_progress_bar(settings.inputs.len() as u64, "正規化影片中...");
        let mut segments = Vec::with_capacity(settings.inputs.len());

        for (index, input) in settings.inputs.iter().enumerate() {
            if self.shutdown_signal.load(Ordering::SeqCst) {
                progress_bar.abandon_with_message("操作已中斷");
                bail!("收到中斷信號，停止合併");
            }

            let normalized = workspace.path(&format!("normalized_{index}.mp4"));
            let segment = match normalize_command(settings.profile, input, &normalized) {
                Some(command) => {
                    command
                        .run()
                        .with_context(|| format!("影片正規化失敗: {}", input.display()))?;
                    normalized
                }
                None => path::absolute(input)
                    .with_context(|| format!("無法解析路徑: {}", input.display()))?,
            };
            segments.push(segment);
            progress_bar.inc(1);
        }

        progress_bar.finish_with_message("完成");
        Ok(segments)
    }

    fn print_summary(&self, result: &MergeResult) {
        println!();
        println!("{}", style("=== 合併摘要 ===").cyan().bold());
        println!("  輸出: {}", result.output.display());
        println!(
            "  最終長度: {:.2}s (預期 {:.2}s)",
            result.final_seconds, result.expected_seconds
        );
        let drift = format!("{:.2}s", result.drift());
        if result.drift().abs() > DRIFT_TOLERANCE_SECONDS {
            println!("  差距: {}", style(drift).yellow());
        } else {
            println!("  差距: {}", style(drift).green());
        }
    }
}
