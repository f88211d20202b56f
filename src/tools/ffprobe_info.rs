use crate::tools::ffmpeg_command::{FFMPEG, FFPROBE, FfmpegCommand, ToolError};
use anyhow::{Context, Result, anyhow};
use regex::Regex;
use serde::Deserialize;
use std::path::Path;
use std::sync::LazyLock;

/// 媒體檔資訊
#[derive(Debug, Clone)]
pub struct MediaInfo {
    pub duration_seconds: f64,
    pub video: Option<VideoStreamInfo>,
    pub has_audio: bool,
}

#[derive(Debug, Clone)]
pub struct VideoStreamInfo {
    pub width: u32,
    pub height: u32,
    pub frame_rate: f64,
}

#[derive(Deserialize)]
struct FfprobeOutput {
    format: Option<FormatInfo>,
    streams: Option<Vec<StreamInfo>>,
}

#[derive(Deserialize)]
struct FormatInfo {
    duration: Option<String>,
}

#[derive(Deserialize)]
struct StreamInfo {
    codec_type: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    r_frame_rate: Option<String>,
    duration: Option<String>,
}

/// 取得媒體長度的介面
///
/// 預設使用 ffprobe 的 JSON 輸出；ffmpeg 橫幅文字解析保留為替代實作。
pub trait DurationProbe {
    fn duration_seconds(&self, path: &Path) -> Result<f64>;
}

/// 以 ffprobe JSON 輸出取得長度
#[derive(Debug, Default, Clone, Copy)]
pub struct FfprobeDurationProbe;

impl DurationProbe for FfprobeDurationProbe {
    fn duration_seconds(&self, path: &Path) -> Result<f64> {
        Ok(probe_media(path)?.duration_seconds)
    }
}

/// 解析 `ffmpeg -i` 的 `Duration: HH:MM:SS.xx` 行
#[derive(Debug, Default, Clone, Copy)]
pub struct FfmpegBannerProbe;

impl DurationProbe for FfmpegBannerProbe {
    fn duration_seconds(&self, path: &Path) -> Result<f64> {
        // 沒有指定輸出檔，ffmpeg 必定以非零碼結束
        let output = FfmpegCommand::ffmpeg()
            .input(path)
            .run_lenient()
            .with_context(|| format!("無法讀取影片長度: {}", path.display()))?;

        parse_banner_duration(&output.stderr).ok_or_else(|| {
            ToolError::Parse {
                program: FFMPEG,
                detail: format!("找不到 Duration 欄位: {}", path.display()),
            }
            .into()
        })
    }
}

static DURATION_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Duration:\s*(\d+):(\d{2}):(\d{2}(?:\.\d+)?)").expect("Invalid regex")
});

/// 從 ffmpeg 診斷輸出解析長度（秒）
#[must_use]
pub fn parse_banner_duration(stderr: &str) -> Option<f64> {
    let caps = DURATION_LINE.captures(stderr)?;
    let hours: f64 = caps[1].parse().ok()?;
    let minutes: f64 = caps[2].parse().ok()?;
    let seconds: f64 = caps[3].parse().ok()?;
    Some(hours * 3600.0 + minutes * 60.0 + seconds)
}

/// 使用 ffprobe 取得媒體資訊
pub fn probe_media(path: &Path) -> Result<MediaInfo> {
    let output = FfmpegCommand::ffprobe()
        .args([
            "-v",
            "quiet",
            "-print_format",
            "json",
            "-show_format",
            "-show_streams",
        ])
        .arg(path)
        .run()
        .with_context(|| format!("ffprobe 執行失敗: {}", path.display()))?;

    parse_probe_output(&output.stdout)
        .with_context(|| format!("無法解析 ffprobe 輸出: {}", path.display()))
}

/// 使用 ffprobe 取得影片資訊，沒有視訊串流時回傳錯誤
pub fn get_video_info(path: &Path) -> Result<(MediaInfo, VideoStreamInfo)> {
    let info = probe_media(path)?;
    let video = info
        .video
        .clone()
        .ok_or_else(|| anyhow!("找不到視訊串流: {}", path.display()))?;
    Ok((info, video))
}

/// 檔案是否含有音訊串流
pub fn has_audio_stream(path: &Path) -> Result<bool> {
    Ok(probe_media(path)?.has_audio)
}

fn parse_probe_output(json: &str) -> Result<MediaInfo> {
    let probe: FfprobeOutput = serde_json::from_str(json).map_err(|e| ToolError::Parse {
        program: FFPROBE,
        detail: e.to_string(),
    })?;

    let streams = probe.streams.unwrap_or_default();
    let video_stream = streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("video"));
    let has_audio = streams
        .iter()
        .any(|s| s.codec_type.as_deref() == Some("audio"));

    // 優先使用 format 的長度，其次使用視訊串流的長度
    let duration_seconds = probe
        .format
        .as_ref()
        .and_then(|f| f.duration.as_ref())
        .or_else(|| video_stream.and_then(|s| s.duration.as_ref()))
        .and_then(|d| d.parse::<f64>().ok())
        .ok_or_else(|| ToolError::Parse {
            program: FFPROBE,
            detail: "無法取得媒體長度".to_string(),
        })?;

    let video = match video_stream {
        Some(stream) => Some(VideoStreamInfo {
            width: stream.width.ok_or_else(|| anyhow!("無法取得影片寬度"))?,
            height: stream.height.ok_or_else(|| anyhow!("無法取得影片高度"))?,
            frame_rate: stream
                .r_frame_rate
                .as_deref()
                .and_then(parse_frame_rate)
                .unwrap_or(30.0),
        }),
        None => None,
    };

    Ok(MediaInfo {
        duration_seconds,
        video,
        has_audio,
    })
}

/// 解析幀率字串（例如 "30/1" 或 "30000/1001"）
fn parse_frame_rate(rate: &str) -> Option<f64> {
    if let Some((num_str, den_str)) = rate.split_once('/') {
        let num: f64 = num_str.parse().ok()?;
        let den: f64 = den_str.parse().ok()?;
        if den > 0.0 {
            return Some(num / den);
        }
    }
    rate.parse().ok()
}
