use crate::tools::{FfmpegCommand, ToolOutput};
use anyhow::{Context, Result};
use log::{debug, warn};
use regex::Regex;
use std::fmt::Write as _;
use std::fs;
use std::path::Path;
use std::sync::LazyLock;

/// 場景變換點資訊
#[derive(Debug, Clone, PartialEq)]
pub struct SceneChange {
    pub timestamp: f64,
    /// `lavfi.scene_score`，輸出中缺少時為 None
    pub score: Option<f64>,
}

/// 場景偵測結果
///
/// 無法執行 ffmpeg，或 ffmpeg 失敗且沒有任何可解析的時間點時，
/// 不視為錯誤而是回傳 `Unavailable`，後續流程以零個場景繼續。
#[derive(Debug, Clone, PartialEq)]
#[must_use]
pub enum SceneDetection {
    Detected(Vec<SceneChange>),
    Unavailable { reason: String },
}

impl SceneDetection {
    #[must_use]
    pub fn scenes(&self) -> &[SceneChange] {
        match self {
            Self::Detected(scenes) => scenes,
            Self::Unavailable { .. } => &[],
        }
    }

    #[must_use]
    pub fn timestamps(&self) -> Vec<f64> {
        self.scenes().iter().map(|s| s.timestamp).collect()
    }

    #[must_use]
    pub const fn is_unavailable(&self) -> bool {
        matches!(self, Self::Unavailable { .. })
    }
}

/// 允許正負號與 `%g` 的指數寫法（例如 `1e-05`）
const NUMBER: &str = r"([-+]?[0-9]*\.?[0-9]+(?:[eE][-+]?[0-9]+)?)";

static PTS_TIME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!(r"pts_time:\s*{NUMBER}")).expect("Invalid regex"));

static SCENE_SCORE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"lavfi\.scene_score={NUMBER}")).expect("Invalid regex")
});

/// select 濾鏡只保留 scene 分數超過門檻的幀，metadata=print 把時間點印到 stderr
#[must_use]
pub fn scene_filter(threshold: f64) -> String {
    format!("select=gt(scene\\,{threshold}),metadata=print")
}

/// 使用 ffmpeg select 濾鏡偵測場景變換
pub fn detect_scenes(path: &Path, threshold: f64) -> SceneDetection {
    debug!("場景偵測: threshold={threshold}, {}", path.display());

    let output = FfmpegCommand::ffmpeg()
        .input(path)
        .args(["-filter_complex", &scene_filter(threshold)])
        .args(["-an", "-f", "null", "-"])
        .run_lenient();

    match output {
        Ok(output) => interpret_scene_output(&output),
        Err(e) => {
            warn!("場景偵測失敗，以零個場景繼續: {e}");
            SceneDetection::Unavailable {
                reason: e.to_string(),
            }
        }
    }
}

/// 依 ffmpeg 的輸出決定偵測結果
///
/// 不論結束碼為何都先解析 stderr；失敗但已印出時間點（例如檔案尾端損毀）
/// 時保留這些場景，只有失敗且什麼都沒解析到才是 `Unavailable`。
pub fn interpret_scene_output(output: &ToolOutput) -> SceneDetection {
    let scenes = parse_scene_output(&output.stderr);

    if output.success || !scenes.is_empty() {
        if !output.success {
            warn!(
                "場景偵測中途失敗 (exit code {:?})，保留已偵測的 {} 個場景",
                output.code,
                scenes.len()
            );
        }
        debug!("偵測到 {} 個場景變換點", scenes.len());
        return SceneDetection::Detected(scenes);
    }

    let reason = output
        .stderr
        .lines()
        .map(str::trim)
        .rfind(|line| !line.is_empty())
        .unwrap_or("ffmpeg 沒有輸出")
        .to_string();
    warn!("場景偵測失敗，以零個場景繼續: {reason}");
    SceneDetection::Unavailable { reason }
}

/// 解析 metadata=print 輸出
///
/// 格式:
/// ```text
/// [Parsed_metadata_1 @ 0x...] frame:0    pts:2048    pts_time:4.12
/// [Parsed_metadata_1 @ 0x...] lavfi.scene_score=0.412
/// ```
/// 保留偵測順序，不排序也不去重。
#[must_use]
pub fn parse_scene_output(output: &str) -> Vec<SceneChange> {
    let mut scenes: Vec<SceneChange> = Vec::new();

    for line in output.lines() {
        if let Some(timestamp) = PTS_TIME
            .captures(line)
            .and_then(|caps| caps[1].parse::<f64>().ok())
        {
            scenes.push(SceneChange {
                timestamp,
                score: None,
            });
            continue;
        }

        let score = SCENE_SCORE
            .captures(line)
            .and_then(|caps| caps[1].parse::<f64>().ok());
        if let (Some(score), Some(last)) = (score, scenes.last_mut()) {
            if last.score.is_none() {
                last.score = Some(score);
            }
        }
    }

    scenes
}

/// 每行一個時間點，覆寫舊檔
pub fn write_timestamps(path: &Path, timestamps: &[f64]) -> Result<()> {
    let mut text = String::new();
    for timestamp in timestamps {
        let _ = writeln!(text, "{timestamp}");
    }
    fs::write(path, text)
        .with_context(|| format!("無法寫入場景時間點: {}", path.display()))
}

pub fn read_timestamps(path: &Path) -> Result<Vec<f64>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("無法讀取場景時間點: {}", path.display()))?;

    text.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(index, line)| {
            line.trim().parse::<f64>().with_context(|| {
                format!("場景時間點格式錯誤 (第 {} 行): {line}", index + 1)
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const METADATA_OUTPUT: &str = r"
Input #0, mov,mp4,m4a,3gp,3g2,mj2, from 'input.mp4':
  Duration: 00:00:30.00, start: 0.000000, bitrate: 900 kb/s
[Parsed_metadata_1 @ 0x55d0c8] frame:0    pts:63488   pts_time:4.13333
[Parsed_metadata_1 @ 0x55d0c8] lavfi.scene_score=0.412000
[Parsed_metadata_1 @ 0x55d0c8] frame:1    pts:192000  pts_time:12.5
[Parsed_metadata_1 @ 0x55d0c8] lavfi.scene_score=0.873000
frame=    2 fps=0.0 q=-0.0 Lsize=N/A time=00:00:29.96 bitrate=N/A speed= 112x
";

    #[test]
    fn test_parse_scene_output() {
        let scenes = parse_scene_output(METADATA_OUTPUT);
        assert_eq!(scenes.len(), 2);
        assert!((scenes[0].timestamp - 4.13333).abs() < 1e-6);
        assert_eq!(scenes[0].score, Some(0.412));
        assert!((scenes[1].timestamp - 12.5).abs() < 1e-6);
        assert_eq!(scenes[1].score, Some(0.873));
    }

    #[test]
    fn test_parse_keeps_detection_order() {
        let output = "pts_time:9.0\npts_time:3.0\npts_time:3.0\n";
        let timestamps: Vec<f64> = parse_scene_output(output)
            .iter()
            .map(|s| s.timestamp)
            .collect();
        assert_eq!(timestamps, vec![9.0, 3.0, 3.0]);
    }

    #[test]
    fn test_parse_ignores_garbage() {
        let output = "pts_time:abc\nlavfi.scene_score=0.5\nrandom line\n";
        assert!(parse_scene_output(output).is_empty());
    }

    #[test]
    fn test_parse_signed_and_exponent_times() {
        let output = "\
[Parsed_metadata_1 @ 0x1] frame:0    pts:-1    pts_time:-0.04
[Parsed_metadata_1 @ 0x1] frame:1    pts:1     pts_time:1e-05
[Parsed_metadata_1 @ 0x1] lavfi.scene_score=2.5e-01
[Parsed_metadata_1 @ 0x1] frame:2    pts:9     pts_time:+3
";
        let scenes = parse_scene_output(output);
        let timestamps: Vec<f64> = scenes.iter().map(|s| s.timestamp).collect();
        assert_eq!(timestamps, vec![-0.04, 1e-5, 3.0]);
        assert_eq!(scenes[1].score, Some(0.25));
    }

    fn tool_output(success: bool, stderr: &str) -> ToolOutput {
        ToolOutput {
            success,
            code: Some(if success { 0 } else { 1 }),
            stdout: String::new(),
            stderr: stderr.to_string(),
        }
    }

    #[test]
    fn test_failed_exit_keeps_parsed_scenes() {
        let stderr =
            format!("{METADATA_OUTPUT}input.mp4: Invalid data found when processing input\n");
        let detection = interpret_scene_output(&tool_output(false, &stderr));
        assert!(!detection.is_unavailable());
        assert_eq!(detection.timestamps().len(), 2);
        assert!((detection.timestamps()[1] - 12.5).abs() < 1e-6);
    }

    #[test]
    fn test_failed_exit_without_scenes_is_unavailable() {
        let stderr = "input.mp4: No such file or directory\n\n";
        let detection = interpret_scene_output(&tool_output(false, stderr));
        assert_eq!(
            detection,
            SceneDetection::Unavailable {
                reason: "input.mp4: No such file or directory".to_string()
            }
        );
    }

    #[test]
    fn test_successful_exit_without_scenes_is_detected() {
        let detection = interpret_scene_output(&tool_output(true, "frame=  250 fps=0.0\n"));
        assert_eq!(detection, SceneDetection::Detected(Vec::new()));
    }

    #[test]
    fn test_scene_filter() {
        assert_eq!(scene_filter(0.2), "select=gt(scene\\,0.2),metadata=print");
    }

    #[test]
    fn test_unavailable_has_no_timestamps() {
        let detection = SceneDetection::Unavailable {
            reason: "No such file".to_string(),
        };
        assert!(detection.is_unavailable());
        assert!(detection.timestamps().is_empty());
    }

    #[test]
    fn test_missing_input_is_unavailable() {
        let detection = detect_scenes(Path::new("/definitely/not/here.mp4"), 0.2);
        assert!(detection.timestamps().is_empty());
    }

    #[test]
    fn test_timestamps_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scene_timestamps.txt");
        fs::write(&path, "stale\n").unwrap();

        write_timestamps(&path, &[4.13333, 12.5, 20.0]).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "4.13333\n12.5\n20\n");
        assert_eq!(read_timestamps(&path).unwrap(), vec![4.13333, 12.5, 20.0]);
    }

    #[test]
    fn test_read_timestamps_reports_bad_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scene_timestamps.txt");
        fs::write(&path, "1.0\n\noops\n").unwrap();
        let err = format!("{:#}", read_timestamps(&path).unwrap_err());
        assert!(err.contains("第 3 行"));
    }

    #[test]
    fn test_empty_timestamps_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scene_timestamps.txt");
        write_timestamps(&path, &[]).unwrap();
        assert!(read_timestamps(&path).unwrap().is_empty());
    }
}
