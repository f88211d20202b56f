use crate::config::NormalizeProfile;
use crate::tools::FfmpegCommand;
use std::path::Path;

/// 重新編碼為一致的格式，讓後續 `-c copy` 串接不會出現音畫不同步
///
/// `StreamCopy` 不需要正規化，回傳 None。
#[must_use]
pub fn normalize_command(
    profile: NormalizeProfile,
    input: &Path,
    output: &Path,
) -> Option<FfmpegCommand> {
    let command = FfmpegCommand::ffmpeg().loglevel("error").input(input);
    let command = match profile {
        NormalizeProfile::Standard => command,
        NormalizeProfile::Hd1080 => command.args(["-vf", "scale=-2:1080"]),
        NormalizeProfile::StreamCopy => return None,
    };

    Some(
        command
            .args(["-r", "30"])
            .args(["-c:v", "libx264", "-preset", "medium", "-crf", "20"])
            .args(["-c:a", "aac", "-b:a", "192k", "-ar", "48000", "-ac", "2"])
            .args(["-movflags", "+faststart", "-pix_fmt", "yuv420p"])
            .arg(output),
    )
}

/// 串接已正規化的影片
#[must_use]
pub fn merge_command(manifest: &Path, output: &Path) -> FfmpegCommand {
    FfmpegCommand::ffmpeg()
        .loglevel("error")
        .args(["-f", "concat", "-safe", "0"])
        .input(manifest)
        .args(["-c", "copy", "-fflags", "+genpts"])
        .arg(output)
}

/// 合併失敗時的建議處理方式
#[must_use]
pub const fn remediation_hints(profile: NormalizeProfile) -> &'static [&'static str] {
    match profile {
        NormalizeProfile::StreamCopy => &[
            "確認所有影片的編碼、解析度與幀率一致",
            "若不一致，先分別轉檔: ffmpeg -i input.mp4 -r 30 -c:v libx264 -crf 22 -c:a aac output_fixed.mp4",
        ],
        NormalizeProfile::Standard | NormalizeProfile::Hd1080 => &[
            "確認每個影片都能在 VLC/MPV 正常播放",
            "先單獨轉檔有問題的影片: ffmpeg -i problem.mp4 -r 30 -c:v libx264 -crf 22 -c:a aac fixed.mp4",
        ],
    }
}
