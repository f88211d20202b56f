mod audio_mixer;
mod concat_manifest;
mod ffmpeg_command;
mod ffprobe_info;
mod image_scanner;
mod path_validator;
mod progress;
mod temp_workspace;
mod time_format;

pub use audio_mixer::{
    MixLevels, add_background_music, loop_music_command, loop_music_under, mix_music_command,
    replace_audio_command, trim_music_start,
};
pub use concat_manifest::{ConcatEntry, ConcatManifest};
pub use ffmpeg_command::{FFMPEG, FFPROBE, FfmpegCommand, ToolError, ToolOutput};
pub use ffprobe_info::{
    DurationProbe, FfmpegBannerProbe, FfprobeDurationProbe, MediaInfo, VideoStreamInfo,
    get_video_info, has_audio_stream, parse_banner_duration, probe_media,
};
pub use image_scanner::{IMAGE_EXTENSIONS, is_image_file, list_images, list_subdirectories};
pub use path_validator::{
    ensure_directory_exists, ensure_parent_exists, recreate_directory, validate_directory_exists,
    validate_file_exists, validate_files_exist,
};
pub use progress::create_progress_bar;
pub use temp_workspace::TempWorkspace;
pub use time_format::{format_clock, parse_clock_duration};
