use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Language {
    #[default]
    #[serde(rename = "en-US")]
    EnUs,
    #[serde(rename = "zh-TW")]
    ZhTw,
}

impl Language {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::EnUs => "en-US",
            Self::ZhTw => "zh-TW",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EnUs => write!(f, "English"),
            Self::ZhTw => write!(f, "繁體中文"),
        }
    }
}

/// 投影片畫面效果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SlideshowEffect {
    /// 緩慢放大
    #[default]
    ZoomPan,
    /// 不加效果，最快
    Plain,
    /// 固定縮放為 1280x720、25fps
    Scaled,
}

impl fmt::Display for SlideshowEffect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZoomPan => write!(f, "zoompan"),
            Self::Plain => write!(f, "plain"),
            Self::Scaled => write!(f, "scale 1280x720"),
        }
    }
}

/// 投影片圖片排列方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ImageOrder {
    /// 隨機抽取（可重複）直到填滿總長度
    #[default]
    Random,
    /// 依檔名順序，每張一次
    Sorted,
}

impl fmt::Display for ImageOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Random => write!(f, "random"),
            Self::Sorted => write!(f, "sorted"),
        }
    }
}

/// 合併前的正規化方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum NormalizeProfile {
    /// 30fps / H.264 / AAC 48kHz 立體聲
    #[default]
    Standard,
    /// 同 Standard，並縮放至 1080p 高度
    Hd1080,
    /// 不重新編碼，直接串接
    StreamCopy,
}

impl fmt::Display for NormalizeProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Standard => write!(f, "standard"),
            Self::Hd1080 => write!(f, "hd1080"),
            Self::StreamCopy => write!(f, "stream copy"),
        }
    }
}

/// 場景偵測與最佳畫面擷取設定
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrameExtractionSettings {
    pub input_video: PathBuf,
    pub output_dir: PathBuf,
    /// select 濾鏡的 scene 分數門檻 (0-1)
    pub scene_threshold: f64,
    pub samples_per_scene: usize,
    /// 每張取樣之間的秒數
    pub sample_spacing: f64,
    pub frame_width: u32,
    /// JPEG 品質 (1-31，數字越小品質越高)
    pub jpeg_quality: u8,
    /// 所有通道平均亮度低於此值視為黑畫面
    pub darkness_threshold: f64,
    /// Laplacian 變異數低於此值視為模糊
    pub blur_threshold: f64,
}

impl Default for FrameExtractionSettings {
    fn default() -> Self {
        Self {
            input_video: PathBuf::from("input.mp4"),
            output_dir: PathBuf::from("clear_scenes"),
            scene_threshold: 0.2,
            samples_per_scene: 10,
            sample_spacing: 0.2,
            frame_width: 1280,
            jpeg_quality: 2,
            darkness_threshold: 10.0,
            blur_threshold: 100.0,
        }
    }
}

/// 綠幕疊加設定
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlaySettings {
    pub video: PathBuf,
    pub output: PathBuf,
    /// colorkey 顏色，例如 `0x41CE43`
    pub key_color: String,
    pub similarity: f64,
    pub blend: f64,
}

impl Default for OverlaySettings {
    fn default() -> Self {
        Self {
            video: PathBuf::from("complete.mp4"),
            output: PathBuf::from("overlay.mp4"),
            key_color: "0x41CE43".to_string(),
            similarity: 0.3,
            blend: 0.2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SlideshowSettings {
    pub image_dir: PathBuf,
    pub output: PathBuf,
    pub music: Option<PathBuf>,
    /// 每張圖片顯示秒數
    pub image_duration: f64,
    /// 影片總長度（秒）
    pub total_duration: f64,
    pub order: ImageOrder,
    /// 依序排列時要求的圖片數量
    pub expected_image_count: Option<usize>,
    pub effect: SlideshowEffect,
    pub overlay: Option<OverlaySettings>,
}

impl Default for SlideshowSettings {
    fn default() -> Self {
        Self {
            image_dir: PathBuf::from("clear_scenes"),
            output: PathBuf::from("last.mp4"),
            music: Some(PathBuf::from("voice.mp3")),
            image_duration: 5.0,
            total_duration: 78.0,
            order: ImageOrder::Random,
            expected_image_count: None,
            effect: SlideshowEffect::ZoomPan,
            overlay: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrailerSettings {
    pub input_video: PathBuf,
    pub output: PathBuf,
    pub music: PathBuf,
    /// 每個片段秒數
    pub clip_duration: u32,
    /// 片段總秒數（片段數 = total / clip）
    pub total_duration: u32,
    /// 開頭的靜態圖片
    pub intro_images: Vec<PathBuf>,
    pub intro_render_duration: f64,
    pub intro_display_duration: f64,
    /// 背景音樂從第幾秒開始
    pub music_start_offset: f64,
    pub source_volume: f64,
    pub music_volume: f64,
    /// 水平翻轉
    pub mirror: bool,
    /// 放慢倍率，例如 1.2
    pub slow_factor: Option<f64>,
}

impl Default for TrailerSettings {
    fn default() -> Self {
        Self {
            input_video: PathBuf::from("input.mp4"),
            output: PathBuf::from("trailer.mp4"),
            music: PathBuf::from("music.mp3"),
            clip_duration: 3,
            total_duration: 35,
            intro_images: Vec::new(),
            intro_render_duration: 3.0,
            intro_display_duration: 2.0,
            music_start_offset: 0.0,
            source_volume: 0.08,
            music_volume: 1.0,
            mirror: false,
            slow_factor: None,
        }
    }
}

impl TrailerSettings {
    #[must_use]
    pub const fn clip_count(&self) -> u32 {
        if self.clip_duration == 0 {
            return 0;
        }
        self.total_duration / self.clip_duration
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MergerSettings {
    pub inputs: Vec<PathBuf>,
    pub output: PathBuf,
    pub profile: NormalizeProfile,
}

impl Default for MergerSettings {
    fn default() -> Self {
        Self {
            inputs: vec![PathBuf::from("new.mp4"), PathBuf::from("last.mp4")],
            output: PathBuf::from("final_output.mp4"),
            profile: NormalizeProfile::Standard,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CutterSettings {
    pub input: PathBuf,
    pub output: PathBuf,
    /// `HH:MM:SS` 或秒數
    pub length: String,
}

impl Default for CutterSettings {
    fn default() -> Self {
        Self {
            input: PathBuf::from("final_output.mp4"),
            output: PathBuf::from("output_cut.mp4"),
            length: "02:10:00".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserSettings {
    pub language: Language,
    /// 暫存資料夾的上層位置
    pub work_dir: PathBuf,
    /// 保留中間檔（除錯用）
    pub keep_intermediates: bool,
    pub frame_extraction: FrameExtractionSettings,
    pub slideshow: SlideshowSettings,
    pub trailer: TrailerSettings,
    pub merger: MergerSettings,
    pub cutter: CutterSettings,
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            language: Language::default(),
            work_dir: PathBuf::from("."),
            keep_intermediates: false,
            frame_extraction: FrameExtractionSettings::default(),
            slideshow: SlideshowSettings::default(),
            trailer: TrailerSettings::default(),
            merger: MergerSettings::default(),
            cutter: CutterSettings::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub settings: UserSettings,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_settings_fill_defaults() {
        let json = r#"{"language": "zh-TW", "slideshow": {"image_duration": 10.0, "total_duration": 7860.0, "effect": "plain"}}"#;
        let settings: UserSettings = serde_json::from_str(json).unwrap();

        assert_eq!(settings.language, Language::ZhTw);
        assert!((settings.slideshow.image_duration - 10.0).abs() < f64::EPSILON);
        assert_eq!(settings.slideshow.effect, SlideshowEffect::Plain);
        assert_eq!(settings.slideshow.image_dir, PathBuf::from("clear_scenes"));
        assert_eq!(settings.trailer, TrailerSettings::default());
    }

    #[test]
    fn test_settings_round_trip() {
        let mut settings = UserSettings::default();
        settings.merger.profile = NormalizeProfile::Hd1080;
        settings.trailer.slow_factor = Some(1.2);

        let json = serde_json::to_string_pretty(&settings).unwrap();
        let parsed: UserSettings = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, settings);
    }

    #[test]
    fn test_clip_count() {
        let trailer = TrailerSettings::default();
        assert_eq!(trailer.clip_count(), 11);

        let zero = TrailerSettings {
            clip_duration: 0,
            ..TrailerSettings::default()
        };
        assert_eq!(zero.clip_count(), 0);
    }

    #[test]
    fn test_language_as_str() {
        assert_eq!(Language::EnUs.as_str(), "en-US");
        assert_eq!(Language::ZhTw.as_str(), "zh-TW");
    }
}
