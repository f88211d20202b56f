pub mod load;
pub mod save;
pub mod types;
pub mod validate;

pub use types::{
    Config, CutterSettings, FrameExtractionSettings, ImageOrder, Language, MergerSettings,
    NormalizeProfile, OverlaySettings, SlideshowEffect, SlideshowSettings, TrailerSettings,
    UserSettings,
};
pub use validate::MAX_SLIDESHOW_IMAGES;
