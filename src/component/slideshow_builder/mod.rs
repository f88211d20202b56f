//! 圖片投影片產生元件

mod image_sequence;
mod main;
mod renderer;

pub use image_sequence::{ordered_sequence, pick_random_sequence, required_image_count};
pub use main::{MANIFEST_FILE, SlideshowBuilder, SlideshowResult, build_manifest};
pub use renderer::{
    apply_overlay, chroma_key_filter, effect_filter, overlay_command, render_command,
    render_slideshow,
};
