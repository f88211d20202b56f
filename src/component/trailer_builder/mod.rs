//! 隨機預告片產生元件
//!
//! 從來源影片隨機抽取不重疊的固定長度片段，
//! 串接後加上片頭與背景音樂。

mod intro;
mod main;
mod slot_sampler;

pub use intro::{IntroTiming, build_intro, image_clip_command, stream_copy_concat_command};
pub use main::{
    TrailerBuilder, TrailerResult, clip_command, clips_concat_command, finishing_command,
    finishing_filter,
};
pub use slot_sampler::{available_slots, pick_clip_starts};
