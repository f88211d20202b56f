//! 功能元件模組
//!
//! 每個子模組實現一個獨立的流程，元件之間只透過磁碟上的檔案傳遞資料

pub mod clear_frame_extractor;
pub mod slideshow_builder;
pub mod trailer_builder;
pub mod video_cutter;
pub mod video_merger;

pub use clear_frame_extractor::ClearFrameExtractor;
pub use slideshow_builder::SlideshowBuilder;
pub use trailer_builder::TrailerBuilder;
pub use video_cutter::VideoCutter;
pub use video_merger::VideoMerger;
