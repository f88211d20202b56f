//! 影片裁切元件（不重新編碼）

mod main;

pub use main::{VideoCutter, cut_command};
