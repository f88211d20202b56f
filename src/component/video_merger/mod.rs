//! 影片合併元件

mod main;
mod normalizer;

pub use main::{MergeResult, SegmentDuration, VideoMerger};
pub use normalizer::{merge_command, normalize_command, remediation_hints};
