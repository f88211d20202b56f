//! 清晰場景畫面擷取元件
//!
//! 偵測場景變換，每個場景取多張候選畫面，
//! 過濾過暗與模糊的畫面後保留最清晰的一張。

mod frame_sampler;
mod frame_scorer;
mod main;
mod scene_detector;

pub use frame_sampler::{
    FrameSamplerConfig, FrameTask, MissingFrame, SamplingReport, frame_command, plan_frame_tasks,
    sample_frames, scene_dir_name,
};
pub use frame_scorer::{
    FilterSummary, FrameMetrics, FrameVerdict, QualityThresholds, SceneSelection,
    filter_best_frames, laplacian_variance, mean_intensity, measure, pick_sharpest,
    select_best_frame,
};
pub use main::{ClearFrameExtractor, ExtractionResult, RAW_FRAMES_DIR, TIMESTAMPS_FILE};
pub use scene_detector::{
    SceneChange, SceneDetection, detect_scenes, parse_scene_output, read_timestamps, scene_filter,
    write_timestamps,
};
