use crate::component::{
    ClearFrameExtractor, SlideshowBuilder, TrailerBuilder, VideoCutter, VideoMerger,
};
use crate::config::Config;
use crate::pause;
use anyhow::Result;
use console::{Term, style};
use log::error;
use rust_i18n::t;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// 上一次執行留下的中斷旗標不影響新的流程
fn fresh_signal(shutdown_signal: &Arc<AtomicBool>) -> Arc<AtomicBool> {
    shutdown_signal.store(false, Ordering::SeqCst);
    Arc::clone(shutdown_signal)
}

fn report(result: Result<()>) {
    if let Err(e) = result {
        error!("{e:#}");
        eprintln!("{} {:#}", style(t!("common.error")).red().bold(), e);
    }
}

pub fn run_clear_frame_extractor(
    term: &Term,
    shutdown_signal: &Arc<AtomicBool>,
    config: &Config,
) -> Result<()> {
    let extractor = ClearFrameExtractor::new(config.clone(), fresh_signal(shutdown_signal));
    report(extractor.run());
    pause(term)
}

pub fn run_slideshow_builder(
    term: &Term,
    shutdown_signal: &Arc<AtomicBool>,
    config: &Config,
) -> Result<()> {
    let builder = SlideshowBuilder::new(config.clone(), fresh_signal(shutdown_signal));
    report(builder.run());
    pause(term)
}

pub fn run_trailer_builder(
    term: &Term,
    shutdown_signal: &Arc<AtomicBool>,
    config: &Config,
) -> Result<()> {
    let builder = TrailerBuilder::new(config.clone(), fresh_signal(shutdown_signal));
    report(builder.run());
    pause(term)
}

pub fn run_video_merger(
    term: &Term,
    shutdown_signal: &Arc<AtomicBool>,
    config: &Config,
) -> Result<()> {
    let merger = VideoMerger::new(config.clone(), fresh_signal(shutdown_signal));
    report(merger.run());
    pause(term)
}

pub fn run_video_cutter(term: &Term, config: &Config) -> Result<()> {
    let cutter = VideoCutter::new(config.clone());
    report(cutter.run());
    pause(term)
}
