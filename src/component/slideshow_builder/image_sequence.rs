use anyhow::{Result, bail, ensure};
use rand::Rng;
use rand::seq::IndexedRandom;
use std::path::PathBuf;

/// 填滿總長度所需的圖片數量（無條件進位）
#[must_use]
pub fn required_image_count(total_duration: f64, image_duration: f64) -> usize {
    if image_duration <= 0.0 || total_duration <= 0.0 {
        return 0;
    }
    (total_duration / image_duration).ceil() as usize
}

/// 均勻隨機抽取 `count` 張，可重複
pub fn pick_random_sequence<R: Rng + ?Sized>(
    images: &[PathBuf],
    count: usize,
    rng: &mut R,
) -> Result<Vec<PathBuf>> {
    ensure!(!images.is_empty(), "找不到任何圖片");
    Ok((0..count)
        .filter_map(|_| images.choose(rng).cloned())
        .collect())
}

/// 依檔名順序每張使用一次，可要求固定數量
pub fn ordered_sequence(images: &[PathBuf], expected: Option<usize>) -> Result<Vec<PathBuf>> {
    if images.is_empty() {
        bail!("找不到任何圖片");
    }
    if let Some(expected) = expected {
        ensure!(
            images.len() == expected,
            "圖片數量不符: 需要 {expected} 張，找到 {} 張",
            images.len()
        );
    }
    let mut sequence = images.to_vec();
    sequence.sort();
    Ok(sequence)
}
