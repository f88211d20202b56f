use anyhow::{Result, ensure};
use rand::Rng;
use rand::seq::SliceRandom;

/// 可容納的不重疊片段數：`(V - C) / C`
#[must_use]
pub const fn available_slots(video_seconds: u64, clip_seconds: u64) -> u64 {
    if clip_seconds == 0 {
        return 0;
    }
    video_seconds.saturating_sub(clip_seconds) / clip_seconds
}

/// 從 `0, C, 2C, ... < V - C` 中不重複抽出 `count` 個起點，順序隨機
pub fn pick_clip_starts<R: Rng + ?Sized>(
    video_seconds: u64,
    clip_seconds: u64,
    count: usize,
    rng: &mut R,
) -> Result<Vec<u64>> {
    ensure!(clip_seconds > 0, "片段長度必須大於 0");
    ensure!(count > 0, "片段數量必須大於 0");
    let available = available_slots(video_seconds, clip_seconds);
    ensure!(
        available >= count as u64,
        "影片長度不足: {video_seconds}s 只能切出 {available} 個 {clip_seconds}s 片段，需要 {count} 個（至少 {} 秒）",
        count as u64 * clip_seconds
    );

    let step = usize::try_from(clip_seconds)?;
    let mut starts: Vec<u64> = (0..video_seconds.saturating_sub(clip_seconds))
        .step_by(step)
        .collect();
    starts.shuffle(rng);
    starts.truncate(count);
    Ok(starts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::collections::HashSet;

    #[test]
    fn test_available_slots() {
        assert_eq!(available_slots(120, 3), 39);
        assert_eq!(available_slots(36, 3), 11);
        assert_eq!(available_slots(2, 3), 0);
        assert_eq!(available_slots(10, 0), 0);
    }

    #[test]
    fn test_zero_count_is_rejected() {
        let mut rng = StdRng::seed_from_u64(2);
        assert!(pick_clip_starts(2, 3, 0, &mut rng).is_err());
        assert!(pick_clip_starts(120, 3, 0, &mut rng).is_err());
    }

    #[test]
    fn test_starts_are_aligned_distinct_and_in_range() {
        let mut rng = StdRng::seed_from_u64(11);
        let starts = pick_clip_starts(120, 3, 11, &mut rng).unwrap();

        assert_eq!(starts.len(), 11);
        assert!(starts.iter().all(|s| s % 3 == 0));
        assert!(starts.iter().all(|s| s + 3 <= 120));
        assert!(starts.iter().all(|&s| s < 117));
        let unique: HashSet<_> = starts.iter().collect();
        assert_eq!(unique.len(), 11);
    }

    #[test]
    fn test_starts_never_overlap() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut starts = pick_clip_starts(600, 4, 50, &mut rng).unwrap();
        starts.sort_unstable();
        assert!(starts.windows(2).all(|w| w[1] - w[0] >= 4));
    }

    #[test]
    fn test_exact_fit_uses_every_slot() {
        // V=36, C=3: 起點 0..33 共 11 個
        let mut rng = StdRng::seed_from_u64(2);
        let mut starts = pick_clip_starts(36, 3, 11, &mut rng).unwrap();
        starts.sort_unstable();
        assert_eq!(starts, (0..33).step_by(3).collect::<Vec<u64>>());
    }

    #[test]
    fn test_too_short_is_rejected() {
        let mut rng = StdRng::seed_from_u64(0);
        assert!(pick_clip_starts(35, 3, 11, &mut rng).is_err());
        assert!(pick_clip_starts(2, 3, 1, &mut rng).is_err());
        assert!(pick_clip_starts(100, 0, 1, &mut rng).is_err());
    }

    #[test]
    fn test_seeded_order_is_reproducible() {
        let first = pick_clip_starts(300, 3, 11, &mut StdRng::seed_from_u64(9)).unwrap();
        let second = pick_clip_starts(300, 3, 11, &mut StdRng::seed_from_u64(9)).unwrap();
        assert_eq!(first, second);
    }
}
