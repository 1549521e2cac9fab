//! Random start offset for background music.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Create the generator used for one plan build.
pub fn plan_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

/// Draw a start offset for a music clip that outlasts the video.
///
/// Samples uniformly in `[0, clip_secs - video_secs]` `max(retry_limit, 1)`
/// times and returns the last draw. Returns 0 without touching the generator
/// when the clip is not longer than the video.
pub fn sample_music_offset<R: Rng + ?Sized>(
    rng: &mut R,
    clip_secs: f64,
    video_secs: f64,
    retry_limit: u32,
) -> f64 {
    let span = (clip_secs - video_secs).max(0.0);
    if span <= 0.0 || !span.is_finite() {
        return 0.0;
    }

    let mut last = 0.0;
    for _ in 0..retry_limit.max(1) {
        last = rng.gen_range(0.0..=span);
    }
    last
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_clip_gets_no_offset() {
        let mut rng = plan_rng(Some(1));
        assert_eq!(sample_music_offset(&mut rng, 4.0, 5.0, 3), 0.0);
        assert_eq!(sample_music_offset(&mut rng, 5.0, 5.0, 3), 0.0);
    }

    #[test]
    fn offset_stays_in_range() {
        let mut rng = plan_rng(Some(99));
        for _ in 0..500 {
            let v = sample_music_offset(&mut rng, 20.0, 5.0, 3);
            assert!((0.0..=15.0).contains(&v));
        }
    }

    #[test]
    fn keeps_last_of_retry_draws() {
        let mut a = plan_rng(Some(7));
        let mut b = plan_rng(Some(7));
        let drawn = sample_music_offset(&mut a, 30.0, 10.0, 3);

        let mut expected = 0.0;
        for _ in 0..3 {
            expected = b.gen_range(0.0..=20.0);
        }
        assert_eq!(drawn, expected);
    }

    #[test]
    fn zero_retry_limit_still_draws_once() {
        let mut a = plan_rng(Some(3));
        let mut b = plan_rng(Some(3));
        assert_eq!(
            sample_music_offset(&mut a, 30.0, 10.0, 0),
            sample_music_offset(&mut b, 30.0, 10.0, 1)
        );
    }

    #[test]
    fn same_seed_same_offset() {
        let first = sample_music_offset(&mut plan_rng(Some(42)), 60.0, 5.0, 4);
        let second = sample_music_offset(&mut plan_rng(Some(42)), 60.0, 5.0, 4);
        assert_eq!(first, second);
    }
}
