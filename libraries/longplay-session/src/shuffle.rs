//! Queue shuffling

use longplay_core::Track;
use rand::seq::SliceRandom;
use rand::Rng;

/// Shuffle every track after the first (Fisher-Yates)
///
/// The first slot holds the current track and stays put, so enabling shuffle
/// never interrupts what is playing.
pub fn shuffle_after_first<R: Rng + ?Sized>(tracks: &mut [Track], rng: &mut R) {
    if tracks.len() > 2 {
        tracks[1..].shuffle(rng);
    }
}
