//! Frame alignment for effects that need an exact-interval period.
//!
//! The list is repeated until it reaches the interval, then the surplus
//! `len % interval` frames are pruned, spread round-robin across the copies
//! so no single repetition loses a disproportionate share. If pruning would
//! remove more than 20% of the frames, another full copy is appended first.

use rand::Rng;

use crate::media::Frame;

pub fn align(frames: &[Frame], interval: usize) -> Vec<Frame> {
    if frames.is_empty() || interval == 0 {
        return frames.to_vec();
    }

    let mut copies = 1usize;
    while frames.len() * copies < interval {
        copies += 1;
    }
    // Deleting more than a fifth of the frames drops visible motion.
    while (frames.len() * copies) % interval * 5 > frames.len() * copies {
        copies += 1;
    }

    let mut aligned = Vec::with_capacity(frames.len() * copies);
    for _ in 0..copies {
        aligned.extend_from_slice(frames);
    }

    let to_delete = aligned.len() % interval;
    let mut rng = rand::thread_rng();
    let mut current_copy = 0usize;
    for _ in 0..to_delete {
        let index_in_copy = rng.gen_range(0..frames.len());
        let index = (current_copy * frames.len() + index_in_copy).min(aligned.len() - 1);
        aligned.remove(index);
        current_copy = (current_copy + 1) % copies;
    }

    aligned
}
