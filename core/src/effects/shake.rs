//! Diagonal jitter on a common cadence.
//!
//! The shake state advances every `step` centiseconds while source frames
//! advance on their own delays; the two clocks are reconciled by splitting
//! each frame at shake-state boundaries (the gcd/lcm cadence) and merging
//! any resulting sliver below the encoder's minimum delay.

use image::RgbaImage;

use super::{blit, normalize_delays};
use crate::{
    error::Result,
    media::{Frame, FrameSequence, MIN_DELAY_CS},
};

/// Offset states as (dst_x, dst_y, src_x, src_y) margin bits, cycling
/// 0011 -> 0110 -> 1100 -> 1001.
const STATES: [(u32, u32, u32, u32); 4] = [(0, 0, 1, 1), (0, 1, 1, 0), (1, 1, 0, 0), (1, 0, 0, 1)];

pub fn shake(sequence: &FrameSequence, step: u32) -> Result<FrameSequence> {
    let step_cs = step.max(MIN_DELAY_CS);
    let (width, height) = (sequence.width, sequence.height);
    let margin = (width.min(height) / 15).max(1);

    let mut out = Vec::new();
    let mut elapsed: u32 = 0;
    for frame in &sequence.frames {
        let delay = frame.delay_cs.max(MIN_DELAY_CS);
        let end = elapsed + delay;
        while elapsed < end {
            let state = STATES[((elapsed / step_cs) % 4) as usize];
            let boundary = (elapsed / step_cs + 1) * step_cs;
            let segment_end = boundary.min(end);
            out.push(Frame::new(
                shifted(&frame.buffer, margin, state),
                segment_end - elapsed,
            ));
            elapsed = segment_end;
        }
    }

    let out = normalize_delays(out, MIN_DELAY_CS);
    Ok(FrameSequence::from_frames(out, sequence.loop_count))
}

fn shifted(src: &RgbaImage, margin: u32, state: (u32, u32, u32, u32)) -> RgbaImage {
    let (dx, dy, sx, sy) = state;
    let mut canvas = RgbaImage::new(src.width(), src.height());
    blit(
        &mut canvas,
        src,
        (dx * margin) as i64,
        (dy * margin) as i64,
        sx * margin,
        sy * margin,
        src.width() - margin,
        src.height() - margin,
    );
    canvas
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sequence(frame_count: usize, delay_cs: u32) -> FrameSequence {
        let frames = (0..frame_count)
            .map(|_| Frame::new(RgbaImage::new(16, 16), delay_cs))
            .collect();
        FrameSequence::from_frames(frames, None)
    }

    #[test]
    fn no_delay_falls_below_minimum() {
        let shaken = shake(&sequence(8, 4), 8).unwrap();
        assert!(shaken.frames.iter().all(|f| f.delay_cs >= MIN_DELAY_CS));
    }

    #[test]
    fn total_duration_is_preserved() {
        let source = sequence(8, 4);
        let shaken = shake(&source, 8).unwrap();
        let before: u32 = source.frames.iter().map(|f| f.delay_cs).sum();
        let after: u32 = shaken.frames.iter().map(|f| f.delay_cs).sum();
        assert_eq!(before, after);
    }

    #[test]
    fn fast_shake_splits_slow_frames() {
        // A 10 cs frame with a 2 cs shake step must split into 5 segments.
        let shaken = shake(&sequence(1, 10), 2).unwrap();
        assert_eq!(shaken.len(), 5);
        assert!(shaken.frames.iter().all(|f| f.delay_cs == 2));
    }
}
