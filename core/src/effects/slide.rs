//! Cyclic horizontal scroll.
//!
//! Content shifts by `width / (2 * step)` pixels each frame; pixels leaving
//! one edge re-enter at the other, realized as two blits around the seam.

use image::RgbaImage;
use rayon::prelude::*;

use super::blit;
use crate::{
    align::align,
    error::Result,
    media::{Frame, FrameSequence},
};

pub fn slide(sequence: &FrameSequence, step: u32, reverse: bool) -> Result<FrameSequence> {
    let (width, height) = (sequence.width, sequence.height);
    let shift_px = (width / (2 * step).max(1)).max(1);
    let interval = (2 * step).max(1) as usize;

    let aligned = align(&sequence.frames, interval);
    let frames: Vec<Frame> = aligned
        .par_iter()
        .enumerate()
        .map(|(i, frame)| {
            let mut offset = (i as u32 * shift_px) % width;
            if reverse {
                offset = (width - offset) % width;
            }
            let mut canvas = RgbaImage::new(width, height);
            blit(
                &mut canvas,
                &frame.buffer,
                offset as i64,
                0,
                0,
                0,
                width - offset,
                height,
            );
            blit(
                &mut canvas,
                &frame.buffer,
                0,
                0,
                width - offset,
                0,
                offset,
                height,
            );
            Frame::new(canvas, frame.delay_cs)
        })
        .collect();

    Ok(FrameSequence::from_frames(frames, sequence.loop_count))
}
