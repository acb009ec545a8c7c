//! Horizontal liquid wobble.
//!
//! The canvas is split into stripes of height `max(1, height / 32)`; each
//! stripe slides left or right by a running shift that ping-pongs between 0
//! and a margin derived from the wiggle width. The walk continues from
//! stripe to stripe and from frame to frame, so the wave rolls through the
//! image instead of snapping.

use image::RgbaImage;
use rayon::prelude::*;

use super::blit;
use crate::{
    align::align,
    error::Result,
    media::{Frame, FrameSequence},
};

pub fn wiggle(sequence: &FrameSequence, step: u32) -> Result<FrameSequence> {
    let (width, height) = (sequence.width, sequence.height);
    let margin = ((width as f32 * step as f32 * 0.1 / 15.0).floor() as u32).max(1);
    let interval = (2 * margin) as usize;
    let stripe_height = (height / 32).max(1);

    let aligned = align(&sequence.frames, interval);
    let frames: Vec<Frame> = aligned
        .par_iter()
        .enumerate()
        .map(|(i, frame)| {
            let phase = (i % interval) as u32;
            // Triangle wave over the cycle seeds the first stripe.
            let (mut shift, mut direction) = if phase < margin {
                (phase as i64, 1i64)
            } else {
                ((2 * margin - phase) as i64, -1i64)
            };

            let mut canvas = RgbaImage::new(width + margin, height);
            let mut y = 0;
            while y < height {
                let band = stripe_height.min(height - y);
                blit(&mut canvas, &frame.buffer, shift, y as i64, 0, y, width, band);

                shift += direction;
                if shift <= 0 {
                    shift = 0;
                    direction = 1;
                } else if shift >= margin as i64 {
                    shift = margin as i64;
                    direction = -1;
                }
                y += band;
            }
            Frame::new(canvas, frame.delay_cs)
        })
        .collect();

    Ok(FrameSequence::from_frames(frames, sequence.loop_count))
}
