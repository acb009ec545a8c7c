//! Falling-drop overlay.
//!
//! `(width + height) / 5` drops with randomized position, speed, length and
//! thickness; glitter mode randomizes each drop's color instead of the fixed
//! blue. The generator is seeded once for the whole render, so a drop keeps
//! its color and pace across frames and only its position advances. Drops
//! leaving the bottom wrap back in from the top.

use image::{Rgba, RgbaImage};
use rand::Rng;
use rayon::prelude::*;

use crate::{
    error::Result,
    media::{Frame, FrameSequence},
};

const RAIN_BLUE: Rgba<u8> = Rgba([0, 120, 255, 255]);

/// Frames a static source is expanded to before simulating.
const STATIC_FRAMES: usize = 8;

struct Drop {
    x: u32,
    y: u32,
    speed: u32,
    length: u32,
    thickness: u32,
    color: Rgba<u8>,
}

pub fn rain(sequence: &FrameSequence, glitter: bool) -> Result<FrameSequence> {
    let (width, height) = (sequence.width, sequence.height);

    let mut source = sequence.frames.clone();
    if source.len() == 1 {
        let frame = source[0].clone();
        source = vec![frame; STATIC_FRAMES];
    }
    let delay = source.first().map(|f| f.delay_cs).unwrap_or(8).max(2);

    let mut rng = rand::thread_rng();
    let count = ((width + height) / 5).max(1) as usize;
    let drops: Vec<Drop> = (0..count)
        .map(|_| Drop {
            x: rng.gen_range(0..width),
            y: rng.gen_range(0..height),
            speed: (rng.gen::<f32>() * delay as f32 + delay as f32).floor() as u32,
            length: rng.gen_range(delay..=delay * 2).max(2),
            thickness: rng.gen_range(1..=2),
            color: if glitter {
                Rgba([rng.gen(), rng.gen(), rng.gen(), 255])
            } else {
                RAIN_BLUE
            },
        })
        .collect();

    let frames: Vec<Frame> = source
        .par_iter()
        .enumerate()
        .map(|(i, frame)| {
            let mut buffer = frame.buffer.clone();
            for drop in &drops {
                draw_drop(&mut buffer, drop, i as u32, height);
            }
            Frame::new(buffer, frame.delay_cs)
        })
        .collect();

    Ok(FrameSequence::from_frames(frames, sequence.loop_count))
}

fn draw_drop(buffer: &mut RgbaImage, drop: &Drop, frame_index: u32, height: u32) {
    let span = height + drop.length;
    let head = (drop.y + frame_index * drop.speed) % span;
    for k in 0..drop.length {
        if k > head {
            break;
        }
        let y = head - k;
        if y >= height {
            continue;
        }
        for t in 0..drop.thickness {
            let x = drop.x + t;
            if x < buffer.width() {
                buffer.put_pixel(x, y, drop.color);
            }
        }
    }
}
