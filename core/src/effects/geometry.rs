//! The plain commands: per-frame geometry and timing with no dependence on
//! the animation timeline. They run together in one final pass.

use image::{imageops, imageops::FilterType};

use super::rotate;
use crate::{
    command::Command,
    error::{Error, Result},
    media::{Frame, FrameSequence, MIN_DELAY_CS},
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ResizeTarget {
    Scale(f32),
    Exact { width: u32, height: u32 },
}

/// Strict resize spec: a float scale factor or `WIDTHxHEIGHT`. Anything
/// else, including trailing junk, is rejected rather than guessed at.
pub fn parse_resize_spec(spec: &str) -> Result<ResizeTarget> {
    let spec = spec.trim();
    if let Ok(scale) = spec.parse::<f32>() {
        if scale > 0.0 && scale.is_finite() {
            return Ok(ResizeTarget::Scale(scale));
        }
        return Err(Error::InvalidResizeSpec(spec.to_string()));
    }
    if let Some((w, h)) = spec.split_once('x') {
        if let (Ok(width), Ok(height)) = (w.parse::<u32>(), h.parse::<u32>()) {
            if width > 0 && height > 0 {
                return Ok(ResizeTarget::Exact { width, height });
            }
        }
    }
    Err(Error::InvalidResizeSpec(spec.to_string()))
}

pub fn apply(sequence: &mut FrameSequence, command: &Command, filter: FilterType) -> Result<()> {
    match command {
        Command::Flip { vertical } => {
            for frame in &mut sequence.frames {
                frame.buffer = if *vertical {
                    imageops::flip_vertical(&frame.buffer)
                } else {
                    imageops::flip_horizontal(&frame.buffer)
                };
            }
        }
        Command::Reverse => sequence.frames.reverse(),
        Command::Speed { delay_cs } => {
            let delay = (delay_cs.round() as u32).max(MIN_DELAY_CS);
            for frame in &mut sequence.frames {
                frame.delay_cs = delay;
            }
        }
        Command::Hyperspeed => {
            let plan = hyperspeed_plan(&sequence.frames);
            let frames = std::mem::take(&mut sequence.frames);
            sequence.frames = frames
                .into_iter()
                .zip(plan)
                .filter_map(|(mut frame, op)| match op {
                    FramePlan::Keep { delay_cs } => {
                        frame.delay_cs = delay_cs;
                        Some(frame)
                    }
                    FramePlan::Drop => None,
                })
                .collect();
        }
        Command::Resize { spec } => {
            resize_sequence(sequence, parse_resize_spec(spec)?, filter);
        }
        Command::Rotate { degrees } => {
            *sequence = rotate::rotate_sequence(sequence, *degrees);
        }
        _ => {
            // Timeline commands never reach the plain pass.
            return Err(Error::EncoderState("timeline command in plain pass"));
        }
    }
    Ok(())
}

pub fn resize_sequence(sequence: &mut FrameSequence, target: ResizeTarget, filter: FilterType) {
    let (width, height) = match target {
        ResizeTarget::Scale(scale) => (
            ((sequence.width as f32 * scale).round() as u32).max(1),
            ((sequence.height as f32 * scale).round() as u32).max(1),
        ),
        ResizeTarget::Exact { width, height } => (width, height),
    };
    if (width, height) == (sequence.width, sequence.height) {
        log::debug!("Skipping resize: Target dimensions match original.");
        return;
    }
    log::debug!(
        "Resizing from {}x{} to {}x{}",
        sequence.width,
        sequence.height,
        width,
        height
    );
    for frame in &mut sequence.frames {
        frame.buffer = imageops::resize(&frame.buffer, width, height, filter);
    }
    sequence.width = width;
    sequence.height = height;
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum FramePlan {
    Keep { delay_cs: u32 },
    Drop,
}

/// Halves each delay; frames that cannot be halved without dropping under
/// the encoder minimum are thinned out instead, every second one deleted
/// with the survivors keeping their original delay.
fn hyperspeed_plan(frames: &[Frame]) -> Vec<FramePlan> {
    frames
        .iter()
        .enumerate()
        .map(|(i, frame)| {
            let halved = frame.delay_cs / 2;
            if halved >= MIN_DELAY_CS {
                FramePlan::Keep { delay_cs: halved }
            } else if i % 2 == 0 {
                FramePlan::Keep {
                    delay_cs: frame.delay_cs,
                }
            } else {
                FramePlan::Drop
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    fn sequence(frame_count: usize, delay_cs: u32) -> FrameSequence {
        let frames = (0..frame_count)
            .map(|i| {
                let shade = (i * 50 % 256) as u8;
                Frame::new(
                    RgbaImage::from_pixel(8, 4, Rgba([shade, 0, 0, 255])),
                    delay_cs,
                )
            })
            .collect();
        FrameSequence::from_frames(frames, None)
    }

    #[test]
    fn parse_accepts_scale_and_exact() {
        assert_eq!(parse_resize_spec("0.5").unwrap(), ResizeTarget::Scale(0.5));
        assert_eq!(
            parse_resize_spec("64x32").unwrap(),
            ResizeTarget::Exact { width: 64, height: 32 }
        );
    }

    #[test]
    fn parse_rejects_malformed_specs() {
        for spec in ["64x32}", "x", "0", "-1", "64x", "wide"] {
            assert!(
                matches!(parse_resize_spec(spec), Err(Error::InvalidResizeSpec(_))),
                "spec '{}' should be rejected",
                spec
            );
        }
    }

    #[test]
    fn hyperspeed_halves_generous_delays() {
        let mut seq = sequence(4, 10);
        apply(&mut seq, &Command::Hyperspeed, FilterType::Nearest).unwrap();
        assert_eq!(seq.len(), 4);
        assert!(seq.frames.iter().all(|f| f.delay_cs == 5));
    }

    #[test]
    fn hyperspeed_thins_fast_animations() {
        let mut seq = sequence(6, 3);
        apply(&mut seq, &Command::Hyperspeed, FilterType::Nearest).unwrap();
        assert_eq!(seq.len(), 3);
        assert!(seq.frames.iter().all(|f| f.delay_cs == 3));
    }

    #[test]
    fn reverse_flips_frame_order() {
        let mut seq = sequence(3, 4);
        let first = seq.frames[0].buffer.get_pixel(0, 0).0;
        apply(&mut seq, &Command::Reverse, FilterType::Nearest).unwrap();
        assert_eq!(seq.frames[2].buffer.get_pixel(0, 0).0, first);
    }

    #[test]
    fn resize_scale_changes_canvas() {
        let mut seq = sequence(2, 4);
        apply(
            &mut seq,
            &Command::Resize { spec: "0.5".to_string() },
            FilterType::Nearest,
        )
        .unwrap();
        assert_eq!((seq.width, seq.height), (4, 2));
        assert!(seq.frames.iter().all(|f| f.width() == 4 && f.height() == 2));
    }

    #[test]
    fn flip_mirrors_pixels() {
        let mut seq = FrameSequence::from_frames(
            vec![Frame::new(
                RgbaImage::from_fn(4, 1, |x, _| {
                    if x == 0 {
                        Rgba([255, 0, 0, 255])
                    } else {
                        Rgba([0, 0, 0, 255])
                    }
                }),
                4,
            )],
            None,
        );
        apply(
            &mut seq,
            &Command::Flip { vertical: false },
            FilterType::Nearest,
        )
        .unwrap();
        assert_eq!(
            seq.frames[0].buffer.get_pixel(3, 0),
            &Rgba([255, 0, 0, 255])
        );
    }
}
