//! The command pipeline.
//!
//! Precedence is fixed: a shrinking resize runs first to cut the cost of
//! everything after it; each timeline command then runs as its own
//! decode-transform-encode pass over the working buffer (only the first one
//! ever sees the original source format, later ones always receive a GIF);
//! the plain commands run last in one combined pass. A failure anywhere
//! aborts the whole request; no partially-modified output is ever returned.

use rayon::ThreadPoolBuilder;

use crate::{
    command::Command,
    config::PipelineOptions,
    effects::{geometry, infinite, rain, rainbow, rotate, shake, slide, wiggle},
    encode::GifEncoder,
    error::{Error, Result},
    media::{FrameSequence, Media},
    worker::CancelToken,
};

/// Pixels below this alpha are keyed out as fully transparent.
const TRANSPARENCY_THRESHOLD: u8 = 128;

/// Reserved key color flagged transparent in the encoded GIF.
const TRANSPARENT_KEY: [u8; 3] = [0, 255, 0];

/// Bounded retry around the final encode, for the empty-output signature
/// only. No delay between attempts.
const EMPTY_OUTPUT_RETRIES: u32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Gif,
    Png,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Gif => "gif",
            OutputFormat::Png => "png",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Output {
    pub bytes: Vec<u8>,
    pub format: OutputFormat,
}

pub fn modify_image(
    bytes: &[u8],
    commands: &[Command],
    options: &PipelineOptions,
    cancel: &CancelToken,
) -> Result<Output> {
    options.validate()?;
    if bytes.is_empty() {
        return Err(Error::UnsupportedSource);
    }
    cancel.check()?;

    let pool = ThreadPoolBuilder::new()
        .num_threads(options.num_threads)
        .build()?;
    pool.install(|| run_pipeline(bytes, commands, options, cancel))
}

fn run_pipeline(
    bytes: &[u8],
    commands: &[Command],
    options: &PipelineOptions,
    cancel: &CancelToken,
) -> Result<Output> {
    let mut animated = match image::guess_format(bytes)? {
        image::ImageFormat::Gif => true,
        image::ImageFormat::Png => false,
        _ => return Err(Error::UnsupportedFormat),
    };
    log::info!(
        "Modifying {} source ({} bytes) with {} commands",
        if animated { "gif" } else { "png" },
        bytes.len(),
        commands.len()
    );

    if commands.is_empty() {
        return Ok(Output {
            bytes: bytes.to_vec(),
            format: if animated {
                OutputFormat::Gif
            } else {
                OutputFormat::Png
            },
        });
    }

    let shrink_index = find_priority_shrink(commands)?;
    let timeline: Vec<(usize, &Command)> = commands
        .iter()
        .enumerate()
        .filter(|(_, c)| c.is_gif_context())
        .collect();
    let plain: Vec<(usize, &Command)> = commands
        .iter()
        .enumerate()
        .filter(|(i, c)| !c.is_gif_context() && shrink_index != Some(*i))
        .collect();

    let mut working = bytes.to_vec();

    // Shrinking early keeps every later pass cheap. The re-encode keeps the
    // source format, so the first timeline command still sees the original
    // kind of input.
    if let Some(index) = shrink_index {
        cancel.check()?;
        let mut sequence = decode_sequence(&working)?;
        geometry::apply(&mut sequence, &commands[index], options.filter.into())?;
        log::debug!("Applied priority shrink, canvas now {}x{}", sequence.width, sequence.height);
        working = if animated {
            encode_gif(&sequence, options, "resize", cancel)?
        } else {
            encode_png(&sequence)?
        };
    }

    for (_, command) in &timeline {
        cancel.check()?;
        let sequence = decode_sequence(&working)?;
        log::debug!(
            "Applying '{}' ({} frames, {}x{})",
            command.name(),
            sequence.len(),
            sequence.width,
            sequence.height
        );
        let transformed = apply_timeline_command(command, &sequence)?;
        working = encode_gif(&transformed, options, command.name(), cancel)?;
    }
    animated = animated || !timeline.is_empty();

    if !plain.is_empty() {
        cancel.check()?;
        let mut sequence = decode_sequence(&working)?;
        for (_, command) in &plain {
            log::debug!("Applying '{}'", command.name());
            geometry::apply(&mut sequence, command, options.filter.into())?;
        }
        working = if animated {
            encode_gif(&sequence, options, "plain", cancel)?
        } else {
            encode_png(&sequence)?
        };
    }

    Ok(Output {
        bytes: working,
        format: if animated {
            OutputFormat::Gif
        } else {
            OutputFormat::Png
        },
    })
}

/// The first resize command, when it shrinks (scale at most 1), is pulled to
/// the front of the pipeline.
fn find_priority_shrink(commands: &[Command]) -> Result<Option<usize>> {
    for (index, command) in commands.iter().enumerate() {
        if let Command::Resize { spec } = command {
            return match geometry::parse_resize_spec(spec)? {
                geometry::ResizeTarget::Scale(scale) if scale <= 1.0 => Ok(Some(index)),
                _ => Ok(None),
            };
        }
    }
    Ok(None)
}

fn apply_timeline_command(command: &Command, sequence: &FrameSequence) -> Result<FrameSequence> {
    match command {
        Command::Spin { step } => rotate::spin(sequence, *step, false),
        Command::SpinRev { step } => rotate::spin(sequence, *step, true),
        Command::Shake { step } => shake::shake(sequence, *step),
        Command::Rainbow { step } => rainbow::rainbow(sequence, *step),
        Command::Wiggle { step } => wiggle::wiggle(sequence, *step),
        Command::Infinite { step } => infinite::infinite(sequence, *step),
        Command::Slide { step } => slide::slide(sequence, *step, false),
        Command::SlideRev { step } => slide::slide(sequence, *step, true),
        Command::Rain { glitter } => rain::rain(sequence, *glitter),
        _ => Err(Error::EncoderState("plain command in timeline pass")),
    }
}

fn decode_sequence(bytes: &[u8]) -> Result<FrameSequence> {
    Ok(Media::from_memory(bytes)?.into_sequence())
}

fn encode_gif(
    sequence: &FrameSequence,
    options: &PipelineOptions,
    effect: &str,
    cancel: &CancelToken,
) -> Result<Vec<u8>> {
    for attempt in 1..=EMPTY_OUTPUT_RETRIES {
        let bytes = encode_gif_once(sequence, options, cancel)?;
        if !bytes.is_empty() {
            if attempt > 1 {
                log::info!("Encode succeeded on attempt {}", attempt);
            }
            return Ok(bytes);
        }
        log::warn!(
            "Encoder produced an empty buffer after '{}' (attempt {}/{})",
            effect,
            attempt,
            EMPTY_OUTPUT_RETRIES
        );
    }
    Err(Error::EncodeFailure {
        effect: effect.to_string(),
        frames: sequence.len(),
    })
}

fn encode_gif_once(
    sequence: &FrameSequence,
    options: &PipelineOptions,
    cancel: &CancelToken,
) -> Result<Vec<u8>> {
    let mut encoder = GifEncoder::new(sequence.width, sequence.height);
    encoder.set_quality(options.quality);
    encoder.set_repeat(sequence.loop_count.unwrap_or(0));
    encoder.start()?;

    for frame in &sequence.frames {
        cancel.check()?;
        encoder.set_delay(frame.delay_cs.min(u16::MAX as u32) as u16);

        let (keyed, has_transparency) = key_transparency(&frame.buffer);
        if has_transparency {
            encoder.set_transparent(Some(TRANSPARENT_KEY));
            encoder.set_dispose(2);
        } else {
            encoder.set_transparent(None);
            encoder.set_dispose(0);
        }
        encoder.add_frame(&keyed)?;
    }

    encoder.finish()?;
    Ok(encoder.get_and_reset_buffer())
}

/// Replaces sub-threshold-alpha pixels with the reserved key color so the
/// quantizer gives them their own palette entry.
fn key_transparency(buffer: &image::RgbaImage) -> (image::RgbaImage, bool) {
    let mut keyed = buffer.clone();
    let mut has_transparency = false;
    for pixel in keyed.pixels_mut() {
        if pixel.0[3] < TRANSPARENCY_THRESHOLD {
            pixel.0 = [TRANSPARENT_KEY[0], TRANSPARENT_KEY[1], TRANSPARENT_KEY[2], 255];
            has_transparency = true;
        }
    }
    (keyed, has_transparency)
}

fn encode_png(sequence: &FrameSequence) -> Result<Vec<u8>> {
    let frame = sequence
        .frames
        .first()
        .ok_or(Error::EncoderState("empty sequence for png output"))?;
    crate::media::Image::from_buffer(frame.buffer.clone()).write_to_memory()
}
