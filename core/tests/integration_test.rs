extern crate gifmod;

use gifmod::encode::GifEncoder;
use gifmod::{
    modify_image, parse_commands, tokenize_commands, CancelToken, Command, Error, OutputFormat,
    PipelineOptions,
};
use image::codecs::gif::GifDecoder;
use image::{AnimationDecoder, Rgba, RgbaImage};
use std::io::Cursor;

// Helper to build an in-memory GIF with uniform delays
fn make_gif(frame_count: usize, size: u32, delay_cs: u16) -> Vec<u8> {
    let mut encoder = GifEncoder::new(size, size);
    encoder.set_repeat(0);
    encoder.start().unwrap();
    for i in 0..frame_count {
        encoder.set_delay(delay_cs);
        let shade = (i * 40 % 256) as u8;
        let frame = RgbaImage::from_pixel(size, size, Rgba([shade, 120, 200, 255]));
        encoder.add_frame(&frame).unwrap();
    }
    encoder.finish().unwrap();
    encoder.get_and_reset_buffer()
}

fn make_png(size: u32) -> Vec<u8> {
    let buffer = RgbaImage::from_pixel(size, size, Rgba([180, 60, 60, 255]));
    let mut bytes = Vec::new();
    buffer
        .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
        .unwrap();
    bytes
}

fn decode_frames(bytes: &[u8]) -> Vec<image::Frame> {
    let decoder = GifDecoder::new(Cursor::new(bytes)).unwrap();
    decoder.into_frames().collect_frames().unwrap()
}

fn delay_cs(frame: &image::Frame) -> u32 {
    let (numerator, denominator) = frame.delay().numer_denom_ms();
    (numerator as f64 / denominator.max(1) as f64 / 10.0).round() as u32
}

fn run(bytes: &[u8], commands: Vec<Command>) -> gifmod::Result<gifmod::Output> {
    modify_image(
        bytes,
        &commands,
        &PipelineOptions::default(),
        &CancelToken::new(),
    )
}

// A 4-frame, 10 cs source spun at step 8 makes one full rotation in
// floor(360 / 18) = 20 frames, each advanced by 18 degrees.
#[test]
fn spin_produces_twenty_frame_rotation() {
    let source = make_gif(4, 16, 10);
    let output = run(&source, vec![Command::Spin { step: 8 }]).unwrap();
    assert_eq!(output.format, OutputFormat::Gif);

    let frames = decode_frames(&output.bytes);
    assert_eq!(frames.len(), 20);
    for frame in &frames {
        assert_eq!(frame.buffer().dimensions(), (16, 16));
        assert_eq!(delay_cs(frame), 10);
    }
}

// Shake must never emit a frame faster than the encoder's 2 cs floor.
#[test]
fn shake_keeps_delays_at_or_above_minimum() {
    let source = make_gif(8, 16, 4);
    let output = run(&source, vec![Command::Shake { step: 8 }]).unwrap();
    let frames = decode_frames(&output.bytes);
    assert!(!frames.is_empty());
    for frame in &frames {
        assert!(
            delay_cs(frame) >= 2,
            "frame delay {} cs is below the floor",
            delay_cs(frame)
        );
    }
}

// 201 frames must be rejected up front, before any pixel processing.
#[test]
fn oversized_source_is_rejected() {
    let source = make_gif(201, 4, 4);
    let err = run(&source, vec![Command::Reverse]).unwrap_err();
    assert!(matches!(
        err,
        Error::InputTooLarge {
            frames: 201,
            limit: 200
        }
    ));
}

// A static source with only plain commands stays a PNG.
#[test]
fn static_source_with_plain_commands_stays_png() {
    let source = make_png(8);
    let output = run(
        &source,
        vec![Command::Resize {
            spec: "2".to_string(),
        }],
    )
    .unwrap();
    assert_eq!(output.format, OutputFormat::Png);

    let decoded = image::load_from_memory(&output.bytes).unwrap().into_rgba8();
    assert_eq!(decoded.dimensions(), (16, 16));
}

// Any timeline command turns a static source into a GIF.
#[test]
fn static_source_with_timeline_command_becomes_gif() {
    let source = make_png(12);
    let output = run(&source, vec![Command::Slide { step: 8 }]).unwrap();
    assert_eq!(output.format, OutputFormat::Gif);

    let frames = decode_frames(&output.bytes);
    assert_eq!(frames.len(), 16);
}

// Timeline commands chain by re-encoding between passes.
#[test]
fn timeline_commands_chain() {
    let source = make_gif(2, 12, 6);
    let output = run(
        &source,
        vec![Command::Shake { step: 8 }, Command::Rain { glitter: false }],
    )
    .unwrap();
    assert_eq!(output.format, OutputFormat::Gif);
    assert!(!decode_frames(&output.bytes).is_empty());
}

#[test]
fn plain_commands_apply_in_one_final_pass() {
    let source = make_gif(4, 8, 10);
    let output = run(&source, vec![Command::Hyperspeed, Command::Reverse]).unwrap();
    let frames = decode_frames(&output.bytes);
    assert_eq!(frames.len(), 4);
    for frame in &frames {
        assert_eq!(delay_cs(frame), 5);
    }
}

#[test]
fn speed_overrides_every_delay() {
    let source = make_gif(3, 8, 10);
    let output = run(&source, vec![Command::Speed { delay_cs: 4.0 }]).unwrap();
    let frames = decode_frames(&output.bytes);
    assert_eq!(frames.len(), 3);
    for frame in &frames {
        assert_eq!(delay_cs(frame), 4);
    }
}

#[test]
fn empty_input_is_unsupported() {
    let err = run(&[], vec![Command::Reverse]).unwrap_err();
    assert!(matches!(err, Error::UnsupportedSource));
}

#[test]
fn unsupported_format_is_rejected() {
    let bytes = [0xFFu8, 0xD8, 0xFF, 0xE0, 0, 0, 0, 0];
    let err = run(&bytes, vec![Command::Reverse]).unwrap_err();
    assert!(matches!(
        err,
        Error::UnsupportedFormat | Error::ImageLoadError(_)
    ));
}

#[test]
fn malformed_resize_spec_fails_the_request() {
    let source = make_gif(2, 8, 6);
    let err = run(
        &source,
        vec![Command::Resize {
            spec: "64x64}".to_string(),
        }],
    )
    .unwrap_err();
    assert!(matches!(err, Error::InvalidResizeSpec(_)));
}

#[test]
fn no_commands_returns_source_unchanged() {
    let source = make_gif(2, 8, 6);
    let output = run(&source, vec![]).unwrap();
    assert_eq!(output.bytes, source);
    assert_eq!(output.format, OutputFormat::Gif);
}

// Full trip through the text interface: tokenize, parse, run.
#[test]
fn dot_syntax_drives_the_pipeline() {
    let commands = parse_commands(&tokenize_commands("sliderev-hyper.flip"));
    assert_eq!(
        commands,
        vec![
            Command::SlideRev { step: 2 },
            Command::Flip { vertical: false }
        ]
    );

    let source = make_gif(2, 8, 6);
    let output = run(&source, commands).unwrap();
    assert_eq!(output.format, OutputFormat::Gif);
    assert_eq!(decode_frames(&output.bytes).len(), 4);
}

// Transparent pixels survive the encode as transparency, not key color.
#[test]
fn transparency_round_trips() {
    let mut buffer = RgbaImage::from_pixel(8, 8, Rgba([200, 40, 40, 255]));
    for y in 0..4 {
        for x in 0..4 {
            buffer.put_pixel(x, y, Rgba([0, 0, 0, 0]));
        }
    }
    let mut encoder = GifEncoder::new(8, 8);
    encoder.set_repeat(0);
    encoder.start().unwrap();
    encoder.set_delay(10);
    encoder.set_transparent(Some([0, 255, 0]));
    encoder.set_dispose(2);
    let mut keyed = buffer.clone();
    for pixel in keyed.pixels_mut() {
        if pixel.0[3] < 128 {
            pixel.0 = [0, 255, 0, 255];
        }
    }
    encoder.add_frame(&keyed).unwrap();
    encoder.finish().unwrap();

    let frames = decode_frames(&encoder.get_and_reset_buffer());
    assert_eq!(frames.len(), 1);
    let decoded = frames[0].buffer();
    assert_eq!(
        decoded.get_pixel(0, 0).0[3],
        0,
        "keyed corner should decode transparent"
    );
    assert_eq!(decoded.get_pixel(7, 7).0[3], 255);
}
