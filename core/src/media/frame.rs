use image::{imageops, RgbaImage};

/// Delay assigned to frames that carry no timing of their own (static
/// sources entering a timeline effect).
pub const DEFAULT_DELAY_CS: u32 = 8;

/// Shortest delay the encoder will emit; most renderers clamp below this.
pub const MIN_DELAY_CS: u32 = 2;

/// A single full-canvas RGBA bitmap with its display duration.
///
/// Frames are value-like: every transform produces new instances so effects
/// can replay source frames without aliasing each other's buffers.
#[derive(Debug, Clone)]
pub struct Frame {
    pub buffer: RgbaImage,
    pub delay_cs: u32,
}

impl Frame {
    pub fn new(buffer: RgbaImage, delay_cs: u32) -> Self {
        Self { buffer, delay_cs }
    }

    pub fn width(&self) -> u32 {
        self.buffer.width()
    }

    pub fn height(&self) -> u32 {
        self.buffer.height()
    }
}

/// Ordered frames sharing one canvas size.
#[derive(Debug, Clone)]
pub struct FrameSequence {
    pub frames: Vec<Frame>,
    pub width: u32,
    pub height: u32,
    /// Netscape loop count from the source; `None` encodes as infinite.
    pub loop_count: Option<u16>,
}

impl FrameSequence {
    pub fn from_frames(frames: Vec<Frame>, loop_count: Option<u16>) -> Self {
        let (width, height) = frames
            .first()
            .map(|f| (f.width(), f.height()))
            .unwrap_or((0, 0));
        Self {
            frames,
            width,
            height,
            loop_count,
        }
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn first_delay(&self) -> u32 {
        self.frames
            .first()
            .map(|f| f.delay_cs)
            .unwrap_or(DEFAULT_DELAY_CS)
    }

    /// Pads any undersized frame onto a shared canvas so every buffer has
    /// identical dimensions.
    pub fn normalize_canvas(&mut self) {
        let width = self.frames.iter().map(Frame::width).max().unwrap_or(0);
        let height = self.frames.iter().map(Frame::height).max().unwrap_or(0);
        for frame in &mut self.frames {
            if frame.width() != width || frame.height() != height {
                let mut canvas = RgbaImage::new(width, height);
                imageops::overlay(&mut canvas, &frame.buffer, 0, 0);
                frame.buffer = canvas;
            }
        }
        self.width = width;
        self.height = height;
    }
}
