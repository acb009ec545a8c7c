use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum Error {
    #[error("Failed to load image: {0}")]
    ImageLoadError(#[from] image::ImageError),

    #[error("PNG encoding or I/O error: {0}")]
    PngEncodingError(#[from] png::EncodingError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Thread pool creation failed: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("Media format not supported")]
    UnsupportedFormat,

    #[error("Not a valid GIF file")]
    InvalidGifFile,

    #[error("Image has too many frames: {frames} (limit {limit})")]
    InputTooLarge { frames: usize, limit: usize },

    #[error("Source must be a non-empty byte buffer")]
    UnsupportedSource,

    #[error("A job is already in flight on this worker")]
    Busy,

    #[error("Job was cancelled")]
    Cancelled,

    #[error("Encoder produced an empty buffer for '{effect}' ({frames} frames)")]
    EncodeFailure { effect: String, frames: usize },

    #[error("Encoder state error: {0}")]
    EncoderState(&'static str),

    #[error("Invalid resize spec '{0}': expected a scale factor or WIDTHxHEIGHT")]
    InvalidResizeSpec(String),

    #[error("Invalid quality: must be between 1 and {max}, got {value}")]
    InvalidQuality { value: u8, max: u8 },

    #[error(
        "Invalid thread count: Specifying more threads than available CPU cores ({0}) is redundant"
    )]
    InvalidThreadCount(usize),

    #[error("Worker thread terminated without a result")]
    WorkerGone,
}

/// Result type of the core library
pub type Result<T> = core::result::Result<T, Error>;
