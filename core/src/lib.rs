pub mod align;
mod color;
mod command;
mod config;
pub mod effects;
pub mod encode;
pub mod error;
pub mod media;
mod pipeline;
pub mod quant;
mod worker;

pub use command::{parse_commands, tokenize_commands, Command};
pub use config::PipelineOptions;
pub use error::{Error, Result};
pub use pipeline::{modify_image, Output, OutputFormat};
pub use worker::{CancelToken, Job, JobHandle, Worker};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Filter {
    Nearest,
    Triangle,
    CatmullRom,
    Gaussian,
    #[default]
    Lanczos3,
}

impl From<Filter> for ::image::imageops::FilterType {
    fn from(f: Filter) -> Self {
        match f {
            Filter::Nearest => ::image::imageops::FilterType::Nearest,
            Filter::Triangle => ::image::imageops::FilterType::Triangle,
            Filter::CatmullRom => ::image::imageops::FilterType::CatmullRom,
            Filter::Gaussian => ::image::imageops::FilterType::Gaussian,
            Filter::Lanczos3 => ::image::imageops::FilterType::Lanczos3,
        }
    }
}
