use clap::Parser;
use gifmod::Filter;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "gifmod",
    about = "Applies chat-style modifier commands to GIF and PNG emotes"
)]
pub struct Cli {
    /// Source image (GIF or PNG)
    #[arg(value_name = "INPUT_FILE")]
    pub input: PathBuf,

    /// Dot-separated modifier commands, e.g. "spin-fast.rainbow"
    #[arg(value_name = "COMMANDS")]
    pub commands: String,

    #[arg(short, long, value_name = "OUTPUT_FILE")]
    pub output: Option<PathBuf>,

    /// Quantizer quality, 1-30 (lower is slower and higher quality)
    #[arg(short, long, default_value_t = 10)]
    pub quality: u8,

    #[arg(short, long, value_name = "THREADS", default_value_t = num_cpus::get())]
    pub threads: usize,

    #[arg(long, default_value = "lanczos3", value_name = "FILTER", value_parser = parse_filter)]
    pub filter: Filter,

    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

fn parse_filter(filter: &str) -> Result<Filter, String> {
    match filter.to_lowercase().as_str() {
        "nearest" => Ok(Filter::Nearest),
        "triangle" => Ok(Filter::Triangle),
        "catmullrom" => Ok(Filter::CatmullRom),
        "gaussian" => Ok(Filter::Gaussian),
        "lanczos3" => Ok(Filter::Lanczos3),
        _ => Err(format!("Invalid resize filter: {}", filter)),
    }
}
