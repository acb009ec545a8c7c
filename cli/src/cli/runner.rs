use crate::cli::args::Cli;
use anyhow::{Context, Result};
use gifmod::{parse_commands, tokenize_commands, Job, PipelineOptions, Worker};
use std::fs;
use std::time::Instant;

pub fn run_cli(cli: Cli) -> Result<()> {
    let bytes =
        fs::read(&cli.input).with_context(|| format!("Failed to read {}", cli.input.display()))?;

    let commands = parse_commands(&tokenize_commands(&cli.commands));
    if commands.is_empty() {
        log::warn!("No recognized commands in '{}'", cli.commands);
    }

    let options = PipelineOptions::builder()
        .quality(cli.quality)
        .num_threads(cli.threads)
        .filter(cli.filter)
        .build();

    let started = Instant::now();
    let worker = Worker::new();
    let handle = worker.submit(Job {
        bytes,
        commands,
        options,
    })?;
    let output = handle.wait()?;

    let output_path = cli.output.unwrap_or_else(|| {
        let stem = cli
            .input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "output".to_string());
        cli.input
            .with_file_name(format!("{}-modified.{}", stem, output.format.extension()))
    });

    fs::write(&output_path, &output.bytes)
        .with_context(|| format!("Failed to write {}", output_path.display()))?;

    log::info!(
        "Wrote {} ({} bytes) in {:.2?}",
        output_path.display(),
        output.bytes.len(),
        started.elapsed()
    );
    Ok(())
}
