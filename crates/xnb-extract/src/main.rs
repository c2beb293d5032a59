//! xnb-extract - unpack XNB asset containers
//!
//! Decodes one `.xnb` file and writes every texture level as PNG, every
//! sound effect as WAV and the decoded object graph as `index.json`.

mod sink;

use std::fs::{self, File};
use std::io::{self, BufRead, Read, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use flate2::read::GzDecoder;
use tracing::{error, info};
use xnb::{decode_xnb_with_options, DecodeError, DecodeOptions, DecodedFile};

use crate::sink::FsSink;

#[derive(Parser, Debug)]
#[command(name = "xnb-extract")]
#[command(about = "Extract textures, sounds and an object index from XNB files")]
#[command(version)]
struct Cli {
    /// XNB file to process
    input: PathBuf,

    /// Output directory for extracted resources
    #[arg(short, long, default_value = "./xnb_output")]
    output: PathBuf,

    /// Treat the input file as gzip-compressed
    #[arg(short = 'z', long)]
    gzipped: bool,

    /// Overwrite an existing output directory without asking
    #[arg(short, long)]
    yes: bool,

    /// Narrow 16-bit texture channels by halving, like older tools
    #[arg(long)]
    legacy_narrowing: bool,

    /// Size mip levels from their stored byte counts (halving chain)
    #[arg(long)]
    mip_chain_extents: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_writer(io::stderr)
        .init();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err:#}");
            let code = err
                .downcast_ref::<DecodeError>()
                .map_or(1, |e| e.code().exit_code());
            ExitCode::from(u8::try_from(code).unwrap_or(1))
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    if cli.output.is_dir() && !cli.yes && !confirm_overwrite(&cli.output)? {
        anyhow::bail!("output directory {} left untouched", cli.output.display());
    }

    let bytes = read_input(&cli.input, cli.gzipped)?;
    let options = DecodeOptions {
        legacy_channel_narrowing: cli.legacy_narrowing,
        mip_chain_extents: cli.mip_chain_extents,
        ..DecodeOptions::default()
    };
    let file = decode_xnb_with_options(&bytes, &options)
        .with_context(|| format!("failed to decode {}", cli.input.display()))?;
    log_summary(&file);

    fs::create_dir_all(&cli.output)
        .with_context(|| format!("failed to create {}", cli.output.display()))?;
    let mut sink = FsSink::new(&cli.output);
    file.emit(&mut sink)?;
    info!(files = sink.written(), output = %cli.output.display(), "done");
    Ok(())
}

fn read_input(path: &Path, gzipped: bool) -> Result<Vec<u8>> {
    let file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    let mut bytes = Vec::new();
    if gzipped {
        GzDecoder::new(file)
            .read_to_end(&mut bytes)
            .with_context(|| format!("failed to decompress {}", path.display()))?;
    } else {
        io::BufReader::new(file)
            .read_to_end(&mut bytes)
            .with_context(|| format!("failed to read {}", path.display()))?;
    }
    Ok(bytes)
}

fn confirm_overwrite(dir: &Path) -> Result<bool> {
    eprint!("Output directory {} already exists. Overwrite? [y/N] ", dir.display());
    io::stderr().flush()?;
    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}

fn log_summary(file: &DecodedFile) {
    let header = &file.header;
    info!(
        platform = header.platform.name(),
        format = header.format_version_name().unwrap_or("unknown"),
        profile = ?header.profile,
        size = header.file_size,
        "header"
    );
    for (i, reader) in file.readers.iter().enumerate() {
        info!(index = i, name = %reader.name, version = reader.version, "type reader");
    }
    info!(
        shared = file.graph.shared.len(),
        artifacts = file.artifacts.len(),
        warnings = file.warnings.len(),
        "decoded"
    );
}
