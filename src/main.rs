use anyhow::Result;
use audio_format_batch_normalize::{NormalizationOptions, normalize_folder};
use clap::Parser;
use log::{error, info};
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// directory containing the wav files to convert, searched recursively
    #[arg(short, long)]
    path: PathBuf,

    /// target bit depth (e.g. 16, 24)
    #[arg(short, long = "bitdepth")]
    bitdepth: u32,

    /// target sample rate in Hz (e.g. 48000)
    #[arg(short = 'r', long = "samplerate")]
    samplerate: u32,

    /// disable dither during conversion (passes `-D` to sox)
    #[arg(long)]
    no_dither: bool,

    /// print the raw sox output of every file
    #[arg(long)]
    debug: bool,

    /// sox executable to use
    #[arg(long, default_value = "sox")]
    sox: PathBuf,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    _ = pretty_env_logger::formatted_builder()
        .filter_level(if cli.debug {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Info
        })
        .format_timestamp_secs()
        .parse_default_env()
        .try_init();

    let options = NormalizationOptions {
        input_dir: cli.path,
        sample_rate: cli.samplerate,
        bit_depth: cli.bitdepth,
        no_dither: cli.no_dither,
        debug: cli.debug,
        sox_program: cli.sox,
    };

    info!("Starting conversion with options:");
    info!("  Directory: {:?}", options.input_dir);
    info!("  Target Bit Depth: {}-bit", options.bit_depth);
    info!("  Target Sample Rate: {} Hz", options.sample_rate);
    info!("  Dither: {}", if options.no_dither { "off" } else { "on" });
    info!("---");

    match normalize_folder(&options) {
        Ok(_) => {
            info!("All files are at the target format.");
            Ok(())
        }
        Err(e) => {
            error!("Conversion incomplete: {}", e);
            Err(e)?
        }
    }
}
