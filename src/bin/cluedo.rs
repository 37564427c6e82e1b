use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use cluedo::{analyze, io::{load_recording, write_analysis}, report, AnalysisConfig};

#[derive(Parser, Debug)]
#[command(name = "cluedo", about = "P300 Cluedo ERP analysis: who, with what, where")]
struct Args {
    /// Recording container (.safetensors with EEG, markers, sampleRate, channelNames)
    #[arg(long)]
    input: PathBuf,

    /// JSON analysis config; missing fields use the Cluedo defaults
    #[arg(long)]
    config: Option<PathBuf>,

    /// Channels to analyse, comma-separated (overrides the config; default: Fz)
    #[arg(long)]
    channels: Option<String>,

    /// Post-stimulus epoch length in seconds (overrides the config)
    #[arg(long)]
    epoch_time: Option<f64>,

    /// Pre-stimulus baseline length in seconds (overrides the config)
    #[arg(long)]
    preepoch_time: Option<f64>,

    /// Write category stacks and peak matrices here for plotting
    #[arg(long)]
    dump: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let mut cfg = match &args.config {
        Some(path) => AnalysisConfig::from_json_file(path)?,
        None => AnalysisConfig::default(),
    };
    if let Some(ch) = &args.channels {
        cfg.channels = ch
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();
    }
    if let Some(t) = args.epoch_time {
        cfg.epoch_time = t;
    }
    if let Some(t) = args.preepoch_time {
        cfg.preepoch_time = t;
    }

    let rec = load_recording(&args.input)?;
    println!("channels x samples: ({}, {})", rec.n_channels(), rec.n_samples());

    let analysis = analyze(&rec, &cfg)
        .with_context(|| format!("analysing {}", args.input.display()))?;
    println!(
        "{} epochs of {} samples over {} channel(s)",
        analysis.n_epochs,
        analysis.epoch_samples,
        analysis.channel_names.len()
    );
    println!();
    print!("{}", report::render(&analysis));

    if let Some(out) = &args.dump {
        write_analysis(&analysis, out)?;
        eprintln!("Written → {}", out.display());
    }
    Ok(())
}
