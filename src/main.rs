mod audio;
mod cli;
mod config;
mod dsp;
mod fingerprint;
mod store;

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};

use cli::Cli;
use config::Config;
use fingerprint::FingerprintPipeline;
use store::FingerprintStore;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let cli = Cli::parse();

    let config = match config::find_config(cli.config.as_deref()) {
        Some(path) => {
            let cfg = config::load_config(&path)?;
            log::info!("Loaded config from {}", path.display());
            cfg
        }
        None => Config::default(),
    };

    // CLI values win over the config file
    let channel_mode = cli.channel_mode.unwrap_or(config.audio.channel_mode);
    let target_rate = cli.sample_rate.or(config.audio.target_sample_rate);
    let store_path = cli.output.clone().unwrap_or(config.store.path);

    if !cli.input.exists() {
        anyhow::bail!("Input file not found: {}", cli.input.display());
    }
    let track_id = match cli.track_id {
        Some(ref id) => id.clone(),
        None => cli
            .input
            .file_stem()
            .and_then(|s| s.to_str())
            .map(str::to_string)
            .context("Cannot derive a track id from the input path; pass --track-id")?,
    };

    log::info!("bandprint - audio fingerprint generator");
    log::info!("Input: {}", cli.input.display());
    log::info!("Track: {}", track_id);
    log::info!("Store: {}", store_path.display());

    // 1. Decode
    log::info!("Decoding audio...");
    let mut audio = audio::decode::decode_audio(&cli.input, channel_mode)?;

    // 2. Resample
    if let Some(rate) = target_rate {
        if rate != audio.sample_rate {
            log::info!("Resampling {}Hz -> {}Hz...", audio.sample_rate, rate);
            audio = audio::resample::resample(&audio, rate)?;
        }
    }

    // 3. Fingerprint
    let pipeline = FingerprintPipeline::new(&config.fingerprint, audio.sample_rate)
        .context("Invalid fingerprint configuration")?;
    let total_blocks = audio.len() / pipeline.layout().block_len;
    log::info!(
        "Fingerprinting {} block(s), {} sub-fingerprints each...",
        total_blocks,
        pipeline.layout().hash_count()
    );
    if total_blocks == 0 {
        log::warn!(
            "Audio is {:.2}s, shorter than one {:.2}s block; nothing to fingerprint",
            audio.duration_secs(),
            config.fingerprint.block_seconds
        );
    }

    let pb = ProgressBar::new(total_blocks as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} blocks ({eta} remaining)")
            .context("Invalid progress bar template")?
            .progress_chars("=>-"),
    );

    let sequence = pipeline.fingerprint_track(&audio, &track_id, |_| pb.inc(1))?;
    pb.finish_with_message("Fingerprinting complete");

    log::info!(
        "Generated {} sub-fingerprints from {} block(s)",
        sequence.len(),
        total_blocks
    );

    if cli.print {
        for fp in &sequence.fingerprints {
            println!("{:>10} {:08x}", fp.offset_ms, fp.hash);
        }
    }

    // 4. Store
    let mut store = FingerprintStore::load(&store_path)?;
    if cli.replace {
        let removed = store.remove_track(&track_id);
        log::info!("Removed {} existing records for {}", removed, track_id);
    }
    let inserted = store.insert_sequence(&sequence);
    store.save(&store_path)?;

    log::info!(
        "Stored {} new records ({} already present); store now holds {} records",
        inserted,
        sequence.len().saturating_sub(inserted),
        store.len()
    );
    Ok(())
}
