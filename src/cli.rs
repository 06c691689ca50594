use clap::Parser;
use std::path::PathBuf;

use crate::audio::decode::ChannelMode;

#[derive(Parser, Debug)]
#[command(name = "bandprint", about = "Band-energy audio fingerprint generator")]
pub struct Cli {
    /// Input audio file (WAV, MP3, FLAC, OGG, AAC)
    pub input: PathBuf,

    /// Track identifier stored with every fingerprint (defaults to the input file stem)
    #[arg(short, long)]
    pub track_id: Option<String>,

    /// Fingerprint store file (JSON)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Config file (defaults to ./bandprint.toml or the user config dir)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// How to reduce multi-channel audio to mono
    #[arg(long, value_enum)]
    pub channel_mode: Option<ChannelMode>,

    /// Resample to this rate (Hz) before fingerprinting
    #[arg(long)]
    pub sample_rate: Option<u32>,

    /// Remove the track's existing fingerprints before inserting
    #[arg(long)]
    pub replace: bool,

    /// Print `offset_ms hash` lines to stdout
    #[arg(long)]
    pub print: bool,
}
