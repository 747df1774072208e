use clap::Parser;
use std::path::PathBuf;

/// Play an LRC file in Score Book mode: lyrics are shown a page at a time
/// and the page follows playback.
#[derive(Parser, Debug)]
#[command(name = "scorebook", version)]
pub struct Args {
    /// LRC file to play
    pub lrc_file: PathBuf,

    /// Config file (defaults to ~/.config/scorebook/config.toml)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Initial window height in logical pixels
    #[arg(long)]
    pub height: Option<f32>,

    /// Height of one lyric line in logical pixels
    #[arg(long)]
    pub line_height: Option<f32>,

    /// Start playback at this position (milliseconds)
    #[arg(long, default_value_t = 0)]
    pub start_ms: u64,

    /// Playback speed multiplier
    #[arg(long)]
    pub speed: Option<f64>,

    /// Start paused instead of playing
    #[arg(long)]
    pub paused: bool,
}
