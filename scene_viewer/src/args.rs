//! Command line arguments

use std::path::PathBuf;
use clap::Parser;

/// View a scene file in a window
#[derive(Parser, Debug)]
#[command(about, version)]
pub struct ViewerArgs {
    /// Scene file to open, relative to the scenes directory
    #[arg(default_value = "scene1.json")]
    pub scene: PathBuf,

    /// Engine configuration file (`.toml` or `.ron`)
    #[arg(long)]
    pub config: Option<PathBuf>,
}
