use std::path::PathBuf;

use clap::Subcommand;
use pressroom_core::clips::generate_all;
use pressroom_core::error::Result;
use pressroom_core::Config;

#[derive(Subcommand)]
pub enum ClipsAction {
    /// Render the notification clips as WAV files
    Generate {
        /// Output directory (defaults to the configured clip directory)
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

pub fn run(action: ClipsAction) -> Result<()> {
    match action {
        ClipsAction::Generate { out } => {
            let dir = match out {
                Some(dir) => dir,
                None => Config::load()?.clip_dir()?,
            };
            for path in generate_all(&dir)? {
                println!("{}", path.display());
            }
        }
    }
    Ok(())
}
