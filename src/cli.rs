use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "gifsqueeze")]
#[command(author, version, about = "Compress animated GIFs to a target file size")]
#[command(subcommand_negates_reqs = true)]
pub struct Cli {
    /// Animation to compress
    #[arg(required = true)]
    pub input: Option<PathBuf>,

    /// Where to write the result
    #[arg(required = true)]
    pub output: Option<PathBuf>,

    /// Target size in KB (1 KB = 1024 bytes)
    #[arg(short, long)]
    pub target: Option<f64>,

    /// Minimum percentage of frames to keep
    #[arg(short = 'm', long)]
    pub min_frames: Option<f64>,

    /// Worker count (0 = one per logical core)
    #[arg(short = 'j', long)]
    pub threads: Option<usize>,

    /// Print the run report as JSON
    #[arg(long)]
    pub json: bool,

    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Compress every GIF in a directory, sweeping the frame floor
    Sweep {
        /// Directory containing input GIFs
        dir: PathBuf,

        /// Directory to write results into
        out_dir: PathBuf,

        /// Highest frame floor, in percent
        #[arg(long, default_value = "50")]
        from: u32,

        /// Lowest frame floor, in percent
        #[arg(long, default_value = "5")]
        to: u32,

        /// Floor decrement, in percent
        #[arg(long, default_value = "5")]
        step: u32,

        /// Target size in KB
        #[arg(short, long)]
        target: Option<f64>,

        /// Worker count (0 = one per logical core)
        #[arg(short = 'j', long)]
        threads: Option<usize>,
    },

    /// Probe an animation and display frame information
    Probe {
        /// File to probe
        #[arg(required = true)]
        file: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Check that the external encoder is available
    CheckTools,
}
