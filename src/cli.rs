//! # CLI - Command Line Interface for the Swarm Simulation
//!
//! A single `run` subcommand drives the core: load the configuration block,
//! the arena and obstacle description files, build the engine and step it
//! for the requested number of ticks, optionally persisting the result.
//!
//! **Usage**:
//! ```bash
//! swarmsim-rs run --config params.toml --arena arenas.txt --obst obstacles.txt \
//!     --steps 5000 --seed 42 --output-dir ./data/simulation/
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the flocking simulation
    Run {
        /// TOML configuration block (defaults apply when omitted)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Arena description file
        #[arg(long = "arena")]
        arena: Option<PathBuf>,

        /// Obstacle description file
        #[arg(long = "obst")]
        obst: Option<PathBuf>,

        /// Number of ticks to simulate
        #[arg(short, long, default_value_t = 5000)]
        steps: u64,

        /// Master seed for all randomness streams
        #[arg(long, default_value_t = 42)]
        seed: u64,

        /// Flag agent 0 as leader
        #[arg(long, default_value_t = false)]
        leader: bool,

        /// Target point "x,y" activating the tracking branches
        #[arg(long)]
        target: Option<String>,

        /// Persist the run result under this directory
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Tag used in output file names
        #[arg(long, default_value = "run")]
        tag: String,

        /// Capture a snapshot every N ticks into the result
        #[arg(long, default_value_t = 100)]
        frame_interval: u64,
    },
}
