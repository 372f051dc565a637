//! CLI argument definitions

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "frontdesk")]
#[command(author, version, about = "Clinic assistant routing core, from the terminal")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file (defaults to the platform config dir)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Interactive chat session
    Chat,

    /// One-shot question through the full router
    Ask {
        /// The user utterance
        query: String,
    },

    /// Run the retrieval pipeline directly and dump the ranked passages
    Retrieve {
        /// The search query
        query: String,

        /// How many passages to return
        #[arg(long, default_value_t = 5)]
        top_k: usize,

        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,
    },
}
