//! CLI parser.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "friend")]
#[command(about = "Find a friend for the moment: match a message against everyone who wrote before", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Corpus file; overrides DATA_PATH.
    #[arg(long, global = true)]
    pub data_path: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum Commands {
    /// Submit a message: rank the corpus, ask the model for relevant matches, then store it.
    Submit {
        #[arg(short, long)]
        nickname: String,
        #[arg(short, long)]
        text: String,
        /// Print the outcome as JSON instead of text.
        #[arg(long)]
        json: bool,
    },
    /// List the newest stored messages.
    List {
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },
}
