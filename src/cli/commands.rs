use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "page-reader")]
#[command(author, version, about = "Index a page once and chat about its content", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Page to analyze: its canonical URL and a file holding its readable text
#[derive(Args, Clone)]
pub struct PageArgs {
    #[arg(short, long)]
    pub url: String,

    #[arg(short, long)]
    pub file: PathBuf,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Index a page without asking anything
    Index {
        #[command(flatten)]
        page: PageArgs,
    },

    /// Index a page and ask a single question about it
    Ask {
        #[command(flatten)]
        page: PageArgs,

        question: String,
    },

    /// Index a page and start an interactive chat about it
    Interactive {
        #[command(flatten)]
        page: PageArgs,
    },
}
