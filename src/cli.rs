use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start prospecta as a service.
    Daemon {},

    /// Score stored prospects against the client portfolio
    Search {
        /// Region filter (defaults to the configured region)
        #[clap(short, long)]
        region: Option<String>,

        /// Max results
        #[clap(short, long)]
        limit: Option<usize>,

        /// Scoring method: "tfidf" or "embedding"
        #[clap(short, long)]
        method: Option<String>,
    },

    /// Discover new prospects, merge them into the store and rescore
    Refresh {
        /// Target region
        #[clap(short, long)]
        region: Option<String>,

        /// Comma-separated industry seeds
        /// (defaults to the best-client profile industries)
        #[clap(short, long)]
        industries: Option<String>,

        /// Comma-separated keyword seeds
        /// (defaults to the best-client profile tags)
        #[clap(short, long)]
        keywords: Option<String>,

        /// Max results
        #[clap(short, long)]
        limit: Option<usize>,

        /// Scoring method: "tfidf" or "embedding"
        #[clap(short, long)]
        method: Option<String>,
    },
}
