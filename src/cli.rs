use std::ffi::OsString;
use std::path::PathBuf;

use clap::error::ErrorKind;
use clap::Parser;

use crate::domain::AppError;

#[derive(Parser, Debug)]
#[command(name = "podcast-fetch", version)]
#[command(about = "Download every episode of a podcast feed into a directory")]
pub struct Cli {
    /// URL of the RSS feed
    pub feed_url: String,

    /// Directory the episodes are saved to
    pub output_dir: PathBuf,

    /// Log every item state change
    #[arg(short, long)]
    pub verbose: bool,

    /// Stop after this many passes even if files are still being completed
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(u64).range(1..))]
    pub max_passes: Option<u64>,

    /// Print a JSON summary of the run on stdout
    #[arg(long)]
    pub json: bool,

    /// User-Agent header sent with every request
    #[arg(long)]
    pub user_agent: Option<String>,
}

impl Cli {
    /// Parse arguments; `--help` and `--version` print and exit here.
    pub fn parse_args<I, T>(args: I) -> Result<Self, AppError>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        match Self::try_parse_from(args) {
            Ok(cli) => Ok(cli),
            Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
                e.exit()
            }
            Err(e) => Err(AppError::Usage(e.to_string().trim().to_string())),
        }
    }
}

pub fn print_banner() {
    println!();
    println!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
    println!();
}

pub fn print_usage() {
    println!("How to use:");
    println!("{} http://url.to.rss /OutputPath", env!("CARGO_PKG_NAME"));
    println!();
}
