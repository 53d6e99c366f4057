use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[clap(name = "calorie-tracker")]
#[clap(about = "Log meals from photos with AI calorie and protein estimates", long_about = None)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Analyze a meal photo and log the estimate
    Analyze {
        image: PathBuf,
        /// Day to log the meal under (YYYY-MM-DD, default today)
        #[clap(short, long)]
        date: Option<NaiveDate>,
    },
    /// Log a meal entered by hand
    Add {
        name: String,
        #[clap(short, long, allow_negative_numbers = true)]
        calories: i64,
        #[clap(short, long, allow_negative_numbers = true)]
        protein: i64,
        #[clap(short, long)]
        date: Option<NaiveDate>,
    },
    /// Show the meals and totals of a day
    List {
        #[clap(short, long)]
        date: Option<NaiveDate>,
        /// Every logged meal, newest first
        #[clap(short, long, conflicts_with = "date")]
        all: bool,
    },
    Delete {
        id: i64,
    },
    /// Run the response extractor on a file (or stdin) and print JSON
    Parse {
        file: Option<PathBuf>,
    },
    /// Serve the HTTP API
    #[cfg(feature = "api-server")]
    Serve {
        #[clap(short, long)]
        port: Option<u16>,
    },
}
