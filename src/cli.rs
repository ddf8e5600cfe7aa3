use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "judgments",
    version,
    about = "Relevance judgment generation from imported ratings and user behavior"
)]
pub struct Cli {
    /// Turn off the judgment generation usage counters.
    #[arg(long, global = true, default_value_t = false)]
    pub disable_stats: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    Import(ImportArgs),
    Coec(CoecArgs),
    Run(RunArgs),
    LoadEvents(LoadEventsArgs),
    Status(StatusArgs),
}

#[derive(Args, Debug, Clone)]
pub struct RunDescriptorArgs {
    #[arg(long)]
    pub name: String,

    #[arg(long)]
    pub description: String,

    #[arg(long)]
    pub output: Option<PathBuf>,

    #[arg(long)]
    pub manifest_path: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct ImportArgs {
    #[arg(long, default_value = ".cache/judgments")]
    pub cache_root: PathBuf,

    /// JSON list of `{query, ratings: [{docId, rating}]}` entries, or a
    /// metadata object carrying that list under `judgmentRatings`.
    #[arg(long)]
    pub input: PathBuf,

    #[command(flatten)]
    pub run: RunDescriptorArgs,
}

#[derive(Args, Debug, Clone)]
pub struct CoecArgs {
    #[arg(long, default_value = ".cache/judgments")]
    pub cache_root: PathBuf,

    #[arg(long, conflicts_with = "events_jsonl")]
    pub events_db: Option<PathBuf>,

    #[arg(long)]
    pub events_jsonl: Option<PathBuf>,

    #[arg(long, default_value = "coec")]
    pub click_model: String,

    #[arg(long, default_value_t = 20, allow_negative_numbers = true)]
    pub max_rank: i64,

    #[arg(long, default_value_t = 3, allow_negative_numbers = true)]
    pub rounding_digits: i64,

    #[arg(long)]
    pub start_date: Option<String>,

    #[arg(long)]
    pub end_date: Option<String>,

    #[command(flatten)]
    pub run: RunDescriptorArgs,
}

/// Generation driven entirely by a judgment type name and a metadata object.
#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    #[arg(long, default_value = ".cache/judgments")]
    pub cache_root: PathBuf,

    /// `IMPORT_JUDGMENT` or `UBI_JUDGMENT`.
    #[arg(long = "type")]
    pub judgment_type: String,

    /// JSON object with `judgmentRatings` or the click model keys.
    #[arg(long)]
    pub metadata: PathBuf,

    #[arg(long, conflicts_with = "events_jsonl")]
    pub events_db: Option<PathBuf>,

    #[arg(long)]
    pub events_jsonl: Option<PathBuf>,

    #[command(flatten)]
    pub run: RunDescriptorArgs,
}

#[derive(Args, Debug, Clone)]
pub struct LoadEventsArgs {
    #[arg(long, default_value = ".cache/judgments")]
    pub cache_root: PathBuf,

    #[arg(long)]
    pub events_db: Option<PathBuf>,

    /// One behavioral event per line.
    #[arg(long)]
    pub input: PathBuf,
}

#[derive(Args, Debug, Clone)]
pub struct StatusArgs {
    #[arg(long, default_value = ".cache/judgments")]
    pub cache_root: PathBuf,

    #[arg(long)]
    pub events_db: Option<PathBuf>,
}

pub fn default_events_db(cache_root: &std::path::Path) -> PathBuf {
    cache_root.join("ubi_events.sqlite")
}
