//! Command-line surface of the `well_harvest` binary.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug, Clone)]
#[command(
    name = "well_harvest",
    version,
    about = "Harvest well records from a document portal list and enrich them from detail pages"
)]
pub struct Cli {
    /// RON configuration file; every field is optional
    #[arg(long, global = true, env = "WELL_HARVEST_CONFIG")]
    pub config: Option<PathBuf>,

    /// Where log output goes
    #[arg(long, global = true, value_enum, default_value_t = LogTarget::Terminal)]
    pub log_to: LogTarget,

    /// Log file used with `--log-to file` or `--log-to both`
    #[arg(
        long,
        global = true,
        env = "WELL_HARVEST_LOG_FILE",
        default_value = "well_harvest.log"
    )]
    pub log_file: PathBuf,

    /// Log at debug level
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogTarget {
    Terminal,
    File,
    Both,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Enumerate the document list and write the discovery CSV
    Discover(DiscoverArgs),
    /// Fetch detail pages for discovered records and write the normalized CSV
    Enrich(EnrichArgs),
    /// Discover, then enrich the fresh discovery export
    Run(RunArgs),
    /// Print the effective configuration as RON
    ShowConfig,
}

/// Harvest bounds that override the configuration file.
#[derive(Args, Debug, Clone, Default)]
pub struct HarvestOptions {
    /// Consecutive cycles without new records before the list counts as exhausted
    #[arg(long, env = "WELL_HARVEST_STALL_THRESHOLD")]
    pub stall_threshold: Option<u32>,

    /// Hard upper bound on observe/advance cycles
    #[arg(long, env = "WELL_HARVEST_MAX_CYCLES")]
    pub max_cycles: Option<u32>,

    /// Milliseconds to let the list settle after each advance
    #[arg(long, env = "WELL_HARVEST_SETTLE_MS")]
    pub settle_ms: Option<u64>,
}

/// Enrichment knobs that override the configuration file.
#[derive(Args, Debug, Clone, Default)]
pub struct EnrichOptions {
    /// County to keep; repeat for several. Replaces the configured list
    #[arg(long = "county")]
    pub counties: Vec<String>,

    /// Base URL that relative record links resolve against
    #[arg(long, env = "WELL_HARVEST_BASE_URL")]
    pub base_url: Option<String>,

    /// Milliseconds between successive detail fetches
    #[arg(long, env = "WELL_HARVEST_PACING_MS")]
    pub pacing_ms: Option<u64>,

    /// Detail fetches in flight at once
    #[arg(long, env = "WELL_HARVEST_CONCURRENCY")]
    pub concurrency: Option<usize>,
}

#[derive(Args, Debug, Clone)]
pub struct DiscoverArgs {
    /// Directory of saved list renderings, replayed in file-name order
    #[arg(long)]
    pub snapshots: PathBuf,

    /// Discovery CSV to write
    #[arg(long, default_value = "well_documents.csv")]
    pub output: PathBuf,

    #[command(flatten)]
    pub harvest: HarvestOptions,
}

#[derive(Args, Debug, Clone)]
pub struct EnrichArgs {
    /// Discovery CSV to read
    #[arg(long, default_value = "well_documents.csv")]
    pub input: PathBuf,

    /// Normalized CSV to write
    #[arg(long, default_value = "well_records.csv")]
    pub output: PathBuf,

    #[command(flatten)]
    pub enrich: EnrichOptions,
}

#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    /// Directory of saved list renderings, replayed in file-name order
    #[arg(long)]
    pub snapshots: PathBuf,

    /// Discovery CSV written between the two stages
    #[arg(long, default_value = "well_documents.csv")]
    pub discovery_output: PathBuf,

    /// Normalized CSV to write
    #[arg(long, default_value = "well_records.csv")]
    pub output: PathBuf,

    #[command(flatten)]
    pub harvest: HarvestOptions,

    #[command(flatten)]
    pub enrich: EnrichOptions,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enrich_collects_repeated_counties() {
        let cli = Cli::parse_from([
            "well_harvest",
            "enrich",
            "--county",
            "Hoke",
            "--county",
            "Bladen",
            "--pacing-ms",
            "250",
        ]);
        match cli.command {
            Command::Enrich(args) => {
                assert_eq!(args.enrich.counties, vec!["Hoke", "Bladen"]);
                assert_eq!(args.enrich.pacing_ms, Some(250));
                assert_eq!(args.input, PathBuf::from("well_documents.csv"));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn global_flags_follow_the_subcommand() {
        let cli = Cli::parse_from([
            "well_harvest",
            "discover",
            "--snapshots",
            "pages",
            "-v",
            "--log-to",
            "both",
        ]);
        assert!(cli.verbose);
        assert_eq!(cli.log_to, LogTarget::Both);
        assert!(matches!(cli.command, Command::Discover(_)));
    }

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
