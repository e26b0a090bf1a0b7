//! Logger setup for the `well_harvest` binary.

use std::fs::File;
use std::path::Path;

use harvest_logging::LevelFilter;
use simplelog::{
    ColorChoice, CombinedLogger, Config, ConfigBuilder, SharedLogger, TermLogger, TerminalMode,
    WriteLogger,
};

use crate::cli::LogTarget;

pub fn level_for(verbose: bool) -> LevelFilter {
    if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    }
}

/// Initialize the global logger.
///
/// A log file that cannot be created is reported on stderr; terminal output
/// still works in that case.
pub fn initialize(target: LogTarget, log_file: &Path, level: LevelFilter) {
    let config = build_config();

    let mut loggers: Vec<Box<dyn SharedLogger>> = Vec::new();
    if matches!(target, LogTarget::Terminal | LogTarget::Both) {
        loggers.push(TermLogger::new(
            level,
            config.clone(),
            TerminalMode::Stderr,
            ColorChoice::Auto,
        ));
    }
    if matches!(target, LogTarget::File | LogTarget::Both) {
        if let Some(file_logger) = create_file_logger(log_file, level, config) {
            loggers.push(file_logger);
        }
    }
    if loggers.is_empty() {
        return;
    }

    let _ = CombinedLogger::init(loggers);
}

/// Only harvest records pass; the HTTP stack's own targets are dropped.
fn build_config() -> Config {
    ConfigBuilder::new()
        .add_filter_allow_str(harvest_logging::TARGET)
        .set_time_format_rfc3339()
        .set_target_level(LevelFilter::Error)
        .build()
}

fn create_file_logger(
    path: &Path,
    level: LevelFilter,
    config: Config,
) -> Option<Box<WriteLogger<File>>> {
    match File::create(path) {
        Ok(file) => Some(WriteLogger::new(level, config, file)),
        Err(err) => {
            eprintln!("Warning: Could not create log file at {:?}: {}", path, err);
            None
        }
    }
}
