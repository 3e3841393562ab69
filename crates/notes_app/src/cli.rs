use std::path::PathBuf;

use clap::Parser;
use log::LevelFilter;
use notes_engine::PipelineSettings;

use crate::logging::LogDestination;

/// Convert exported HTML note bundles into markdown.
#[derive(Debug, Parser)]
#[command(name = "notes2md", version)]
pub struct Cli {
    /// Directory tree to process (defaults to the config file's root, then `.`)
    pub root: Option<PathBuf>,

    /// RON file with pipeline settings
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// External converter program
    #[arg(long, env = "NOTES2MD_CONVERTER")]
    pub converter: Option<String>,

    /// Maximum conversions in flight
    #[arg(short = 'j', long, env = "NOTES2MD_JOBS")]
    pub jobs: Option<usize>,

    /// Per-document converter timeout
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    /// Glob pattern of bundles to leave unextracted (repeatable)
    #[arg(long = "exclude", value_name = "PATTERN")]
    pub exclude: Vec<String>,

    /// Keep bundles after extracting them
    #[arg(long)]
    pub keep_bundles: bool,

    /// Leave empty markdown outputs in place
    #[arg(long)]
    pub no_archive_empty: bool,

    /// Also write the log to this file
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Print the run report as JSON
    #[arg(long)]
    pub json: bool,

    #[arg(short, long, conflicts_with = "quiet")]
    pub verbose: bool,

    #[arg(short, long)]
    pub quiet: bool,
}

impl Cli {
    /// Overrides `settings` with every flag given on the command line.
    pub fn apply(&self, settings: &mut PipelineSettings) {
        if let Some(root) = &self.root {
            settings.root = root.clone();
        }
        if let Some(program) = &self.converter {
            settings.converter.program = program.clone();
        }
        if let Some(jobs) = self.jobs {
            settings.max_concurrency = jobs;
        }
        if let Some(secs) = self.timeout_secs {
            settings.converter.timeout_secs = secs;
        }
        settings.exclude_patterns.extend(self.exclude.iter().cloned());
        if self.keep_bundles {
            settings.remove_bundles = false;
        }
        if self.no_archive_empty {
            settings.archive_empty = false;
        }
    }

    pub fn log_level(&self) -> LevelFilter {
        if self.verbose {
            LevelFilter::Debug
        } else if self.quiet {
            LevelFilter::Warn
        } else {
            LevelFilter::Info
        }
    }

    pub fn log_destination(&self) -> LogDestination {
        match &self.log_file {
            Some(path) => LogDestination::Both(path.clone()),
            None => LogDestination::Terminal,
        }
    }
}
