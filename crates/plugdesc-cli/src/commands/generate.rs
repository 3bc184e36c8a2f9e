use crate::messager::LoggerMessager;
use crate::snapshot_loader::load_snapshots;
use crate::GlobalOpts;
use anyhow::Result;
use clap::Args;
use plugdesc_config::Config;
use plugdesc_logger as logger;
use plugdesc_manifest::{
    diagnostics, Aggregator, AggregatorOptions, RunOutcome, SnapshotScanner,
};
use std::path::PathBuf;

#[derive(Args, Debug, Clone)]
pub struct GenerateCommand {
    /// Declaration snapshot files or directories ("-" reads stdin)
    #[arg(short, long = "declarations", value_name = "PATH", required = true, num_args = 1..)]
    pub declarations: Vec<PathBuf>,

    /// Build output root the descriptor is written under
    #[arg(short, long, value_name = "DIR")]
    pub output: Option<PathBuf>,

    /// Version written when the plugin declares none
    #[arg(long, value_name = "VERSION")]
    pub default_version: Option<String>,

    /// Print the descriptor to stdout instead of writing it
    #[arg(long)]
    pub dry_run: bool,
}

impl GenerateCommand {
    /// Flags first, then the config file, then built-in defaults
    pub fn options(&self, config: &Config) -> AggregatorOptions {
        let defaults = AggregatorOptions::default();
        AggregatorOptions {
            output_root: self
                .output
                .clone()
                .or_else(|| config.output_dir.as_ref().map(PathBuf::from))
                .unwrap_or(defaults.output_root),
            artifact_name: config.artifact_name.clone().unwrap_or(defaults.artifact_name),
            default_version: self
                .default_version
                .clone()
                .or_else(|| config.default_version.clone())
                .unwrap_or(defaults.default_version),
            tool_id: config.tool_id.clone().unwrap_or(defaults.tool_id),
        }
    }
}

pub fn handle_generate(cmd: GenerateCommand, _opts: &GlobalOpts) -> Result<()> {
    let config = Config::load().unwrap_or_else(|e| {
        logger::warn(&format!("Failed to load config, using defaults: {}", e));
        Config::default()
    });

    let snapshot = load_snapshots(&cmd.declarations)?;
    let scanner = SnapshotScanner::new(snapshot);
    let aggregator = Aggregator::new(cmd.options(&config));
    let mut messager = LoggerMessager::new();

    if cmd.dry_run {
        let Some(doc) = aggregator.assemble(&scanner, &mut messager)? else {
            logger::info("No plugin main class found; nothing to render");
            return Ok(());
        };
        let rendered = aggregator
            .writer()
            .render(&doc)
            .map_err(|e| diagnostics::report(&mut messager, e))?;
        print!("{}", rendered);
        return Ok(());
    }

    match aggregator.process(&scanner, &mut messager)? {
        RunOutcome::Skipped => {
            logger::info("No plugin main class found; nothing generated");
        }
        RunOutcome::Written(path) => {
            logger::success(&format!("Generated {}", path.display()));
        }
    }
    Ok(())
}
