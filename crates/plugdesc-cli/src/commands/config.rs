use crate::GlobalOpts;
use clap::Subcommand;
use colored::*;
use plugdesc_config::{Config, KNOWN_KEYS};
use plugdesc_logger as logger;

#[derive(Subcommand, Debug, Clone)]
pub enum ConfigAction {
    /// Show the current configuration
    Show,
    /// Set a configuration value
    Set { key: String, value: String },
    /// Print the path of the configuration file
    Path,
}

pub fn handle_config(action: ConfigAction, opts: &GlobalOpts) {
    match action {
        ConfigAction::Show => match Config::load() {
            Ok(config) => {
                println!("{}", "Configuration:".bold().green());
                if config.is_empty() {
                    if opts.verbosity_level() > 0 {
                        println!("  {}", "(empty)".yellow());
                    }
                } else {
                    for (key, value) in config.values_iter() {
                        println!("  {}: {}", key.cyan(), value);
                    }
                }
            }
            Err(e) => {
                logger::error(&format!("Failed to load config: {}", e));
            }
        },
        ConfigAction::Set { key, value } => {
            let result = Config::load().and_then(|mut config| {
                config.set(&key, value.clone())?;
                config.save()
            });
            match result {
                Ok(()) => logger::success(&format!("Set {} = {}", key, value)),
                Err(e) => logger::error(&format!("Failed to set {}: {}", key, e)),
            }
        }
        ConfigAction::Path => match Config::path() {
            Ok(path) => {
                logger::debug(&format!("Known keys: {}", KNOWN_KEYS.join(", ")));
                println!("{}", path.display());
            }
            Err(e) => logger::error(&e.to_string()),
        },
    }
}
