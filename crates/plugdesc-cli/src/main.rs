use clap::{Parser, Subcommand};
use plugdesc::{
    commands::{
        config::{self, ConfigAction},
        generate::{self, GenerateCommand},
    },
    init_tracing, logger, GlobalOpts,
};
use plugdesc_manifest::ManifestError;

#[derive(Parser)]
#[command(name = "plugdesc")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(
    about = "Plugin descriptor generator",
    long_about = "plugdesc turns annotated declaration snapshots into a plugin.yml descriptor."
)]
struct Cli {
    #[command(flatten)]
    global: GlobalOpts,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate plugin.yml from declaration snapshots
    Generate(GenerateCommand),
    /// Configure plugdesc
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) =
        logger::init_with_verbosity(cli.global.verbosity_level(), !cli.global.no_log_file)
    {
        eprintln!("Warning: Failed to initialize logger: {}", e);
    }
    init_tracing();

    match cli.command {
        Commands::Generate(cmd) => {
            if let Err(e) = generate::handle_generate(cmd, &cli.global) {
                // Generation failures already went through the diagnostics channel
                if e.downcast_ref::<ManifestError>().is_none() {
                    logger::error(&format!("Generate failed: {:#}", e));
                }
                if let Some(path) = logger::get_log_path() {
                    eprintln!("See {} for details", path.display());
                }
                std::process::exit(1);
            }
        }
        Commands::Config { action } => {
            config::handle_config(action, &cli.global);
        }
    }
}
