use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "cmdrelay")]
#[command(about = "Cmdrelay CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show version
    Version,

    /// Run the relay: consume message events from the broker and execute
    /// authorized managers' commands, replying with the output.
    Run {
        /// Config file path (default: ./config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<std::path::PathBuf>,
    },
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Version) => {
            println!("cmdrelay {}", env!("CARGO_PKG_VERSION"));
        }
        Some(Commands::Run { config }) => {
            if let Err(e) = run_relay(config).await {
                log::error!("relay failed: {}", e);
                std::process::exit(1);
            }
        }
        None => {
            println!("Run with --help for usage");
        }
    }
}

async fn run_relay(config_path: Option<std::path::PathBuf>) -> anyhow::Result<()> {
    let (config, path) = lib::config::load_config(config_path)?;
    log::info!(
        "loaded config from {} ({} manager(s))",
        path.display(),
        config.managers.len()
    );
    lib::relay::run_relay(config).await
}
