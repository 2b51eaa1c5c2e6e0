use clap::Parser;
use pnc_console::cli::dispatcher::Dispatcher;
use pnc_console::cli::main_types::Cli;
use pnc_console::storage::config::Config;
use pnc_console::utils::logging::init_logging;
use std::path::PathBuf;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config_path = cli
        .config_dir
        .as_ref()
        .map(|dir| PathBuf::from(dir).join("config.toml"));

    let config = match Config::load(config_path.clone()) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("Error loading config: {}", err);
            std::process::exit(1);
        }
    };

    if let Some(config_dir) = &cli.config_dir {
        log::debug!("using config directory {}", config_dir);
    }

    let mut dispatcher = Dispatcher::new(config, config_path, cli.profile, cli.token, cli.verbose);

    if let Err(e) = dispatcher.dispatch(cli.command).await {
        eprintln!("{} {}", e.severity().emoji(), e);
        if let Some(hint) = e.troubleshooting_hint() {
            eprintln!("💡 {}", hint);
        }
        std::process::exit(1);
    }
}
