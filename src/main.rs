use clap::Parser;
use planner::cli::commands::{Cli, Commands};
use planner::cli::handlers;
use planner::io::{config_io, logging, open_store};

fn main() {
    let cli = Cli::parse();
    let config_path = handlers::config_path(&cli);

    // Init runs before the config exists
    if let Some(Commands::Init(_)) = cli.command {
        if let Err(e) = handlers::dispatch(cli, &Default::default()) {
            eprintln!("error: {}", e);
            std::process::exit(1);
        }
        return;
    }

    let mut config = match config_io::read_config(&config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {}", e);
            std::process::exit(1);
        }
    };
    handlers::apply_overrides(&cli, &mut config);

    // Flushes the log file on drop
    let _log_guard = match logging::init_logging(&config.log) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("warning: logging disabled: {}", e);
            None
        }
    };

    match cli.command {
        None => {
            // No subcommand → launch TUI
            let result = open_store(&config.store)
                .map_err(Box::<dyn std::error::Error>::from)
                .and_then(|store| planner::tui::run(&config, store));
            if let Err(e) = result {
                tracing::error!(error = %e, "exiting");
                eprintln!("error: {}", e);
                std::process::exit(1);
            }
        }
        Some(_) => {
            if let Err(e) = handlers::dispatch(cli, &config) {
                eprintln!("error: {}", e);
                std::process::exit(1);
            }
        }
    }
}
