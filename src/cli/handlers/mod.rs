mod init;
pub use init::cmd_init;

use std::path::PathBuf;

use crate::cli::commands::*;
use crate::cli::output::*;
use crate::io::{config_io, open_store};
use crate::model::{AppConfig, StoreConfig};

// ---------------------------------------------------------------------------
// Config resolution
// ---------------------------------------------------------------------------

/// `--config`, else the platform default location
pub fn config_path(cli: &Cli) -> PathBuf {
    cli.config
        .as_ref()
        .map(PathBuf::from)
        .unwrap_or_else(config_io::default_config_path)
}

/// `--data` / `--url` replace the configured backend
pub fn apply_overrides(cli: &Cli, config: &mut AppConfig) {
    if let Some(path) = &cli.data {
        config.store = StoreConfig::File {
            path: PathBuf::from(path),
        };
    } else if let Some(url) = &cli.url {
        let timeout_secs = match &config.store {
            StoreConfig::Http { timeout_secs, .. } => *timeout_secs,
            StoreConfig::File { .. } => 10,
        };
        config.store = StoreConfig::Http {
            base_url: url.clone(),
            timeout_secs,
        };
    }
}

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

pub fn dispatch(cli: Cli, config: &AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let json = cli.json;
    let path = config_path(&cli);
    match cli.command {
        None => Err("no subcommand given (try `pln --help`)".into()),
        Some(Commands::Init(args)) => cmd_init(args, &path),
        Some(Commands::List(args)) => cmd_list(args, config, json),
    }
}

fn cmd_list(
    args: ListArgs,
    config: &AppConfig,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut store = open_store(&config.store)?;
    let snapshot = store.load()?;
    let records = ordered_records(&snapshot, args.kind, args.all);

    if json {
        let out = CollectionJson {
            kind: args.kind,
            records: records.iter().map(|r| record_to_json(r)).collect(),
        };
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    if records.is_empty() {
        println!("No {}.", args.kind.endpoint().replace('_', " "));
        return Ok(());
    }
    let mut parent: Option<&str> = None;
    for record in records {
        if args.kind.parent_kind().is_some() && record.parent_id.as_deref() != parent {
            parent = record.parent_id.as_deref();
            println!("{}:", parent.unwrap_or("(no parent)"));
        }
        let indent = if args.kind.parent_kind().is_some() { "  " } else { "" };
        println!("{}{}", indent, format_record_line(&snapshot, args.kind, record));
    }
    Ok(())
}
