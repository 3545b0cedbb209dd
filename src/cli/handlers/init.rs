use std::path::Path;

use crate::cli::commands::InitArgs;
use crate::io::config_io;

pub fn cmd_init(args: InitArgs, config_path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let config = config_io::write_default_config(config_path, args.force)?;
    println!("Wrote {}", config_path.display());
    if let crate::model::StoreConfig::File { path } = &config.store {
        println!("Data file: {}", path.display());
    }
    Ok(())
}
