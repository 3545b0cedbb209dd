use clap::{Args, Parser, Subcommand};

use crate::model::ItemKind;

#[derive(Parser)]
#[command(name = "pln", about = concat!("planner v", env!("CARGO_PKG_VERSION"), " - a keyboard outline for goals, projects and days"), version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Read this config file instead of the default location
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<String>,

    /// Use a JSON data file as the backend
    #[arg(long, global = true, value_name = "PATH", conflicts_with = "url")]
    pub data: Option<String>,

    /// Use an HTTP API as the backend
    #[arg(long, global = true, value_name = "BASE_URL")]
    pub url: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a default config file
    Init(InitArgs),
    /// List the records of one collection
    List(ListArgs),
}

#[derive(Args)]
pub struct InitArgs {
    /// Overwrite an existing config file
    #[arg(long)]
    pub force: bool,
}

#[derive(Args)]
pub struct ListArgs {
    /// Collection: goals, projects, project_tasks, routines, routine_tasks, admin_tasks, events
    #[arg(value_parser = parse_kind)]
    pub kind: ItemKind,
    /// Include completed records
    #[arg(short, long)]
    pub all: bool,
}

/// Accept a collection name (`admin_tasks`) or a short alias (`admin`, `goal`)
pub fn parse_kind(s: &str) -> Result<ItemKind, String> {
    let s = s.trim().to_lowercase().replace('-', "_");
    if let Some(kind) = ItemKind::from_endpoint(&s) {
        return Ok(kind);
    }
    let kind = match s.as_str() {
        "goal" => ItemKind::Goal,
        "project" => ItemKind::Project,
        "project_task" | "ptask" => ItemKind::ProjectTask,
        "routine" => ItemKind::Routine,
        "routine_task" | "rtask" => ItemKind::RoutineTask,
        "admin" | "admin_task" => ItemKind::AdminTask,
        "event" => ItemKind::Event,
        _ => {
            let names: Vec<&str> = ItemKind::ALL.iter().map(|k| k.endpoint()).collect();
            return Err(format!(
                "unknown collection \"{}\" (expected one of: {})",
                s,
                names.join(", ")
            ));
        }
    };
    Ok(kind)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn kind_accepts_endpoints_and_aliases() {
        assert_eq!(parse_kind("admin_tasks"), Ok(ItemKind::AdminTask));
        assert_eq!(parse_kind("admin"), Ok(ItemKind::AdminTask));
        assert_eq!(parse_kind("Project-Tasks"), Ok(ItemKind::ProjectTask));
        assert_eq!(parse_kind("event"), Ok(ItemKind::Event));
        assert!(parse_kind("tracks").unwrap_err().contains("goals"));
    }

    #[test]
    fn list_parses_with_global_flags() {
        let cli = Cli::try_parse_from(["pln", "list", "projects", "--json", "--data", "x.json"])
            .unwrap();
        assert!(cli.json);
        assert_eq!(cli.data.as_deref(), Some("x.json"));
        match cli.command {
            Some(Commands::List(args)) => {
                assert_eq!(args.kind, ItemKind::Project);
                assert!(!args.all);
            }
            _ => panic!("expected list"),
        }
    }

    #[test]
    fn data_and_url_conflict() {
        assert!(
            Cli::try_parse_from(["pln", "--data", "x.json", "--url", "http://localhost"]).is_err()
        );
    }
}
