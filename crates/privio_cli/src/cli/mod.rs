use clap::{ArgAction, Parser, Subcommand};
use privio_core::config::ConfigOverrides;
use privio_core::model::Priority;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about = "Local task manager", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Output JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Override configuration values (format KEY=VALUE)
    #[arg(long = "config-override", value_name = "KEY=VALUE", global = true)]
    pub config_override: Vec<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Add a new task
    ///
    /// Example: privio add "Buy milk" --priority high --due 2026-10-20
    Add {
        title: Option<String>,
        #[arg(short, long, default_value = "")]
        description: String,
        /// RFC3339, "YYYY-MM-DD HH:MM[:SS]" or "YYYY-MM-DD"
        #[arg(long, value_name = "DATE")]
        due: Option<String>,
        #[arg(short, long)]
        priority: Option<Priority>,
    },
    /// Edit fields of a task
    ///
    /// Example: privio edit <id> --title "Buy organic milk" --clear-due
    Edit {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(short, long)]
        description: Option<String>,
        #[arg(long, value_name = "DATE", conflicts_with = "clear_due")]
        due: Option<String>,
        #[arg(long)]
        clear_due: bool,
        #[arg(short, long)]
        priority: Option<Priority>,
    },
    /// Delete a task
    ///
    /// Example: privio delete <id>
    Delete { id: String },
    /// Mark a task as completed, or reopen a completed one
    ///
    /// Example: privio toggle <id>
    Toggle { id: String },
    /// List visible tasks, sorted by priority
    ///
    /// Example: privio list --priority high --search groceries --all
    List {
        #[arg(short, long)]
        priority: Option<Priority>,
        #[arg(short, long)]
        search: Option<String>,
        /// Include completed tasks
        #[arg(long)]
        all: bool,
    },
    /// Set the search text for this session and list matches
    ///
    /// Example: privio search groceries
    Search { query: Option<String> },
    /// Set the priority filter for this session (omit to clear) and list matches
    ///
    /// Example: privio priority high
    #[command(name = "priority")]
    PriorityFilter { level: Option<Priority> },
    /// Show or hide completed tasks for this session
    ///
    /// Example: privio show-completed true
    ShowCompleted {
        #[arg(action = ArgAction::Set)]
        show: bool,
    },
    /// Show task counts
    Stats,
    /// Delete every task
    Clear,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigOverrideTarget {
    StoreDir,
    DefaultPriority,
    ShowCompleted,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedConfigOverride {
    pub target: ConfigOverrideTarget,
    pub value: String,
}

/// Parse a raw `KEY=VALUE` override string into a structured target.
pub fn parse_config_override(raw: &str) -> Result<ParsedConfigOverride, String> {
    let (key_raw, value_raw) = raw
        .trim()
        .split_once('=')
        .ok_or_else(|| "override must be in KEY=VALUE format".to_string())?;

    let key = canonicalize_flag_name(key_raw)
        .ok_or_else(|| "override key cannot be empty".to_string())?;
    let target = match key.as_str() {
        "store_dir" => ConfigOverrideTarget::StoreDir,
        "default_priority" | "priority" => ConfigOverrideTarget::DefaultPriority,
        "show_completed" => ConfigOverrideTarget::ShowCompleted,
        other => return Err(format!("unknown config field '{other}'")),
    };

    Ok(ParsedConfigOverride {
        target,
        value: value_raw.trim().to_string(),
    })
}

/// Fold parsed overrides into the structure the core merges over the file.
pub fn collect_config_overrides(raw: &[String]) -> Result<ConfigOverrides, String> {
    let mut overrides = ConfigOverrides::default();
    for entry in raw {
        let parsed = parse_config_override(entry)?;
        match parsed.target {
            ConfigOverrideTarget::StoreDir => {
                if parsed.value.is_empty() {
                    return Err("store_dir override cannot be empty".to_string());
                }
                overrides.store_dir = Some(PathBuf::from(parsed.value));
            }
            ConfigOverrideTarget::DefaultPriority => {
                let priority = parsed
                    .value
                    .parse::<Priority>()
                    .map_err(|err| err.message().to_string())?;
                overrides.default_priority = Some(priority);
            }
            ConfigOverrideTarget::ShowCompleted => {
                let show = match parsed.value.to_ascii_lowercase().as_str() {
                    "true" | "yes" | "on" | "1" => true,
                    "false" | "no" | "off" | "0" => false,
                    other => return Err(format!("show_completed must be a boolean (got '{other}')")),
                };
                overrides.show_completed = Some(show);
            }
        }
    }
    Ok(overrides)
}

fn canonicalize_flag_name(name: &str) -> Option<String> {
    let mut cleaned = String::new();
    let mut previous_underscore = false;

    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() {
            cleaned.push(ch.to_ascii_lowercase());
            previous_underscore = false;
        } else if !previous_underscore && !cleaned.is_empty() {
            cleaned.push('_');
            previous_underscore = true;
        }
    }

    let trimmed = cleaned.trim_matches('_');
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
