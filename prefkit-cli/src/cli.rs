//! Command-line arguments.

use clap::{Parser, Subcommand};
use prefkit_core::PreferenceKind;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "prefkit")]
#[command(about = "Read, write and watch preferences in an LMDB-backed store")]
#[command(version)]
pub struct Cli {
    /// Configuration file (falls back to PREFKIT_CONFIG)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Print the value of a key
    Get {
        key: String,
        /// Fail unless the value is stored as this kind
        #[arg(short, long)]
        kind: Option<PreferenceKind>,
    },
    /// Store a value
    Set {
        key: String,
        value: String,
        /// int, long, float, double, string or bool
        #[arg(short, long, default_value = "string")]
        kind: PreferenceKind,
    },
    /// Remove a key
    Remove { key: String },
    /// Print every key with its value
    List,
    /// Remove every key
    Clear,
    /// Print the value of a key and then every change to it
    Watch {
        key: String,
        /// How often to look for changes made by other processes
        #[arg(long = "interval-ms", default_value_t = 500)]
        interval_ms: u64,
        /// Stop after this many values
        #[arg(long)]
        count: Option<usize>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_set_with_kind() {
        let cli = Cli::try_parse_from(["prefkit", "set", "volume", "7", "--kind", "int"]).unwrap();
        assert_eq!(
            cli.command,
            Command::Set {
                key: "volume".to_string(),
                value: "7".to_string(),
                kind: PreferenceKind::Int,
            }
        );
    }

    #[test]
    fn test_set_defaults_to_string() {
        let cli = Cli::try_parse_from(["prefkit", "set", "theme", "dark"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Set {
                kind: PreferenceKind::String,
                ..
            }
        ));
    }

    #[test]
    fn test_global_config_after_subcommand() {
        let cli = Cli::try_parse_from(["prefkit", "list", "--config", "p.toml"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("p.toml")));
        assert_eq!(cli.command, Command::List);
    }

    #[test]
    fn test_unknown_kind_rejected() {
        assert!(Cli::try_parse_from(["prefkit", "set", "k", "v", "--kind", "uuid"]).is_err());
    }

    #[test]
    fn test_watch_defaults() {
        let cli = Cli::try_parse_from(["prefkit", "watch", "theme"]).unwrap();
        assert_eq!(
            cli.command,
            Command::Watch {
                key: "theme".to_string(),
                interval_ms: 500,
                count: None,
            }
        );
    }
}
