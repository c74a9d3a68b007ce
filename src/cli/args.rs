//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueHint};

/// Flatten hierarchical situation overrides into experiment result definitions
#[derive(Parser, Debug)]
#[command(name = "sitmerge")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Debug output (-d info, -dd debug, -ddd trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub debug: u8,

    /// Config file layered over the global config
    #[arg(short, long, global = true, value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    /// Directory for per-experiment log files
    #[arg(long, global = true, value_hint = ValueHint::DirPath)]
    pub log_dir: Option<PathBuf>,

    /// Disable per-experiment log files
    #[arg(long, global = true, conflicts_with = "log_dir")]
    pub no_log: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Apply situation overrides to definition files
    Apply {
        /// Definition file or directory
        #[arg(value_hint = ValueHint::AnyPath)]
        path: PathBuf,
        /// Rewrite files instead of printing to stdout
        #[arg(short, long)]
        in_place: bool,
        /// Remove Situation/Body nodes after flattening
        #[arg(long)]
        strip_sources: bool,
    },

    /// Print flattened entries per experiment
    Flatten {
        /// Definition file or directory
        #[arg(value_hint = ValueHint::AnyPath)]
        path: PathBuf,
        /// Only show this experiment
        #[arg(short, long)]
        experiment: Option<String>,
    },

    /// Show situation trees
    Tree {
        /// Definition file or directory
        #[arg(value_hint = ValueHint::AnyPath)]
        path: PathBuf,
    },

    /// Manage settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Generate shell completions
    Completion {
        /// Shell type
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show effective settings
    Show,
    /// Print a config template
    Template,
    /// Show config file locations
    Path,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    // https://docs.rs/clap/latest/clap/_derive/_tutorial/index.html#testing
    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn given_apply_flags_when_parsing_then_sets_fields() {
        let cli = Cli::parse_from(["sitmerge", "-dd", "apply", "defs", "--in-place"]);
        assert_eq!(cli.debug, 2);
        match cli.command {
            Some(Commands::Apply {
                path,
                in_place,
                strip_sources,
            }) => {
                assert_eq!(path, PathBuf::from("defs"));
                assert!(in_place);
                assert!(!strip_sources);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
