//! CLI command definitions and subcommands

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::export::ExportFormat;

/// hg - Harada Method grid generator
#[derive(Parser)]
#[command(
    name = "hg",
    about = "Turn one goal into a Harada Method grid: 8 pillars, 64 tasks",
    version
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[arg(
        short = 'l',
        long = "log-level",
        global = true,
        help = "Log level (TRACE, DEBUG, INFO, WARN, ERROR)"
    )]
    pub log_level: Option<String>,

    /// Data directory (overrides config storage.data-dir)
    #[arg(short = 'd', long = "data-dir", global = true)]
    pub data_dir: Option<PathBuf>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Generate a new grid for a goal (replaces the active grid)
    Generate {
        /// The central goal
        goal: String,

        /// API key to use for this run
        #[arg(long)]
        api_key: Option<String>,

        /// Store --api-key for later runs
        #[arg(long, requires = "api_key")]
        save_key: bool,

        /// Skip the pacing delays between cells
        #[arg(long)]
        no_delay: bool,
    },

    /// Load the example grid as the active grid
    Example,

    /// Show the active grid
    Show {
        /// List pillars and tasks instead of the 9x9 grid
        #[arg(long)]
        outline: bool,

        /// Reveal cells one at a time
        #[arg(long, conflicts_with = "outline")]
        reveal: bool,

        /// Disable colors
        #[arg(long)]
        no_color: bool,
    },

    /// Edit a pillar title or a task (1-based indices)
    Edit {
        /// Pillar number (1-8)
        #[arg(value_parser = clap::value_parser!(u8).range(1..=8))]
        pillar: u8,

        /// Task number (1-8); omit to edit the pillar title
        #[arg(short, long, value_parser = clap::value_parser!(u8).range(1..=8))]
        task: Option<u8>,

        /// New content; blank input leaves the cell unchanged
        text: String,
    },

    /// Export the active grid
    Export {
        /// Output format
        #[arg(short, long, value_enum, default_value_t = ExportFormat::Json)]
        format: ExportFormat,

        /// Output path, or `-` for stdout (default: generated file name)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Import a JSON grid document as the active grid
    Import {
        /// Path to the JSON document
        file: PathBuf,
    },

    /// Discard the active grid
    Reset {
        /// Don't ask for confirmation
        #[arg(short, long)]
        yes: bool,
    },

    /// Manage the stored API key
    Key {
        #[command(subcommand)]
        command: KeyCommand,
    },
}

/// API key subcommands
#[derive(Debug, Subcommand)]
pub enum KeyCommand {
    /// Store an API key
    Set {
        /// The key (sk-...)
        key: String,
    },

    /// Remove the stored API key
    Clear,

    /// Show where the API key would come from
    Status,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_generate() {
        let cli = Cli::try_parse_from(["hg", "generate", "Learn Rust", "--no-delay"]).unwrap();
        match cli.command {
            Command::Generate {
                goal,
                api_key,
                save_key,
                no_delay,
            } => {
                assert_eq!(goal, "Learn Rust");
                assert!(api_key.is_none());
                assert!(!save_key);
                assert!(no_delay);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_save_key_requires_api_key() {
        assert!(Cli::try_parse_from(["hg", "generate", "x", "--save-key"]).is_err());
        assert!(Cli::try_parse_from(["hg", "generate", "x", "--save-key", "--api-key", "sk-1"]).is_ok());
    }

    #[test]
    fn test_parse_edit_ranges() {
        let cli = Cli::try_parse_from(["hg", "edit", "3", "--task", "8", "New task"]).unwrap();
        match cli.command {
            Command::Edit { pillar, task, text } => {
                assert_eq!(pillar, 3);
                assert_eq!(task, Some(8));
                assert_eq!(text, "New task");
            }
            other => panic!("unexpected command {:?}", other),
        }

        assert!(Cli::try_parse_from(["hg", "edit", "9", "x"]).is_err());
        assert!(Cli::try_parse_from(["hg", "edit", "1", "--task", "0", "x"]).is_err());
    }

    #[test]
    fn test_parse_export_format_alias() {
        let cli = Cli::try_parse_from(["hg", "export", "-f", "md", "-o", "-"]).unwrap();
        match cli.command {
            Command::Export { format, output } => {
                assert_eq!(format, ExportFormat::Markdown);
                assert_eq!(output, Some(PathBuf::from("-")));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }
}
