//! CLI interface using clap.
//!
//! Provides command-line arguments and subcommands for the tool.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::application::OutputFormat;

/// Helpdesk Pins - keep tickets, conversations, articles and agents at hand.
#[derive(Parser, Debug)]
#[command(name = "helpdesk-pins")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose logging (use multiple times for more verbosity).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Output format: table, json, or markdown.
    #[arg(short, long, default_value = "table", global = true)]
    pub format: String,

    /// Configuration file (defaults to ~/.helpdesk-pins/config.toml).
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List pinned items.
    List {
        /// Only show this kind (ticket, conversation, knowledgeBase, agent).
        #[arg(short, long)]
        kind: Option<String>,
    },

    /// Pin a record given as JSON.
    Pin {
        /// Kind of record (ticket, conversation, knowledgeBase, agent).
        kind: String,

        /// The record as a JSON object.
        #[arg(required_unless_present = "file", conflicts_with = "file")]
        json: Option<String>,

        /// Read the record from a JSON file instead.
        #[arg(long)]
        file: Option<PathBuf>,
    },

    /// Unpin a record by its identity key (id, or documentId for agents).
    Unpin {
        /// Kind of record (ticket, conversation, knowledgeBase, agent).
        kind: String,

        /// Identity key of the record.
        key: String,
    },

    /// Count tickets assigned to an agent.
    Count {
        /// Agent document id.
        #[arg(short, long)]
        agent: String,

        /// JSON array of tickets (pinned tickets if not specified).
        #[arg(short, long)]
        input: Option<PathBuf>,
    },

    /// List tickets, optionally filtered.
    Tickets {
        /// JSON array of tickets (pinned tickets if not specified).
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Only tickets assigned to this agent document id.
        #[arg(short, long, conflicts_with = "unassigned")]
        agent: Option<String>,

        /// Only tickets with this status.
        #[arg(short, long)]
        status: Option<String>,

        /// Only tickets nobody is assigned to.
        #[arg(long)]
        unassigned: bool,
    },

    /// Show ticket counts per assigned agent.
    Workload {
        /// JSON array of tickets (pinned tickets if not specified).
        #[arg(short, long)]
        input: Option<PathBuf>,
    },

    /// Search pinned agents by name or email.
    Agents {
        /// Case-insensitive search text.
        #[arg(default_value = "")]
        query: String,
    },

    /// Remove every pin.
    Clear,

    /// Show pin counts per kind.
    Summary,

    /// Show storage and configuration paths.
    Paths,

    /// Create the default configuration file if it doesn't exist.
    InitConfig {
        /// Data directory to record in a newly written configuration.
        #[arg(long)]
        data_dir: Option<PathBuf>,
    },
}

impl Cli {
    /// Parse the output format argument.
    pub fn output_format(&self) -> Result<OutputFormat, String> {
        self.format.parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_pin_inline_json() {
        let cli = Cli::parse_from(["helpdesk-pins", "pin", "ticket", r#"{"id":"a"}"#]);
        match cli.command {
            Commands::Pin { kind, json, file } => {
                assert_eq!(kind, "ticket");
                assert_eq!(json.as_deref(), Some(r#"{"id":"a"}"#));
                assert!(file.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_pin_requires_record() {
        assert!(Cli::try_parse_from(["helpdesk-pins", "pin", "ticket"]).is_err());
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::parse_from(["helpdesk-pins", "list", "-vv", "--format", "json"]);
        assert_eq!(cli.verbose, 2);
        assert!(matches!(cli.output_format(), Ok(OutputFormat::Json)));
    }
}
