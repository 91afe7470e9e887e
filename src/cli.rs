//! Command line surface of the tally tool.

use clap::{Parser, Subcommand};

/// Prize-draw tally tracker with browser export and Discord summaries.
///
/// With no subcommand, two positional arguments record a win:
/// `gacha-tally <winner> <flag>` where flag is `0` for a hit and `1`
/// for a jackpot.
#[derive(Debug, Parser)]
#[command(name = "gacha-tally", version, args_conflicts_with_subcommands = true)]
pub struct Cli {
    /// Winner name to record a win for.
    #[arg(requires = "flag")]
    pub winner: Option<String>,

    /// Outcome flag: `0` = hit, `1` = jackpot.
    #[arg(id = "flag")]
    pub flag: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Maintenance and server subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Back up the current state, then clear it and open a new session.
    Reset,
    /// Regenerate the browser-facing data.js from the current state.
    GenDatajs,
    /// Snapshot the current state into the backups directory.
    Backup,
    /// Restore a named backup over the live state.
    Restore {
        /// Backup file name, with or without the `.json`/`.js` extension.
        name: String,
    },
    /// Rebuild the backup index and any missing wrapper files.
    GenBackupIndex,
    /// Run the local HTTP API server.
    Serve {
        /// Port to listen on; falls back to the configured serverPort.
        port: Option<u16>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_record_positionals() {
        let cli = Cli::parse_from(["gacha-tally", "alice", "1"]);
        assert_eq!(cli.winner.as_deref(), Some("alice"));
        assert_eq!(cli.flag.as_deref(), Some("1"));
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_winner_requires_flag() {
        assert!(Cli::try_parse_from(["gacha-tally", "alice"]).is_err());
    }

    #[test]
    fn test_parses_subcommands() {
        let cli = Cli::parse_from(["gacha-tally", "restore", "2026-01-02_030405.json"]);
        match cli.command {
            Some(Command::Restore { name }) => assert_eq!(name, "2026-01-02_030405.json"),
            other => panic!("unexpected parse: {other:?}"),
        }

        let cli = Cli::parse_from(["gacha-tally", "serve", "4020"]);
        match cli.command {
            Some(Command::Serve { port }) => assert_eq!(port, Some(4020)),
            other => panic!("unexpected parse: {other:?}"),
        }
    }

    #[test]
    fn test_no_args_parses_empty() {
        let cli = Cli::parse_from(["gacha-tally"]);
        assert!(cli.winner.is_none());
        assert!(cli.command.is_none());
    }
}
