//! Command-line interface definition.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// driveinvite - share a folder on Drive and invite someone to discuss it
#[derive(Debug, Parser)]
#[command(name = "driveinvite")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(long, short, env = "DRIVEINVITE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable debug output
    #[arg(long, short = 'v', global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Authorize access to Drive, Calendar and Gmail
    Auth {
        /// OAuth client ID (from Google Cloud Console)
        #[arg(long, env = "GOOGLE_CLIENT_ID")]
        client_id: Option<String>,

        /// OAuth client secret (from Google Cloud Console)
        #[arg(long, env = "GOOGLE_CLIENT_SECRET")]
        client_secret: Option<String>,

        /// Path to Google Cloud Console credentials JSON file
        ///
        /// This is the `credentials.json` downloaded from the OAuth 2.0
        /// credentials page. Alternative to providing client_id and
        /// client_secret separately.
        #[arg(long, env = "GOOGLE_CREDENTIALS_FILE")]
        credentials_file: Option<PathBuf>,

        /// Force re-authentication even if already authenticated
        #[arg(long, short)]
        force: bool,
    },

    /// Upload a local directory into a Drive folder of the same name
    Sync {
        /// Local directory to synchronize
        folder: PathBuf,

        /// Drive folder the target folder lives under
        #[arg(long)]
        parent: Option<String>,
    },

    /// Sync a folder, create a calendar event and email the invitation
    Send(SendArgs),

    /// Configuration commands
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Arguments of the `send` command.
#[derive(Debug, Clone, clap::Args)]
pub struct SendArgs {
    /// Local directory to share
    #[arg(long)]
    pub folder: PathBuf,

    /// Event title
    #[arg(long)]
    pub name: String,

    /// Email address of the attendee
    #[arg(long)]
    pub to: String,

    /// Start date (DD/MM/YYYY, UTC)
    #[arg(long)]
    pub start_date: String,

    /// Start time (HH:MM, UTC)
    #[arg(long)]
    pub start_time: String,

    /// End date (DD/MM/YYYY, UTC)
    #[arg(long)]
    pub end_date: String,

    /// End time (HH:MM, UTC)
    #[arg(long)]
    pub end_time: String,

    /// Drive folder the shared folder lives under
    #[arg(long)]
    pub parent: Option<String>,
}

/// Configuration actions.
#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Dump current configuration
    Dump,

    /// Validate configuration
    Validate,

    /// Show configuration file path
    Path,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_send() {
        let cli = Cli::try_parse_from([
            "driveinvite",
            "send",
            "--folder",
            "proj",
            "--name",
            "Kickoff",
            "--to",
            "guest@example.com",
            "--start-date",
            "15/03/2024",
            "--start-time",
            "10:00",
            "--end-date",
            "15/03/2024",
            "--end-time",
            "11:00",
        ])
        .unwrap();

        let Command::Send(args) = cli.command else {
            panic!("expected send");
        };
        assert_eq!(args.folder, PathBuf::from("proj"));
        assert_eq!(args.to, "guest@example.com");
        assert!(args.parent.is_none());
    }

    #[test]
    fn parses_sync_with_parent() {
        let cli =
            Cli::try_parse_from(["driveinvite", "-v", "sync", "proj", "--parent", "F0"]).unwrap();
        assert!(cli.debug);
        match cli.command {
            Command::Sync { folder, parent } => {
                assert_eq!(folder, PathBuf::from("proj"));
                assert_eq!(parent.as_deref(), Some("F0"));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn send_requires_recipient() {
        let result = Cli::try_parse_from(["driveinvite", "send", "--folder", "proj"]);
        assert!(result.is_err());
    }
}
