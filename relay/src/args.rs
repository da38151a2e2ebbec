use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// Relay gateway
#[derive(Debug, Parser)]
#[command(
    name = "relay",
    about = "Translate Anthropic Messages requests for the CodeWhisperer backend"
)]
pub struct Args {
    /// Path to configuration file; built-in defaults are used when omitted
    #[arg(short, long, global = true, env = "RELAY_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the gateway (default)
    Serve(ServeArgs),
    /// Inspect or refresh the backend token
    #[command(subcommand)]
    Token(TokenCommand),
    /// Print environment variable assignments for clients
    Export {
        /// Shell syntax to print; both Windows shells are printed by default on Windows
        #[arg(long, value_enum)]
        shell: Option<Shell>,
    },
}

#[derive(Debug, Default, clap::Args)]
pub struct ServeArgs {
    /// Override the listen address
    #[arg(long, env = "RELAY_LISTEN")]
    pub listen: Option<SocketAddr>,

    /// Override the log filter directive
    #[arg(long)]
    pub log_filter: Option<String>,
}

#[derive(Debug, Subcommand)]
pub enum TokenCommand {
    /// Print the stored token
    Read,
    /// Exchange the refresh token for a new access token
    Refresh,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Shell {
    Posix,
    Cmd,
    Powershell,
}
