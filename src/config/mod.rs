pub mod toml_config;

#[cfg(feature = "cli")]
use clap::{Parser, Subcommand};
#[cfg(feature = "cli")]
use std::path::PathBuf;

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Parser)]
#[command(name = "protection-bridge")]
#[command(about = "Transforms pension protection applications to and from the registration format")]
pub struct CliConfig {
    #[arg(long, short, help = "Path to a TOML configuration file")]
    pub config: Option<PathBuf>,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// 申請 JSON -> 登記請求 JSON
    Outbound {
        /// NINO without its suffix letter
        #[arg(long)]
        nino: String,

        /// Application JSON file; stdin when omitted
        #[arg(long)]
        input: Option<PathBuf>,
    },

    /// 登記回應 JSON -> 申請回應 JSON
    Inbound {
        #[arg(long)]
        suffix: char,

        #[arg(long)]
        input: Option<PathBuf>,
    },

    /// Sends the application to the configured registration endpoint
    Submit {
        /// Full NINO including suffix
        #[arg(long)]
        nino: String,

        #[arg(long)]
        input: Option<PathBuf>,

        /// Amend an existing protection instead of creating one
        #[arg(long)]
        protection_id: Option<i64>,
    },
}

#[cfg(feature = "cli")]
impl Command {
    pub fn input(&self) -> Option<&PathBuf> {
        match self {
            Self::Outbound { input, .. } | Self::Inbound { input, .. } | Self::Submit { input, .. } => {
                input.as_ref()
            }
        }
    }
}

#[cfg(all(test, feature = "cli"))]
mod tests {
    use super::*;

    #[test]
    fn test_parse_submit_amend() {
        let cli = CliConfig::parse_from([
            "protection-bridge",
            "--verbose",
            "submit",
            "--nino",
            "AB123456C",
            "--protection-id",
            "42",
        ]);

        assert!(cli.verbose);
        assert!(cli.command.input().is_none());
        match cli.command {
            Command::Submit { nino, protection_id, .. } => {
                assert_eq!(nino, "AB123456C");
                assert_eq!(protection_id, Some(42));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_inbound_with_config() {
        let cli = CliConfig::parse_from([
            "protection-bridge",
            "--config",
            "bridge.toml",
            "inbound",
            "--suffix",
            "C",
            "--input",
            "response.json",
        ]);

        assert_eq!(cli.config, Some(PathBuf::from("bridge.toml")));
        assert_eq!(cli.command.input(), Some(&PathBuf::from("response.json")));
    }
}
