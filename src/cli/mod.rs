pub mod config;
pub mod lookup;
pub mod map;
pub mod mapper;

use clap::{Parser, Subcommand};

use crate::api::HttpAccountApi;
use crate::error::Result;
use crate::settings::{load_settings, Settings};

/// Effective settings with command-line overrides applied on top.
pub(crate) fn effective_settings(api_url: Option<&str>, per_page: Option<usize>) -> Settings {
    let mut settings = load_settings();
    if let Some(url) = api_url {
        settings.api_url = url.to_string();
    }
    if let Some(n) = per_page.filter(|n| *n > 0) {
        settings.per_page = n;
    }
    settings
}

pub(crate) fn http_api(settings: &Settings) -> Result<HttpAccountApi> {
    HttpAccountApi::new(&settings.api_url)
}

#[derive(Parser)]
#[command(
    name = "acmap",
    about = "Look up account master records by GST number and map them into the local account master."
)]
pub struct Cli {
    /// Backend base URL (overrides settings and ACMAP_API_URL)
    #[arg(long = "api-url", global = true)]
    pub api_url: Option<String>,

    /// Write debug-level entries to the log file
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Open the mapping screen for a GST number.
    Map {
        /// GST number to look up (prompted on screen when omitted)
        #[arg(long = "gst-no")]
        gst_no: Option<String>,
        /// Map this account code directly without opening the screen
        #[arg(long, requires = "gst_no")]
        code: Option<String>,
        /// Rows per page
        #[arg(long = "per-page")]
        per_page: Option<usize>,
    },
    /// Print account master records for a GST number.
    Lookup {
        /// GST number to look up
        #[arg(long = "gst-no")]
        gst_no: String,
        /// Only show records containing this text in any field
        #[arg(long)]
        search: Option<String>,
        /// Page to show (1-based)
        #[arg(long, default_value = "1")]
        page: usize,
        /// Rows per page
        #[arg(long = "per-page")]
        per_page: Option<usize>,
        /// Print the page as a JSON array
        #[arg(long)]
        json: bool,
    },
    /// Show or change settings.
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Print effective settings and file locations.
    Show,
    /// Print one setting.
    Get {
        /// Setting key, e.g. api_url or routes.fallback
        key: String,
    },
    /// Change one setting.
    Set {
        /// Setting key, e.g. api_url or routes.fallback
        key: String,
        value: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_map() {
        let cli = Cli::parse_from(["acmap", "map", "--gst-no", "27AAA", "--per-page", "25"]);
        match cli.command {
            Some(Commands::Map { gst_no, code, per_page }) => {
                assert_eq!(gst_no.as_deref(), Some("27AAA"));
                assert!(code.is_none());
                assert_eq!(per_page, Some(25));
            }
            _ => panic!("expected map"),
        }
    }

    #[test]
    fn test_code_requires_gst_no() {
        assert!(Cli::try_parse_from(["acmap", "map", "--code", "101"]).is_err());
    }

    #[test]
    fn test_global_api_url() {
        let cli =
            Cli::parse_from(["acmap", "lookup", "--gst-no", "X", "--api-url", "http://h/api"]);
        assert_eq!(cli.api_url.as_deref(), Some("http://h/api"));
    }

    #[test]
    fn test_no_command_is_allowed() {
        let cli = Cli::parse_from(["acmap"]);
        assert!(cli.command.is_none());
    }
}
