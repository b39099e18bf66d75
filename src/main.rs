mod api;
mod cli;
mod error;
mod logging;
mod models;
mod settings;
mod tui;
mod view;

use std::sync::Arc;

use clap::Parser;

use cli::{Cli, Commands, ConfigCommands};
use error::Result;

fn run(cli: Cli) -> Result<()> {
    let api_url = cli.api_url.as_deref();
    match cli.command {
        None => {
            let settings = cli::effective_settings(api_url, None);
            let api = Arc::new(cli::http_api(&settings)?);
            cli::mapper::launch(&settings, api, None)
        }
        Some(Commands::Map {
            gst_no,
            code,
            per_page,
        }) => {
            let settings = cli::effective_settings(api_url, per_page);
            let api = cli::http_api(&settings)?;
            match (gst_no.as_deref(), code.as_deref()) {
                (Some(gst_no), Some(code)) => cli::map::run(&api, &settings.routes, gst_no, code),
                (gst_no, _) => cli::mapper::launch(&settings, Arc::new(api), gst_no),
            }
        }
        Some(Commands::Lookup {
            gst_no,
            search,
            page,
            per_page,
            json,
        }) => {
            let settings = cli::effective_settings(api_url, per_page);
            let api = cli::http_api(&settings)?;
            cli::lookup::run(
                &api,
                &cli::lookup::LookupOptions {
                    gst_no: &gst_no,
                    search: search.as_deref(),
                    page,
                    per_page: settings.per_page,
                    json,
                },
            )
        }
        Some(Commands::Config { command }) => match command {
            ConfigCommands::Show => cli::config::show(),
            ConfigCommands::Get { key } => cli::config::get(&key),
            ConfigCommands::Set { key, value } => cli::config::set(&key, &value),
        },
    }
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = logging::init(&settings::log_path(), cli.verbose) {
        eprintln!("Warning: logging disabled: {e}");
    }

    if let Err(e) = run(cli) {
        tracing::error!("command failed: {e}");
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
