pub mod cli;
pub mod commands;
pub mod config;
pub mod db;
pub mod error;
pub mod troubleshoot;

use clap::Parser;

use crate::cli::Cli;
use crate::commands::AppState;
use crate::config::Settings;

pub fn run() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_target(false)
        .try_init();

    let cli = Cli::parse();

    let settings = match Settings::load(cli.config.as_deref()) {
        Ok(settings) => settings,
        Err(e) => return cli::report(Err(format!("Failed to load configuration: {}", e))),
    };

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => return cli::report(Err(format!("Failed to start async runtime: {}", e))),
    };

    let state = AppState::new(settings);
    cli::report(runtime.block_on(cli::execute(cli.command, &state)));
}
