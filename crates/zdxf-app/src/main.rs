//! ZDXF 命令行入口

mod cli;
mod commands;
mod config;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{debug, Level};
use tracing_subscriber::FmtSubscriber;

use cli::{Cli, Commands};
use config::AppConfig;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // 初始化日志，输出到 stderr，stdout 只留给结果
    let level: Level = cli
        .log_level
        .parse()
        .with_context(|| format!("Invalid log level: {}", cli.log_level))?;
    tracing::subscriber::set_global_default(
        FmtSubscriber::builder()
            .with_max_level(level)
            .with_writer(std::io::stderr)
            .finish(),
    )?;

    let config = AppConfig::load(cli.config.as_deref())?;
    debug!(?config, "Effective configuration");

    match &cli.command {
        Commands::Export(args) => commands::export(args, &config),
        Commands::Normalize(args) => commands::normalize(args, &config),
        Commands::Layers(args) => commands::layers(args),
    }
}
