use anyhow::Result;
use clap::Parser;
use satchel::cli::{Cli, Commands};
use satchel::commands;
use satchel_core::Library;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.quiet {
        "error"
    } else {
        match cli.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("satchel={default_level},satchel_core={default_level}")));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let mut library = Library::open(&cli.library).await?;

    match cli.command {
        Commands::Import(args) => commands::handle_import(args, &mut library).await?,
        Commands::List(args) => commands::handle_list(args, &library).await?,
        Commands::Search(args) => commands::handle_search(args, &library).await?,
        Commands::Show(args) => commands::handle_show(args, &mut library).await?,
        Commands::Favorite(args) => commands::handle_favorite(args, &mut library).await?,
        Commands::Recent(args) => commands::handle_recent(args, &library).await?,
        Commands::Tag(args) => commands::handle_tag(args, &mut library).await?,
        Commands::Rm(args) => commands::handle_rm(args, &mut library).await?,
        Commands::Config(args) => commands::handle_config(args, &mut library).await?,
    }

    Ok(())
}
