//! `lexprep export` / `lexprep import` - move the servable item set
//! between stores as JSON.

use clap::Args;
use lexprep_core::config::Config;
use lexprep_core::startup::AppContext;
use lexprep_core::storage::transfer;
use std::path::PathBuf;

#[derive(Args)]
pub struct ExportArgs {
    /// Output file (stdout when omitted)
    #[arg(long)]
    pub out: Option<PathBuf>,
}

#[derive(Args)]
pub struct ImportArgs {
    /// JSON file produced by `lexprep export`
    #[arg(long)]
    pub file: PathBuf,
}

pub async fn export(args: ExportArgs, config: Config) -> anyhow::Result<()> {
    let ctx = AppContext::build(config).await?;
    let items = transfer::export_servable(&ctx.pool).await?;
    let body = serde_json::to_string_pretty(&items)?;

    match args.out {
        Some(path) => {
            std::fs::write(&path, body)?;
            println!("Exported {} item(s) to {}", items.len(), path.display());
        }
        None => println!("{body}"),
    }
    Ok(())
}

pub async fn import(args: ImportArgs, config: Config) -> anyhow::Result<()> {
    let body = std::fs::read_to_string(&args.file)?;
    let items: Vec<transfer::ExportedItem> = serde_json::from_str(&body)?;

    let ctx = AppContext::build(config).await?;
    let inserted = transfer::import_items(&ctx.pool, &items).await?;
    println!(
        "Imported {inserted} of {} item(s) ({} duplicate(s) skipped)",
        items.len(),
        items.len() as u32 - inserted
    );
    Ok(())
}
