//! `lexprep init` - write a default configuration file.

use clap::Args;
use lexprep_core::config::Config;
use std::path::PathBuf;

#[derive(Args)]
pub struct InitArgs {
    /// Overwrite an existing config file
    #[arg(long)]
    pub force: bool,
}

pub fn execute(args: &InitArgs, config_path: &str) -> anyhow::Result<()> {
    let path = expand(config_path);

    if path.exists() && !args.force {
        anyhow::bail!(
            "config already exists at {} (use --force to overwrite)",
            path.display()
        );
    }

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let config = Config::default();
    let body = toml::to_string_pretty(&config)?;
    std::fs::write(&path, body)?;

    println!("Wrote default configuration to {}", path.display());
    println!("Set llm.api_key (or LEXPREP_LLM_API_KEY) before generating questions.");
    Ok(())
}

fn expand(path: &str) -> PathBuf {
    match (path.strip_prefix("~/"), dirs::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(path),
    }
}
