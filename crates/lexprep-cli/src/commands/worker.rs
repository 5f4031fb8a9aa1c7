//! `lexprep worker` - run the background generation worker until Ctrl+C.

use clap::Args;
use lexprep_core::config::Config;
use lexprep_core::startup::{format_startup_banner, AppContext};
use lexprep_core::storage;
use tokio_util::sync::CancellationToken;

#[derive(Args)]
pub struct WorkerArgs {
    /// Reset jobs stuck in 'generating' (after a crash) before starting
    #[arg(long)]
    pub reset_stuck: bool,
}

pub async fn execute(args: WorkerArgs, config: Config) -> anyhow::Result<()> {
    println!("{}", format_startup_banner(&config));

    let ctx = AppContext::build(config).await?;

    if args.reset_stuck {
        let reclaimed = storage::queue::reset_generating(&ctx.pool).await?;
        if reclaimed > 0 {
            println!("Reclaimed {reclaimed} stuck job(s)");
        }
    }

    let cancel = CancellationToken::new();
    let worker = ctx.worker();

    let shutdown = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Ctrl+C received, shutting down");
            shutdown.cancel();
        }
    });

    worker.run(cancel).await;
    Ok(())
}
