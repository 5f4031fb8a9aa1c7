//! `lexprep status` - inventory, queue, and spend counters.

use clap::Args;
use lexprep_core::config::Config;
use lexprep_core::model::Section;
use lexprep_core::startup::AppContext;
use lexprep_core::storage;

#[derive(Args)]
pub struct StatusArgs {}

pub async fn execute(_args: StatusArgs, config: Config) -> anyhow::Result<()> {
    let limit_cents = config.generation.daily_cost_limit_cents;
    let ctx = AppContext::build(config).await?;

    for section in [Section::LogicalReasoning, Section::ReadingComprehension] {
        let servable =
            storage::items::count_servable_in_bucket(&ctx.pool, section, None, 0, 100).await?;
        println!("{}: {servable} servable items", section.as_str());
    }

    let pending = storage::queue::fetch_pending(&ctx.pool, 100).await?;
    println!("generation queue: {} pending job(s)", pending.len());

    let (calls, spend) = storage::llm_usage::totals(&ctx.pool).await?;
    let today_cents = storage::llm_usage::cost_today_cents(&ctx.pool).await?;
    println!(
        "llm usage: {calls} call(s), ${spend:.4} all-time, {today_cents}/{limit_cents} cents today"
    );
    Ok(())
}
