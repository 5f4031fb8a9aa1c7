//! `lexprep drill` - serve an adaptive drill and print it as JSON.

use clap::Args;
use lexprep_core::config::Config;
use lexprep_core::startup::AppContext;
use tokio_util::sync::CancellationToken;

use super::{parse_section, parse_subtype};

#[derive(Args)]
pub struct DrillArgs {
    /// User id to serve
    #[arg(long)]
    pub user: String,

    /// Section for a mixed drill: lr or rc
    #[arg(long, default_value = "lr", conflicts_with = "subtype")]
    pub section: String,

    /// Subtype for a focused drill (e.g. weaken, main_idea)
    #[arg(long)]
    pub subtype: Option<String>,

    /// Difficulty slider 0-100 (defaults to the saved preference)
    #[arg(long)]
    pub slider: Option<i64>,

    /// Number of questions
    #[arg(long, default_value_t = 5)]
    pub count: usize,
}

pub async fn execute(args: DrillArgs, config: Config) -> anyhow::Result<()> {
    let ctx = AppContext::build(config).await?;
    let cancel = CancellationToken::new();

    let items = match &args.subtype {
        Some(subtype) => {
            let subtype = parse_subtype(subtype)?;
            ctx.drills
                .focused_drill(&args.user, subtype, args.slider, args.count, &cancel)
                .await?
        }
        None => {
            let section = parse_section(&args.section)?;
            ctx.drills
                .quick_drill(&args.user, section, args.slider, args.count, &cancel)
                .await?
        }
    };

    println!("{}", serde_json::to_string_pretty(&items)?);
    Ok(())
}
