//! `lexprep generate` - run one generation batch through the pipeline.

use clap::Args;
use lexprep_core::config::Config;
use lexprep_core::model::{Difficulty, GenerationRequest, SubjectArea};
use lexprep_core::startup::AppContext;
use tokio_util::sync::CancellationToken;

use super::{parse_section, parse_subtype};

#[derive(Args)]
pub struct GenerateArgs {
    /// Section: lr or rc
    #[arg(long, default_value = "lr")]
    pub section: String,

    /// Subtype (e.g. weaken, main_idea); random when omitted
    #[arg(long)]
    pub subtype: Option<String>,

    /// Difficulty band: easy, medium, or hard
    #[arg(long, default_value = "medium")]
    pub difficulty: String,

    /// Number of questions to request
    #[arg(long)]
    pub count: Option<u32>,

    /// Subject area for reading comprehension passages
    #[arg(long)]
    pub subject: Option<String>,

    /// Request a comparative passage pair (rc only)
    #[arg(long)]
    pub comparative: bool,
}

pub async fn execute(args: GenerateArgs, config: Config) -> anyhow::Result<()> {
    let section = parse_section(&args.section)?;
    let subtype = args.subtype.as_deref().map(parse_subtype).transpose()?;
    let difficulty = Difficulty::parse(&args.difficulty)
        .ok_or_else(|| anyhow::anyhow!("unknown difficulty '{}'", args.difficulty))?;
    let subject_area = args
        .subject
        .as_deref()
        .map(|s| {
            SubjectArea::parse(s).ok_or_else(|| anyhow::anyhow!("unknown subject area '{s}'"))
        })
        .transpose()?;

    let count = args.count.unwrap_or(config.generation.batch_size);
    let request = GenerationRequest {
        section,
        subtype,
        difficulty,
        count,
        subject_area,
        is_comparative: args.comparative,
    };

    let ctx = AppContext::build(config).await?;
    let summary = ctx.pipeline.run(&request, &CancellationToken::new()).await?;

    println!(
        "Batch {}: {} passed, {} flagged, {} rejected (of {} requested)",
        summary.batch_id, summary.passed, summary.flagged, summary.rejected, summary.requested
    );
    Ok(())
}
