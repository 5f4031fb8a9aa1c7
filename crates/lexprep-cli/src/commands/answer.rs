//! `lexprep answer` - submit an answer and print the review as JSON.

use clap::Args;
use lexprep_core::config::Config;
use lexprep_core::model::AnswerSubmission;
use lexprep_core::startup::AppContext;

#[derive(Args)]
pub struct AnswerArgs {
    /// User id
    #[arg(long)]
    pub user: String,

    /// Item id being answered
    #[arg(long)]
    pub item: i64,

    /// Selected choice label (A-E)
    #[arg(long)]
    pub choice: String,

    /// Seconds spent on the question
    #[arg(long)]
    pub time_spent: Option<i64>,
}

pub async fn execute(args: AnswerArgs, config: Config) -> anyhow::Result<()> {
    let ctx = AppContext::build(config).await?;

    let review = ctx
        .answers
        .submit_answer(
            &args.user,
            args.item,
            &AnswerSubmission {
                selected_choice_id: args.choice.to_uppercase(),
                time_spent_secs: args.time_spent,
            },
        )
        .await?;

    println!("{}", serde_json::to_string_pretty(&review)?);
    Ok(())
}
