//! Subcommand handlers for the lexprep CLI.

pub mod answer;
pub mod drill;
pub mod generate;
pub mod init;
pub mod status;
pub mod transfer;
pub mod worker;

pub use answer::AnswerArgs;
pub use drill::DrillArgs;
pub use generate::GenerateArgs;
pub use init::InitArgs;
pub use status::StatusArgs;
pub use transfer::{ExportArgs, ImportArgs};
pub use worker::WorkerArgs;

use lexprep_core::model::{Section, Subtype};

/// Parse a section from its full or short form.
pub(crate) fn parse_section(s: &str) -> anyhow::Result<Section> {
    match s {
        "lr" | "logical_reasoning" => Ok(Section::LogicalReasoning),
        "rc" | "reading_comprehension" => Ok(Section::ReadingComprehension),
        other => anyhow::bail!("unknown section '{other}' (expected lr or rc)"),
    }
}

/// Parse a subtype from either section's vocabulary.
pub(crate) fn parse_subtype(s: &str) -> anyhow::Result<Subtype> {
    Subtype::parse(Section::LogicalReasoning, s)
        .or_else(|| Subtype::parse(Section::ReadingComprehension, s))
        .ok_or_else(|| anyhow::anyhow!("unknown subtype '{s}'"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_section_short_forms() {
        assert_eq!(parse_section("lr").expect("lr"), Section::LogicalReasoning);
        assert_eq!(parse_section("rc").expect("rc"), Section::ReadingComprehension);
        assert!(parse_section("logic_games").is_err());
    }

    #[test]
    fn parses_subtypes_from_both_sections() {
        assert!(parse_subtype("weaken").is_ok());
        assert!(parse_subtype("main_idea").is_ok());
        assert!(parse_subtype("bogus").is_err());
    }
}
