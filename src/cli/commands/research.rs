//! Research command implementation.

use crate::cli::output::preview;
use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::research::{ExtractionOutcome, ResearchRequest, Researcher, ResponseProfile};
use anyhow::Result;

/// Run the research command.
pub async fn run_research(
    topic: &str,
    questions: Vec<String>,
    model: Option<String>,
    profile: Option<ResponseProfile>,
    settings: Settings,
) -> Result<()> {
    let request = ResearchRequest::new(topic).with_questions(questions);
    request.validate()?;

    preflight::check(Operation::Research, &settings)?;

    let researcher = Researcher::from_settings(&settings, model.as_deref(), profile)?;

    let spinner = Output::spinner(&format!("Researching: {}", preview(topic, 60)));
    let outcome = researcher.run(&request).await;
    spinner.finish_and_clear();

    match &outcome {
        ExtractionOutcome::Record(record) => {
            Output::success(&format!(
                "Done: {} sources, {} tool calls",
                record.sources.len(),
                record.tool_details.len()
            ));
        }
        ExtractionOutcome::Failure(failure) => {
            Output::warning(&failure.error);
        }
    }

    Output::json(&outcome.to_value(researcher.profile()));
    Ok(())
}
