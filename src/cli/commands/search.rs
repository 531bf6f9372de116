//! Search command implementation.

use crate::cli::Output;
use crate::config::Settings;
use crate::pipeline::Pipeline;
use anyhow::Result;

/// Run the search command.
pub async fn run_search(term: &str, limit: Option<u32>, settings: Settings) -> Result<()> {
    let limit = limit.unwrap_or(settings.search.limit);
    let pipeline = Pipeline::new(settings)?;

    let spinner = Output::spinner("Searching...");
    let results = pipeline.search(term, limit).await;
    spinner.finish_and_clear();

    match results {
        Ok(results) if results.is_empty() => {
            Output::warning(&format!("No articles found for '{}'", term));
        }
        Ok(results) => {
            Output::success(&format!("Found {} articles", results.len()));
            Output::candidates(&results);
        }
        Err(e) => {
            Output::error(&format!("Search failed: {}", e));
            return Err(e.into());
        }
    }

    Ok(())
}
