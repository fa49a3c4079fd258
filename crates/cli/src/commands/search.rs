//! `jarvis search`: run the web search client directly.

use std::path::Path;
use jarvis_core::search::{SearchOutcome, SearchProvider};
use jarvis_tools::DuckDuckGoSearch;

use super::load_config;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchKind {
    General,
    News,
    Weather,
    Definition,
}

pub async fn run(
    config_path: Option<&Path>,
    query: &str,
    kind: SearchKind,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(config_path)?;
    let search = DuckDuckGoSearch::from_config(&config.search);

    let outcome = match kind {
        SearchKind::General => search.search(query).await?,
        SearchKind::News => search.news(query).await?,
        SearchKind::Weather => search.weather(query).await?,
        SearchKind::Definition => search.definition(query).await?,
    };

    match outcome {
        SearchOutcome::Results(text) => println!("{text}"),
        SearchOutcome::Empty => println!("No results found for '{query}'."),
    }

    Ok(())
}
