//! `jarvis memory`: inspect or clear the conversation log.

use std::path::Path;

use super::load_config;

pub async fn show(config_path: Option<&Path>, count: usize) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(config_path)?;
    let memory = jarvis_agent::load_memory(&config).await;

    println!("Conversation Memory");
    println!("===================");
    println!("  File:      {}", config.memory.resolved_path().display());
    println!("  Stored:    {} / {} turns", memory.len().await, memory.capacity());
    println!();

    let turns = memory.recent(count).await;
    if turns.is_empty() {
        println!("  (no conversations yet)");
        return Ok(());
    }

    for turn in turns {
        println!("  [{}]", turn.timestamp.format("%Y-%m-%d %H:%M:%S UTC"));
        println!("    You:    {}", turn.user_text);
        println!("    {}: {}", config.identity.name, turn.assistant_text);
        println!();
    }

    Ok(())
}

pub async fn clear(config_path: Option<&Path>, confirm: bool) -> Result<(), Box<dyn std::error::Error>> {
    if !confirm {
        println!("This deletes every stored conversation turn.");
        println!("Re-run with --confirm to proceed.");
        return Ok(());
    }

    let config = load_config(config_path)?;
    let memory = jarvis_agent::load_memory(&config).await;
    let removed = memory.len().await;
    memory.clear().await?;

    println!("Cleared {removed} turns from {}", config.memory.resolved_path().display());
    Ok(())
}
