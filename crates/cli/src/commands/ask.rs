//! `jarvis ask`: one turn from the command line.

use std::path::Path;
use jarvis_tools::Voice;

use super::{load_config, save_reply, speak_reply, warn_if_no_api_key};

pub async fn run(
    config_path: Option<&Path>,
    message: &str,
    speak: bool,
    save: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let message = message.trim();
    if message.is_empty() {
        return Err("Message must not be empty".into());
    }

    let config = load_config(config_path)?;
    warn_if_no_api_key(&config);
    let orchestrator = jarvis_agent::build_orchestrator(&config).await?;

    eprint!("  Thinking...");
    let reply = orchestrator.process(message).await;
    eprint!("\r              \r");
    println!("{reply}");

    if speak || save.is_some() {
        let voice = Voice::from_config(&config.voice);
        if speak {
            speak_reply(voice.as_ref(), &reply).await;
        }
        if let Some(path) = save {
            save_reply(voice.as_ref(), &reply, path).await?;
            eprintln!("  [Speech saved to {}]", path.display());
        }
    }

    Ok(())
}
