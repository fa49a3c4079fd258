//! `jarvis voices`: list the text-to-speech voices.

use std::path::Path;
use jarvis_tools::AVAILABLE_VOICES;

use super::load_config;

pub fn run(config_path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(config_path)?;

    println!("Available voices:");
    for (id, description) in AVAILABLE_VOICES {
        let marker = if *id == config.voice.voice { "*" } else { " " };
        println!("  {marker} {id:<18} {description}");
    }
    println!();
    println!("Set `voice` under [voice] in your config to change it.");

    Ok(())
}
