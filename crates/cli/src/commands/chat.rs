//! `jarvis chat`: interactive conversation on the terminal.

use std::io::Write;
use std::path::Path;
use jarvis_tools::Voice;
use tokio::io::{AsyncBufReadExt, BufReader};

use super::{load_config, speak_reply, warn_if_no_api_key};

/// What a line typed at the prompt asks for.
#[derive(Debug, PartialEq, Eq)]
pub enum ChatInput<'a> {
    /// Blank line
    Skip,
    /// `quit`, `exit` or `bye`
    Quit,
    Message { text: &'a str, speak: bool },
}

pub fn parse_input(line: &str) -> ChatInput<'_> {
    let line = line.trim();
    if line.is_empty() {
        return ChatInput::Skip;
    }

    if matches!(line.to_lowercase().as_str(), "quit" | "exit" | "bye") {
        return ChatInput::Quit;
    }

    let (text, speak) = match line.get(..6) {
        Some(prefix) if prefix.eq_ignore_ascii_case("speak ") => (line[6..].trim(), true),
        _ => (line, false),
    };

    if text.is_empty() {
        ChatInput::Skip
    } else {
        ChatInput::Message { text, speak }
    }
}

pub async fn run(config_path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(config_path)?;
    warn_if_no_api_key(&config);

    let orchestrator = jarvis_agent::build_orchestrator(&config).await?;
    let voice = Voice::from_config(&config.voice);
    let name = config.identity.name.clone();

    println!();
    println!("  {name} is ready.");
    println!();
    println!("  Provider:  {}", config.default_provider);
    println!("  Model:     {}", orchestrator.model());
    println!("  Memory:    {} turns", orchestrator.memory().len().await);
    println!(
        "  Search:    {}",
        if config.search.enabled { "on" } else { "off" }
    );
    println!(
        "  Voice:     {}",
        if voice.is_some() { "on (prefix a message with 'speak ')" } else { "off" }
    );
    println!();
    println!("  Type 'quit', 'exit' or 'bye' to leave.");
    println!();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        print!("  You > ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };

        match parse_input(&line) {
            ChatInput::Skip => continue,
            ChatInput::Quit => break,
            ChatInput::Message { text, speak } => {
                eprint!("  ...");
                let reply = orchestrator.process(text).await;
                eprint!("\r     \r");

                println!();
                for line in reply.lines() {
                    println!("  {name} > {line}");
                }
                println!();

                if speak {
                    speak_reply(voice.as_ref(), &reply).await;
                }
            }
        }
    }

    println!();
    println!("  Goodbye! Have a great day.");
    println!();

    Ok(())
}
