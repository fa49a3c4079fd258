//! Assembles the message list sent to the language model for one turn.

use jarvis_core::memory::ConversationTurn;
use jarvis_core::message::Message;

pub struct PromptBuilder;

impl PromptBuilder {
    /// `[system]`, then each history turn as a user/assistant pair (oldest
    /// first), then the current user message.
    pub fn build(
        system_prompt: &str,
        history: &[ConversationTurn],
        enhanced_user_text: &str,
    ) -> Vec<Message> {
        let mut messages = Vec::with_capacity(history.len() * 2 + 2);
        messages.push(Message::system(system_prompt));
        for turn in history {
            messages.push(Message::user(&turn.user_text));
            messages.push(Message::assistant(&turn.assistant_text));
        }
        messages.push(Message::user(enhanced_user_text));
        messages
    }
}
