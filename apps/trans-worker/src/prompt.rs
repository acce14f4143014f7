//! Prompt text for each side-channel task.

use ligo_common::Language;

/// What the backend is being asked to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Task {
    Translate(Language),
    CheckGrammar,
    AskBot,
}

impl Task {
    fn instruction(self) -> String {
        match self {
            Task::Translate(language) => format!(
                "translates the text to {}. You will only reply with the translation text and nothing else",
                language.name()
            ),
            Task::CheckGrammar => "checks grammar for the text. You will only reply with the corrected text in the text language and nothing else".to_string(),
            Task::AskBot => "answers for the following text".to_string(),
        }
    }
}

/// Build the single user message sent to the backend.
pub fn build(task: Task, content: &str) -> String {
    format!(
        "You are a helpful assistant that {}. The text is: {}",
        task.instruction(),
        content.trim()
    )
}
