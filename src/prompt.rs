//! Interactive prompting capability.
//!
//! Every flow that needs user input takes an explicit `&mut dyn Prompt`
//! instead of reaching for stdin on its own. The terminal implementation
//! wraps [`inquire`]; tests substitute a scripted double that replays
//! canned answers.

use inquire::{Confirm, InquireError, Select, Text};
use thiserror::Error;

/// Failure raised by a prompting backend.
///
/// `Unavailable` covers the "no interactive terminal" case, which commands
/// translate into a non-zero exit; `Interrupted` means the user bailed out
/// of the prompt (Ctrl-C / Esc).
#[derive(Debug, Error)]
pub enum PromptError {
    #[error("interactive prompt unavailable: {0}")]
    Unavailable(String),

    #[error("prompt interrupted")]
    Interrupted,
}

/// A blocking line-input capability. One outstanding prompt at a time.
pub trait Prompt {
    /// Ask a free-form question and return the raw answer.
    fn ask(&mut self, question: &str) -> Result<String, PromptError>;

    /// Ask the user to pick one of `choices`; returns the chosen entry.
    fn select(&mut self, question: &str, choices: &[&str]) -> Result<String, PromptError>;

    /// Ask a yes/no question, defaulting to "no".
    fn confirm(&mut self, question: &str) -> Result<bool, PromptError>;
}

/// Terminal-backed prompt implementation.
pub struct TermPrompt;

impl Prompt for TermPrompt {
    fn ask(&mut self, question: &str) -> Result<String, PromptError> {
        Text::new(question).prompt().map_err(map_inquire_error)
    }

    fn select(&mut self, question: &str, choices: &[&str]) -> Result<String, PromptError> {
        Select::new(question, choices.to_vec())
            .prompt()
            .map(str::to_string)
            .map_err(map_inquire_error)
    }

    fn confirm(&mut self, question: &str) -> Result<bool, PromptError> {
        Confirm::new(question)
            .with_default(false)
            .prompt()
            .map_err(map_inquire_error)
    }
}

fn map_inquire_error(err: InquireError) -> PromptError {
    match err {
        InquireError::NotTTY => {
            PromptError::Unavailable("standard input is not a terminal".to_string())
        }
        InquireError::OperationCanceled | InquireError::OperationInterrupted => {
            PromptError::Interrupted
        }
        other => PromptError::Unavailable(other.to_string()),
    }
}

/// Scripted prompt double used by the test suites across the crate.
///
/// Answers are consumed front to back; `confirm` treats `y`/`yes`
/// (case-insensitive) as affirmative, anything else as a decline.
#[cfg(test)]
pub(crate) struct ScriptedPrompt {
    answers: std::collections::VecDeque<String>,
}

#[cfg(test)]
impl ScriptedPrompt {
    pub fn new<I>(answers: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        Self {
            answers: answers.into_iter().map(Into::into).collect(),
        }
    }

    /// A script with no answers; any prompt fails the flow under test.
    pub fn empty() -> Self {
        Self::new(Vec::<String>::new())
    }

    fn next(&mut self, question: &str) -> Result<String, PromptError> {
        self.answers
            .pop_front()
            .ok_or_else(|| PromptError::Unavailable(format!("script exhausted at: {question}")))
    }
}

#[cfg(test)]
impl Prompt for ScriptedPrompt {
    fn ask(&mut self, question: &str) -> Result<String, PromptError> {
        self.next(question)
    }

    fn select(&mut self, question: &str, _choices: &[&str]) -> Result<String, PromptError> {
        self.next(question)
    }

    fn confirm(&mut self, question: &str) -> Result<bool, PromptError> {
        let answer = self.next(question)?;
        let answer = answer.trim().to_ascii_lowercase();
        Ok(answer == "y" || answer == "yes")
    }
}
