use thiserror::Error;

/// The prompt mechanism could not be shown at all
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("prompt unavailable: {0}")]
pub struct PromptUnavailable(pub String);

/// One-shot dialogs shown when a session's first round starts. These may
/// block; they are called at most once per session.
pub trait Prompter {
    /// Asks whether to begin. `Ok(false)` declines the session.
    fn confirm_start(&mut self) -> Result<bool, PromptUnavailable>;
    /// Returns `false` when the player asked to quit instead of starting.
    fn show_instructions(&mut self) -> bool;
}

pub const WELCOME_TITLE: &str = "Welcome to Battleship!";

pub const INSTRUCTIONS: &str = "The goal is to identify each hidden shape with as few searches as possible.\n\
Select a tile by resting the pointer on it until it flips.\n\
Once every tile of the shape is found, a new round starts with a new shape.\n\
Good luck!";

/// Prompter with a fixed answer, for tests and headless runs.
#[derive(Debug, Clone, Default)]
pub struct ScriptedPrompter {
    /// `None` behaves as an unavailable prompt
    pub answer: Option<bool>,
    pub quit_at_instructions: bool,
    pub confirms: usize,
    pub instructions: usize,
}

impl ScriptedPrompter {
    pub fn accepting() -> Self {
        Self {
            answer: Some(true),
            ..Self::default()
        }
    }

    pub fn declining() -> Self {
        Self {
            answer: Some(false),
            ..Self::default()
        }
    }

    pub fn unavailable() -> Self {
        Self::default()
    }

    /// Accepts the start prompt, then quits from the instructions.
    pub fn quitting() -> Self {
        Self {
            answer: Some(true),
            quit_at_instructions: true,
            ..Self::default()
        }
    }
}

impl Prompter for ScriptedPrompter {
    fn confirm_start(&mut self) -> Result<bool, PromptUnavailable> {
        self.confirms += 1;
        self.answer
            .ok_or_else(|| PromptUnavailable("no prompt available".into()))
    }

    fn show_instructions(&mut self) -> bool {
        self.instructions += 1;
        !self.quit_at_instructions
    }
}
