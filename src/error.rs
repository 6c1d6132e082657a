use crate::directive::DirectiveKind;
use crate::stats::StatName;
use thiserror::Error;

// Enum for handling application-level errors.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Session error: {0}")]
    Session(#[from] SessionError), // Errors raised while running the narration loop.

    #[error("Character creation error: {0}")]
    Creation(#[from] CreationError), // Errors raised while building the character sheet.

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error), // Errors related to data serialization.

    #[error("IO error: {0}")]
    IO(#[from] std::io::Error), // Input/output errors.

    #[error("Logger error: {0}")]
    Logger(String),

    #[error("Home directory could not be resolved")]
    NoHomeDirectory,
}

// A directive occurrence that was dropped instead of applied.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DirectiveError {
    #[error("{kind} payload is not valid JSON: {reason}")]
    MalformedPayload { kind: DirectiveKind, reason: String },

    #[error("{kind} payload has the wrong shape: {reason}")]
    ShapeMismatch { kind: DirectiveKind, reason: String },

    #[error("Unknown attribute {0:?} in dice roll request")]
    UnknownAttribute(String),

    #[error("Dice roll {rejected:?} rejected while roll {active:?} is still pending")]
    RollAlreadyActive { active: String, rejected: String },
}

impl DirectiveError {
    pub fn malformed(kind: DirectiveKind, reason: impl ToString) -> Self {
        DirectiveError::MalformedPayload {
            kind,
            reason: reason.to_string(),
        }
    }

    pub fn shape(kind: DirectiveKind, reason: impl ToString) -> Self {
        DirectiveError::ShapeMismatch {
            kind,
            reason: reason.to_string(),
        }
    }
}

// Rejected manual stat adjustments. The Display text is shown to the player as-is.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ComposeError {
    #[error("{stat} cannot go below {floor}.")]
    BelowFloor { stat: StatName, floor: i32 },

    #[error(
        "You cannot raise the stat total by more than {pool} points over the suggested stats. Prospective change: {prospective}"
    )]
    PoolExceeded { pool: i32, prospective: i32 },

    #[error(
        "You cannot lower the stat total by more than {pool} points under the suggested stats. Prospective change: {prospective}"
    )]
    PoolUnderrun { pool: i32, prospective: i32 },
}

#[derive(Debug, Error)]
pub enum NarrationError {
    #[error("OpenAI API error: {0}")]
    OpenAI(#[from] async_openai::error::OpenAIError),

    #[error("No API key configured for the narrator")]
    MissingApiKey,

    #[error("Narration channel not initialized")]
    NotInitialized,

    #[error("Narration stream failed: {0}")]
    Stream(String),

    #[error("Narrator returned no content")]
    NoContent,

    #[error("Backstory analysis is not valid JSON: {0}")]
    InvalidAnalysis(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DiceError {
    #[error("No dice roll is pending")]
    NoActiveRoll,

    #[error("Report {report:?} does not belong to the pending roll {active:?}")]
    MismatchedReport { active: String, report: String },
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Input is empty")]
    EmptyInput,

    #[error("Roll the dice for \"{0}\" before sending anything else")]
    RollPending(String),

    #[error("The narrator is unavailable for this session: {0}")]
    Disabled(String),

    #[error("Narration error: {0}")]
    Narration(#[from] NarrationError),

    #[error("Dice error: {0}")]
    Dice(#[from] DiceError),
}

#[derive(Debug, Error)]
pub enum CreationError {
    #[error("Please enter a name for your character.")]
    MissingName,

    #[error("Unknown race {0:?}")]
    UnknownRace(String),

    #[error("Unknown class {0:?}")]
    UnknownClass(String),

    #[error("Please choose a race for your character.")]
    MissingRace,

    #[error("Please choose a class for your character.")]
    MissingClass,

    #[error("Please write a backstory. Even a short one will do!")]
    MissingBackstory,

    #[error("{0}")]
    Compose(#[from] ComposeError),
}
