pub mod character;
pub mod composer;
pub mod creation;
pub mod dice;
pub mod directive;
pub mod error;
pub mod logging;
pub mod message;
pub mod narration;
pub mod parser;
pub mod prompt;
pub mod reducer;
pub mod session;
pub mod settings;
pub mod stats;

// Re-export commonly used items for easier access
pub use character::{CharacterSheet, Class, Race};
pub use composer::{PointBuy, PointBuyMode, PointBuyRules};
pub use creation::{AiStatSuggestion, BackstoryAnalyst, CharacterDraft};
pub use dice::{DiceRollReport, RollGate};
pub use directive::{DiceRollRequest, Directive, DirectiveKind, FocusTarget};
pub use error::{AppError, ComposeError, DirectiveError, NarrationError, SessionError};
pub use message::{Message, MessageType};
pub use narration::{NarrationChannel, OpenAINarrator};
pub use parser::{ParsedResponse, StreamingParser};
pub use reducer::SceneState;
pub use session::{Session, SessionEvent};
pub use settings::Settings;
pub use stats::{StatBlock, StatName};
