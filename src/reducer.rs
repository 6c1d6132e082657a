// Applies narrator directives to the character-and-scene state, strictly in textual order.
use crate::character::CharacterSheet;
use crate::dice::RollGate;
use crate::directive::{Directive, DirectiveKind, DirectiveOccurrence, FocusTarget};
use crate::error::DirectiveError;

// Everything a response can mutate. Threaded by value through the session loop.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneState {
    pub sheet: CharacterSheet,
    pub focus: Option<FocusTarget>,
    pub roll_gate: RollGate,
}

impl SceneState {
    pub fn new(sheet: CharacterSheet) -> Self {
        Self {
            sheet,
            focus: None,
            roll_gate: RollGate::default(),
        }
    }
}

// A directive that was dropped, with why. Logged, never shown to the player.
#[derive(Debug, Clone, PartialEq)]
pub struct Rejection {
    pub kind: DirectiveKind,
    pub payload: String,
    pub error: DirectiveError,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Reduction {
    pub state: SceneState,
    pub applied: Vec<DirectiveKind>,
    pub rejected: Vec<Rejection>,
}

impl Reduction {
    pub fn roll_armed(&self) -> bool {
        self.applied.contains(&DirectiveKind::DiceRequest)
    }
}

// Apply one validated directive. A rejection hands the untouched state back alongside the error.
pub fn apply(
    mut state: SceneState,
    directive: Directive,
) -> Result<SceneState, (SceneState, DirectiveError)> {
    match directive {
        Directive::Hp(update) => {
            if let Some(hp) = update.hp {
                state.sheet.hp = hp;
            }
            if let Some(max_hp) = update.max_hp {
                state.sheet.max_hp = max_hp;
            }
        }
        Directive::Status(statuses) => state.sheet.statuses = statuses,
        Directive::Focus(focus) => state.focus = focus,
        Directive::DiceRoll(request) => {
            if let Err(e) = state.roll_gate.arm(request) {
                return Err((state, e));
            }
        }
    }
    Ok(state)
}

// Parse and apply every occurrence in order, so the last write of a kind wins.
// A bad directive is skipped; the rest still apply.
pub fn apply_all(state: SceneState, occurrences: &[DirectiveOccurrence]) -> Reduction {
    let mut reduction = Reduction {
        state,
        applied: Vec::new(),
        rejected: Vec::new(),
    };

    for occurrence in occurrences {
        let outcome = Directive::parse(occurrence).map_err(|e| (reduction.state.clone(), e));
        let outcome = outcome.and_then(|directive| apply(reduction.state.clone(), directive));
        match outcome {
            Ok(state) => {
                log::debug!("Applied {}", occurrence.kind);
                reduction.state = state;
                reduction.applied.push(occurrence.kind);
            }
            Err((state, error)) => {
                log::warn!(
                    "Dropped {} directive ({error}); payload: {}",
                    occurrence.kind,
                    occurrence.payload
                );
                reduction.state = state;
                reduction.rejected.push(Rejection {
                    kind: occurrence.kind,
                    payload: occurrence.payload.clone(),
                    error,
                });
            }
        }
    }
    reduction
}
