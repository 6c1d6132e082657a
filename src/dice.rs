// Dice resolution: d20 checks against the composed stats, and the one-roll-at-a-time gate.
use crate::directive::DiceRollRequest;
use crate::error::{DiceError, DirectiveError};
use crate::stats::{StatBlock, StatName};
use rand::Rng;
use serde::{Deserialize, Serialize};

pub const DIE_SIDES: i32 = 20;

// Result of one attribute check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SingleStatRollResult {
    pub stat_name: StatName,
    pub dice_value: i32, // 1..=20
    pub modifier: i32,
    pub total_value: i32, // dice_value + modifier
}

// Full report for one request. Never mutated once produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiceRollReport {
    pub roll_id: String,
    pub roll_description: String,
    pub results: Vec<SingleStatRollResult>,
}

impl DiceRollReport {
    // "Strength - total 16 (roll 14, mod +2); Wisdom - total 7 (roll 8, mod -1)"
    pub fn results_summary(&self) -> String {
        self.results
            .iter()
            .map(|result| {
                format!(
                    "{} - total {} (roll {}, mod {})",
                    result.stat_name,
                    result.total_value,
                    result.dice_value,
                    signed(result.modifier)
                )
            })
            .collect::<Vec<_>>()
            .join("; ")
    }

    // The correlated message sent back to the narrator.
    pub fn to_narration_message(&self) -> String {
        format!(
            "[Roll result for \"{}\" (ID: {}): {}]",
            self.roll_description,
            self.roll_id,
            self.results_summary()
        )
    }

    // The notice shown to the player.
    pub fn to_player_notice(&self) -> String {
        format!(
            "You rolled for \"{}\": {}",
            self.roll_description,
            self.results_summary()
        )
    }
}

fn signed(modifier: i32) -> String {
    if modifier > 0 {
        format!("+{modifier}")
    } else {
        modifier.to_string()
    }
}

// Roll one d20 per requested attribute, in request order, against the current stats.
pub fn resolve(request: &DiceRollRequest, stats: &StatBlock, rng: &mut impl Rng) -> DiceRollReport {
    let results = request
        .stats_to_roll
        .iter()
        .map(|stat| {
            let dice_value = roll_die(rng);
            let modifier = stats.modifier(*stat);
            SingleStatRollResult {
                stat_name: *stat,
                dice_value,
                modifier,
                total_value: dice_value + modifier,
            }
        })
        .collect();

    DiceRollReport {
        roll_id: request.id.clone(),
        roll_description: request.description.clone(),
        results,
    }
}

// Helper function to roll a single die.
fn roll_die(rng: &mut impl Rng) -> i32 {
    rng.random_range(1..=DIE_SIDES)
}

// At most one roll is outstanding. The gate moves Idle -> Awaiting -> Rolled -> Idle,
// and only releasing a dispatched report brings it back to Idle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum RollGate {
    #[default]
    Idle,
    Awaiting(DiceRollRequest),
    Rolled {
        request: DiceRollRequest,
        report: DiceRollReport,
    },
}

impl RollGate {
    pub fn is_active(&self) -> bool {
        !matches!(self, RollGate::Idle)
    }

    pub fn request(&self) -> Option<&DiceRollRequest> {
        match self {
            RollGate::Idle => None,
            RollGate::Awaiting(request) | RollGate::Rolled { request, .. } => Some(request),
        }
    }

    // Accept a new request only when nothing is pending. The in-flight one is never overwritten.
    pub fn arm(&mut self, request: DiceRollRequest) -> Result<(), DirectiveError> {
        if let Some(active) = self.request() {
            return Err(DirectiveError::RollAlreadyActive {
                active: active.id.clone(),
                rejected: request.id,
            });
        }
        log::debug!("Dice roll {:?} armed: {}", request.id, request.description);
        *self = RollGate::Awaiting(request);
        Ok(())
    }

    // Produce the report for the pending request. Once rolled, the same report is returned again,
    // so a retried dispatch can never re-roll.
    pub fn roll(&mut self, stats: &StatBlock, rng: &mut impl Rng) -> Result<DiceRollReport, DiceError> {
        match self {
            RollGate::Idle => Err(DiceError::NoActiveRoll),
            RollGate::Rolled { report, .. } => Ok(report.clone()),
            RollGate::Awaiting(request) => {
                let request = request.clone();
                let report = resolve(&request, stats, rng);
                log::info!("Rolled {:?}: {}", report.roll_id, report.results_summary());
                *self = RollGate::Rolled {
                    request,
                    report: report.clone(),
                };
                Ok(report)
            }
        }
    }

    // Called once the report has been handed to the narration channel.
    pub fn release(&mut self, report: &DiceRollReport) -> Result<DiceRollRequest, DiceError> {
        match std::mem::take(self) {
            RollGate::Rolled { request, report: rolled } if rolled == *report => Ok(request),
            RollGate::Rolled { request, report: rolled } => {
                let error = DiceError::MismatchedReport {
                    active: rolled.roll_id.clone(),
                    report: report.roll_id.clone(),
                };
                *self = RollGate::Rolled {
                    request,
                    report: rolled,
                };
                Err(error)
            }
            other => {
                *self = other;
                Err(DiceError::NoActiveRoll)
            }
        }
    }
}
