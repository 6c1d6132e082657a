// Stat composition: base stats, race and class modifiers, AI suggestions, then manual point-buy.
use crate::error::ComposeError;
use crate::stats::{MANUAL_POINTS_POOL, MIN_STAT_VALUE, StatBlock, StatDeltas, StatName};
use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;

// Whether manual tuning is held to the signed point pool.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PointBuyMode {
    #[default]
    Bounded,
    Unbounded, // Only the floor applies.
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointBuyRules {
    pub pool: i32,  // Max signed deviation from the post-AI reference, in either direction.
    pub floor: i32, // No manually tuned attribute may end below this.
}

impl Default for PointBuyRules {
    fn default() -> Self {
        Self {
            pool: MANUAL_POINTS_POOL,
            floor: MIN_STAT_VALUE,
        }
    }
}

// Base plus race plus class: the snapshot shown before any AI or manual tuning.
pub fn ai_baseline(base: &StatBlock, race: &StatDeltas, class: &StatDeltas) -> StatBlock {
    base.with_deltas(race).with_deltas(class)
}

// Full composition. Manual deltas are validated as if applied one unit at a time,
// which is equivalent to checking the floor and pool on the final values.
pub fn compose(
    base: &StatBlock,
    race: &StatDeltas,
    class: &StatDeltas,
    ai: &StatDeltas,
    manual: &StatDeltas,
    mode: PointBuyMode,
    rules: PointBuyRules,
) -> Result<StatBlock, ComposeError> {
    let reference = ai_baseline(base, race, class).with_deltas(ai);
    let prospective = reference.with_deltas(manual);
    let touched = manual
        .iter()
        .filter(|(_, delta)| **delta != 0)
        .map(|(stat, _)| *stat);
    check(&prospective, &reference, touched, mode, rules)?;
    Ok(prospective)
}

fn check(
    prospective: &StatBlock,
    reference: &StatBlock,
    touched: impl IntoIterator<Item = StatName>,
    mode: PointBuyMode,
    rules: PointBuyRules,
) -> Result<(), ComposeError> {
    if let Some(stat) = touched
        .into_iter()
        .find(|stat| prospective.get(*stat) < rules.floor)
    {
        return Err(ComposeError::BelowFloor {
            stat,
            floor: rules.floor,
        });
    }
    if mode == PointBuyMode::Unbounded {
        return Ok(());
    }

    let total = prospective.deviation_from(reference);
    if total > rules.pool {
        Err(ComposeError::PoolExceeded {
            pool: rules.pool,
            prospective: total,
        })
    } else if total < -rules.pool {
        Err(ComposeError::PoolUnderrun {
            pool: rules.pool,
            prospective: total,
        })
    } else {
        Ok(())
    }
}

// Interactive manual tuning on top of the post-AI reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PointBuy {
    reference: StatBlock,
    current: StatBlock,
    mode: PointBuyMode,
    rules: PointBuyRules,
}

impl PointBuy {
    pub fn new(reference: StatBlock, mode: PointBuyMode, rules: PointBuyRules) -> Self {
        Self {
            current: reference.clone(),
            reference,
            mode,
            rules,
        }
    }

    pub fn increment(&mut self, stat: StatName) -> Result<i32, ComposeError> {
        self.step(stat, 1)
    }

    pub fn decrement(&mut self, stat: StatName) -> Result<i32, ComposeError> {
        self.step(stat, -1)
    }

    // Checks the prospective block before committing; a rejection leaves everything untouched.
    fn step(&mut self, stat: StatName, delta: i32) -> Result<i32, ComposeError> {
        let value = self.current.get(stat) + delta;
        let mut prospective = self.current.clone();
        prospective.set(stat, value);

        if let Err(e) = check(&prospective, &self.reference, [stat], self.mode, self.rules) {
            log::debug!("Rejected {stat} {delta:+}: {e}");
            return Err(e);
        }
        self.current = prospective;
        Ok(value)
    }

    // Signed total deviation, always recomputed from the per-attribute differences.
    pub fn spent(&self) -> i32 {
        self.current.deviation_from(&self.reference)
    }

    pub fn points_available_to_add(&self) -> i32 {
        self.rules.pool - self.spent()
    }

    pub fn points_available_to_reduce(&self) -> i32 {
        self.rules.pool + self.spent()
    }

    pub fn can_increment(&self) -> bool {
        self.mode == PointBuyMode::Unbounded || self.spent() < self.rules.pool
    }

    pub fn can_decrement(&self, stat: StatName) -> bool {
        self.current.get(stat) > self.rules.floor
            && (self.mode == PointBuyMode::Unbounded || self.spent() > -self.rules.pool)
    }

    pub fn mode(&self) -> PointBuyMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: PointBuyMode) {
        self.mode = mode;
    }

    pub fn rules(&self) -> PointBuyRules {
        self.rules
    }

    pub fn reference(&self) -> &StatBlock {
        &self.reference
    }

    pub fn current(&self) -> &StatBlock {
        &self.current
    }

    pub fn manual_delta(&self) -> StatDeltas {
        let mut deltas = StatDeltas::new();
        for stat in StatName::iter() {
            let delta = self.current.get(stat) - self.reference.get(stat);
            if delta != 0 {
                deltas.add(stat, delta);
            }
        }
        deltas
    }

    // Re-checks the whole block, e.g. after switching back from unbounded mode.
    pub fn validate(&self) -> Result<(), ComposeError> {
        let touched: Vec<StatName> = self.manual_delta().iter().map(|(stat, _)| *stat).collect();
        check(&self.current, &self.reference, touched, self.mode, self.rules)
    }

    pub fn reset(&mut self) {
        self.current = self.reference.clone();
    }
}
