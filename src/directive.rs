// Directive grammar: the inline `TAG::<json>` instructions the narrator embeds in its prose,
// and the typed payloads each kind validates into.
use crate::error::DirectiveError;
use crate::stats::StatName;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::ops::Range;
use std::str::FromStr;
use strum_macros::{Display, EnumIter};

pub const TAG_SEPARATOR: &str = "::";

// Every literal tag the scanner recognizes, state-mutating or not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter)]
pub enum Tag {
    FocusPanelUpdate,
    PlayerStatusUpdate,
    DiceRollRequest,
    PlayerHpUpdate,
    // Legacy tags: stripped from the prose, never applied.
    AwardXp,
    LevelUpInitiate,
}

impl Tag {
    pub fn literal(&self) -> &'static str {
        match self {
            Tag::FocusPanelUpdate => "FOCUS_PANEL_UPDATE",
            Tag::PlayerStatusUpdate => "PLAYER_STATUS_UPDATE",
            Tag::DiceRollRequest => "DICE_ROLL_REQUEST",
            Tag::PlayerHpUpdate => "PLAYER_HP_UPDATE",
            Tag::AwardXp => "AWARD_XP",
            Tag::LevelUpInitiate => "LEVEL_UP_INITIATE",
        }
    }

    // None for legacy tags, which must never reach the reducer.
    pub fn kind(&self) -> Option<DirectiveKind> {
        match self {
            Tag::FocusPanelUpdate => Some(DirectiveKind::FocusUpdate),
            Tag::PlayerStatusUpdate => Some(DirectiveKind::StatusUpdate),
            Tag::DiceRollRequest => Some(DirectiveKind::DiceRequest),
            Tag::PlayerHpUpdate => Some(DirectiveKind::HpUpdate),
            Tag::AwardXp | Tag::LevelUpInitiate => None,
        }
    }

    pub fn is_legacy(&self) -> bool {
        self.kind().is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum DirectiveKind {
    FocusUpdate,
    StatusUpdate,
    HpUpdate,
    DiceRequest,
}

impl DirectiveKind {
    pub fn tag(&self) -> Tag {
        match self {
            DirectiveKind::FocusUpdate => Tag::FocusPanelUpdate,
            DirectiveKind::StatusUpdate => Tag::PlayerStatusUpdate,
            DirectiveKind::HpUpdate => Tag::PlayerHpUpdate,
            DirectiveKind::DiceRequest => Tag::DiceRollRequest,
        }
    }
}

// A complete directive found in the narration, before validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectiveOccurrence {
    pub kind: DirectiveKind,
    pub payload: String,      // Raw JSON text: an object or `null`.
    pub span: Range<usize>,   // Byte span of the whole `TAG::payload` in the source text.
}

// Whoever the narration currently highlights.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FocusTarget {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub role: Option<String>,
    pub hp: Option<i64>,
    pub max_hp: Option<i64>,
    pub status: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HpUpdate {
    pub hp: Option<i64>,
    pub max_hp: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiceRollRequest {
    pub id: String, // Opaque token from the narrator, echoed back in the report.
    pub stats_to_roll: Vec<StatName>,
    pub description: String,
}

// A validated directive, ready for the reducer.
#[derive(Debug, Clone, PartialEq)]
pub enum Directive {
    Focus(Option<FocusTarget>), // None clears the focus panel.
    Status(Vec<String>),
    Hp(HpUpdate),
    DiceRoll(DiceRollRequest),
}

impl Directive {
    pub fn kind(&self) -> DirectiveKind {
        match self {
            Directive::Focus(_) => DirectiveKind::FocusUpdate,
            Directive::Status(_) => DirectiveKind::StatusUpdate,
            Directive::Hp(_) => DirectiveKind::HpUpdate,
            Directive::DiceRoll(_) => DirectiveKind::DiceRequest,
        }
    }

    // Parse the raw payload and run the shape check for its kind.
    pub fn parse(occurrence: &DirectiveOccurrence) -> Result<Self, DirectiveError> {
        let kind = occurrence.kind;
        let value: Value = serde_json::from_str(&occurrence.payload)
            .map_err(|e| DirectiveError::malformed(kind, e))?;

        match kind {
            DirectiveKind::FocusUpdate => parse_focus(value).map(Directive::Focus),
            DirectiveKind::StatusUpdate => parse_statuses(value).map(Directive::Status),
            DirectiveKind::HpUpdate => parse_hp(value).map(Directive::Hp),
            DirectiveKind::DiceRequest => parse_dice_request(value).map(Directive::DiceRoll),
        }
    }
}

fn expect_object(kind: DirectiveKind, value: Value) -> Result<Map<String, Value>, DirectiveError> {
    match value {
        Value::Object(map) => Ok(map),
        other => Err(DirectiveError::shape(
            kind,
            format!("expected an object, got {other}"),
        )),
    }
}

fn parse_focus(value: Value) -> Result<Option<FocusTarget>, DirectiveError> {
    let kind = DirectiveKind::FocusUpdate;
    if value.is_null() {
        return Ok(None);
    }
    let map = expect_object(kind, value)?;
    if map.is_empty() {
        return Ok(None);
    }

    let text = |field: &str| map.get(field).and_then(Value::as_str).map(String::from);
    Ok(Some(FocusTarget {
        name: text("name").unwrap_or_default(),
        kind: text("type").unwrap_or_default(),
        role: text("role"),
        hp: map.get("hp").and_then(coerce_integer),
        max_hp: map.get("maxHp").and_then(coerce_integer),
        status: text("status"),
        description: text("description"),
    }))
}

// Numbers pass through; numeric strings are parsed by their leading integer. Anything else is unset.
fn coerce_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(number) => number
            .as_i64()
            .or_else(|| number.as_f64().map(|float| float.trunc() as i64)),
        Value::String(text) => leading_integer(text),
        _ => None,
    }
}

fn leading_integer(text: &str) -> Option<i64> {
    let trimmed = text.trim_start();
    let sign_len = usize::from(trimmed.starts_with(['-', '+']));
    let digits = trimmed[sign_len..]
        .bytes()
        .take_while(u8::is_ascii_digit)
        .count();
    if digits == 0 {
        return None;
    }
    trimmed[..sign_len + digits].parse().ok()
}

fn parse_statuses(value: Value) -> Result<Vec<String>, DirectiveError> {
    let kind = DirectiveKind::StatusUpdate;
    let mut map = expect_object(kind, value)?;
    let Some(Value::Array(entries)) = map.remove("statuses") else {
        return Err(DirectiveError::shape(kind, "missing `statuses` array"));
    };

    entries
        .into_iter()
        .map(|entry| match entry {
            Value::String(status) => Ok(status),
            other => Err(DirectiveError::shape(
                kind,
                format!("status entry {other} is not a string"),
            )),
        })
        .collect()
}

// Present numeric fields overwrite; absent or non-numeric fields are left alone.
fn parse_hp(value: Value) -> Result<HpUpdate, DirectiveError> {
    let map = expect_object(DirectiveKind::HpUpdate, value)?;
    let number = |field: &str| {
        map.get(field).and_then(|value| match value {
            Value::Number(_) => coerce_integer(value),
            _ => None,
        })
    };
    Ok(HpUpdate {
        hp: number("hp"),
        max_hp: number("maxHp"),
    })
}

fn parse_dice_request(value: Value) -> Result<DiceRollRequest, DirectiveError> {
    let kind = DirectiveKind::DiceRequest;
    let map = expect_object(kind, value)?;

    let Some(Value::Array(entries)) = map.get("statsToRoll") else {
        return Err(DirectiveError::shape(kind, "missing `statsToRoll` array"));
    };
    if entries.is_empty() {
        return Err(DirectiveError::shape(kind, "`statsToRoll` is empty"));
    }
    let stats_to_roll = entries
        .iter()
        .map(|entry| {
            let name = entry
                .as_str()
                .ok_or_else(|| DirectiveError::UnknownAttribute(entry.to_string()))?;
            StatName::from_str(name).map_err(|_| DirectiveError::UnknownAttribute(name.to_string()))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let description = map
        .get("description")
        .and_then(Value::as_str)
        .ok_or_else(|| DirectiveError::shape(kind, "`description` must be a string"))?;
    let id = map
        .get("id")
        .and_then(Value::as_str)
        .ok_or_else(|| DirectiveError::shape(kind, "`id` must be a string"))?;

    Ok(DiceRollRequest {
        id: id.to_string(),
        stats_to_roll,
        description: description.to_string(),
    })
}
