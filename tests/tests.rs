// ../tests/tests.rs
mod common;

use std::fs;
use taleforge::character::{Class, Race, starting_max_hp};
use taleforge::composer::{PointBuyMode, PointBuyRules};
use taleforge::creation::{AiStatSuggestion, CharacterDraft, suggest_or_neutral};
use taleforge::directive::DirectiveKind;
use taleforge::error::{ComposeError, CreationError, NarrationError};
use taleforge::parser::finalize;
use taleforge::reducer::{SceneState, apply_all};
use taleforge::stats::{StatBlock, StatName};

fn dummy_suggestion() -> AiStatSuggestion {
    let json_str = fs::read_to_string("tests/dummy_backstory_analysis.json")
        .expect("Failed to read dummy backstory analysis JSON file");
    AiStatSuggestion::from_json(&json_str).expect("Failed to parse backstory analysis")
}

fn dummy_draft() -> CharacterDraft {
    let mut draft = CharacterDraft::new(PointBuyRules::default());
    draft.set_name("  Mira ").expect("name");
    draft.choose_race("elf").expect("race");
    draft.choose_class("ranger").expect("class");
    draft
        .set_backstory("Raised by wolves at the edge of the Thornwood.")
        .expect("backstory");
    draft
}

#[test]
fn test_backstory_analysis_from_json() {
    let suggestion = dummy_suggestion();

    assert_eq!(suggestion.stat_modifiers.get(StatName::Constitution), 2);
    assert_eq!(suggestion.stat_modifiers.get(StatName::Charisma), -1);
    // Unknown attribute keys are ignored.
    assert_eq!(suggestion.stat_modifiers.len(), 2);
    assert_eq!(suggestion.world_elements.len(), 2);
    assert_eq!(suggestion.skills[0].name, "Wolf Speech");
}

#[test]
fn test_invalid_analysis_json_has_its_own_error() {
    // Same conversion the analyst applies to the model's reply.
    fn analysis(json: &str) -> Result<AiStatSuggestion, NarrationError> {
        Ok(AiStatSuggestion::from_json(json)?)
    }

    let error = analysis("Sure! Here are the stats: {").expect_err("not JSON");
    assert!(matches!(error, NarrationError::InvalidAnalysis(_)));
    assert!(error.to_string().starts_with("Backstory analysis is not valid JSON"));
    assert!(analysis("{}").is_ok());
}

#[test]
fn test_character_creation_from_suggestion() {
    // Step 1: Pick identity, race and class
    let mut draft = dummy_draft();
    draft.set_nsfw(true);
    let baseline = draft.baseline();
    assert_eq!(baseline.get(StatName::Dexterity), 13);
    assert_eq!(baseline.get(StatName::Intelligence), 11);
    assert_eq!(baseline.get(StatName::Wisdom), 12);

    // Step 2: Apply the backstory analysis
    draft.apply_suggestion(dummy_suggestion());
    assert_eq!(draft.point_buy().reference().get(StatName::Constitution), 12);
    assert_eq!(draft.point_buy().reference().get(StatName::Charisma), 9);

    // Step 3: Tune by hand
    draft.point_buy().increment(StatName::Constitution).expect("inc");
    draft.point_buy().increment(StatName::Constitution).expect("inc");
    draft.point_buy().decrement(StatName::Charisma).expect("dec");
    assert_eq!(draft.point_buy().spent(), 1);

    // Step 4: Finalize and verify the sheet
    let sheet = draft.finalize().expect("valid character");
    assert_eq!(sheet.name(), "Mira");
    assert_eq!(sheet.identity().race(), Race::Elf);
    assert_eq!(sheet.identity().class(), Class::Ranger);
    assert!(sheet.identity().nsfw_enabled());
    assert_eq!(sheet.title(), "Mira, Elf Ranger");
    assert_eq!(sheet.stats.get(StatName::Constitution), 14);
    assert_eq!(sheet.stats.get(StatName::Charisma), 8);
    assert_eq!(sheet.max_hp, 24);
    assert_eq!(sheet.hp, 24);
    assert!(sheet.statuses.is_empty());
    assert_eq!(sheet.skills[0].name, "Wolf Speech");
    assert_eq!(sheet.world_elements.len(), 2);

    println!("Created Character Sheet: {:?}", sheet);
}

#[test]
fn test_character_sheet_json_shape() {
    let sheet = dummy_draft().finalize().expect("valid character");
    let json = serde_json::to_value(&sheet).expect("sheet serializes");

    assert_eq!(json["name"], "Mira");
    assert_eq!(json["race"], "elf");
    assert_eq!(json["class"], "ranger");
    assert_eq!(json["nsfwEnabled"], false);
    assert_eq!(json["maxHp"], 20);
    assert_eq!(json["stats"]["Dexterity"], 13);

    let back: taleforge::CharacterSheet = serde_json::from_value(json).expect("sheet deserializes");
    assert_eq!(back, sheet);
}

#[test]
fn test_creation_errors() {
    let mut draft = CharacterDraft::new(PointBuyRules::default());
    assert!(matches!(draft.set_name("   "), Err(CreationError::MissingName)));
    assert!(matches!(
        draft.choose_race("troll"),
        Err(CreationError::UnknownRace(_))
    ));
    assert!(matches!(
        draft.choose_class("bard"),
        Err(CreationError::UnknownClass(_))
    ));
    assert!(matches!(
        draft.set_backstory(""),
        Err(CreationError::MissingBackstory)
    ));
    assert!(matches!(
        draft.clone().finalize(),
        Err(CreationError::MissingName)
    ));

    draft.set_name("Bren").expect("name");
    assert!(matches!(
        draft.clone().finalize(),
        Err(CreationError::MissingRace)
    ));
    draft.choose_race("dwarf").expect("race");
    assert!(matches!(
        draft.clone().finalize(),
        Err(CreationError::MissingClass)
    ));
    draft.choose_class("warrior").expect("class");
    assert!(matches!(
        draft.clone().finalize(),
        Err(CreationError::MissingBackstory)
    ));
}

#[test]
fn test_finalize_rechecks_the_budget() {
    let mut draft = dummy_draft();
    draft.set_mode(PointBuyMode::Unbounded);
    for _ in 0..8 {
        draft.point_buy().increment(StatName::Strength).expect("unbounded");
    }
    draft.set_mode(PointBuyMode::Bounded);

    assert!(matches!(
        draft.finalize(),
        Err(CreationError::Compose(ComposeError::PoolExceeded { .. }))
    ));
}

#[test]
fn test_finalize_without_analysis_uses_placeholders() {
    let sheet = dummy_draft().finalize().expect("valid character");

    assert_eq!(sheet.world_elements.len(), 1);
    assert_eq!(sheet.skills.len(), 1);
    assert_eq!(sheet.stats.get(StatName::Wisdom), 12);
}

#[tokio::test]
async fn test_neutral_suggestion_without_api_key() {
    let suggestion = suggest_or_neutral(None, Race::Orc, Class::Rogue, "A quiet thief.").await;

    assert!(suggestion.stat_modifiers.is_zero());
    assert_eq!(suggestion.world_elements.len(), 1);
    assert_eq!(suggestion.skills.len(), 1);
}

#[test]
fn test_starting_max_hp() {
    let mut stats = StatBlock::default();
    assert_eq!(starting_max_hp(&stats), 20);
    stats.set(StatName::Constitution, 16);
    assert_eq!(starting_max_hp(&stats), 26);
    stats.set(StatName::Constitution, 7);
    assert_eq!(starting_max_hp(&stats), 16);
    stats.set(StatName::Constitution, -6);
    assert_eq!(starting_max_hp(&stats), 10);
}

#[test]
fn test_catalogs() {
    assert_eq!(Race::Human.stat_modifiers().get(StatName::Charisma), 1);
    assert_eq!(Race::Orc.stat_modifiers().get(StatName::Charisma), -1);
    assert_eq!(Class::Mage.stat_modifiers().get(StatName::Intelligence), 2);
    assert_eq!(Class::Warrior.abilities(), ["Second Wind", "Action Surge"]);
    assert_eq!(Class::Rogue.to_string(), "rogue");
}

#[test]
fn test_full_narration_from_file() {
    let narration = fs::read_to_string("tests/dummy_narration.txt")
        .expect("Failed to read dummy narration file");
    let parsed = finalize(&narration);

    assert_eq!(
        parsed.text,
        "Mist curls between the pines as you step into the Thornwood.\n\nAn old woodcutter raises a hand in greeting. \"Careful,\" he says, \"the path shifts after dusk.\""
    );
    let kinds: Vec<DirectiveKind> = parsed.directives.iter().map(|d| d.kind).collect();
    assert_eq!(
        kinds,
        vec![
            DirectiveKind::FocusUpdate,
            DirectiveKind::StatusUpdate,
            DirectiveKind::DiceRequest
        ]
    );

    let reduction = apply_all(SceneState::new(common::dummy_sheet()), &parsed.directives);
    assert!(reduction.rejected.is_empty());
    let focus = reduction.state.focus.expect("focus set");
    assert_eq!(focus.name, "Old Tomas");
    assert_eq!(focus.hp, Some(9));
    assert_eq!(reduction.state.sheet.statuses, vec!["Uneasy"]);
    assert_eq!(
        reduction.state.roll_gate.request().map(|r| r.id.as_str()),
        Some("roll-1")
    );
}
