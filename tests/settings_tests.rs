mod common;

use log::LevelFilter;
use taleforge::composer::PointBuyRules;
use taleforge::logging::level_for;
use taleforge::message::{Message, MessageType};
use taleforge::prompt::narrator_preamble;
use taleforge::settings::Settings;
use tempfile::tempdir;

#[test]
fn test_default_settings() {
    let settings = Settings::default();

    assert_eq!(settings.model, "gpt-4o-mini");
    assert_eq!(settings.language, "English");
    assert!(!settings.debug_mode);
    assert_eq!(settings.point_buy_rules(), PointBuyRules { pool: 6, floor: 3 });
}

#[test]
fn test_settings_round_trip() {
    let dir = tempdir().expect("temp dir");
    let path = dir.path().join("nested").join("settings.json");

    let settings = Settings {
        openai_api_key: Some("sk-test".to_string()),
        api_base: Some("http://localhost:8080/v1".to_string()),
        debug_mode: true,
        point_pool: 10,
        ..Settings::default()
    };
    settings.save_to_file(&path).expect("save");

    let loaded = Settings::load_settings_from_file(&path).expect("load");
    assert_eq!(loaded, settings);
    assert_eq!(loaded.point_buy_rules(), PointBuyRules { pool: 10, floor: 3 });
    assert_eq!(loaded.resolved_api_key().as_deref(), Some("sk-test"));
}

#[test]
fn test_partial_settings_file_uses_defaults() {
    let dir = tempdir().expect("temp dir");
    let path = dir.path().join("settings.json");
    std::fs::write(&path, r#"{ "model": "gpt-4o", "stat_floor": 5 }"#).expect("write");

    let loaded = Settings::load_settings_from_file(&path).expect("load");
    assert_eq!(loaded.model, "gpt-4o");
    assert_eq!(loaded.point_buy_rules(), PointBuyRules { pool: 6, floor: 5 });
    assert_eq!(loaded.language, "English");
}

#[test]
fn test_missing_settings_file_is_an_error() {
    let dir = tempdir().expect("temp dir");
    assert!(Settings::load_settings_from_file(&dir.path().join("absent.json")).is_err());
}

#[test]
fn test_log_level_follows_debug_mode() {
    assert_eq!(level_for(true), LevelFilter::Debug);
    assert_eq!(level_for(false), LevelFilter::Info);
}

#[test]
fn test_messages() {
    let message = Message::user("Hello");
    assert_eq!(message.message_type, MessageType::User);
    assert_eq!(message.content, "Hello");
    assert_ne!(Message::system("a").id, Message::system("a").id);
}

#[test]
fn test_narrator_preamble_embeds_the_sheet() {
    let sheet = common::dummy_sheet();
    let preamble = narrator_preamble(&sheet);

    assert!(preamble.contains("\"name\": \"Mira\""));
    assert!(preamble.contains("The Thornwood"));
    assert!(preamble.contains("general audience"));
    for tag in [
        "FOCUS_PANEL_UPDATE::",
        "PLAYER_STATUS_UPDATE::",
        "PLAYER_HP_UPDATE::",
        "DICE_ROLL_REQUEST::",
    ] {
        assert!(preamble.contains(tag), "{tag}");
    }
}
