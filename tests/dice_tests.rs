mod common;

use common::dummy_stats;
use rand::SeedableRng;
use rand::rngs::StdRng;
use taleforge::dice::{DiceRollReport, RollGate, SingleStatRollResult, resolve};
use taleforge::directive::DiceRollRequest;
use taleforge::error::{DiceError, DirectiveError};
use taleforge::stats::{StatName, modifier};

fn climb() -> DiceRollRequest {
    DiceRollRequest {
        id: "r1".to_string(),
        stats_to_roll: vec![StatName::Strength, StatName::Wisdom],
        description: "climb".to_string(),
    }
}

#[test]
fn test_modifier_table() {
    let table = [(1, -5), (3, -4), (8, -1), (9, -1), (10, 0), (11, 0), (14, 2), (15, 2), (20, 5)];
    for (value, expected) in table {
        assert_eq!(modifier(value), expected, "modifier of {value}");
    }
}

#[test]
fn test_resolve_uses_current_stats_in_request_order() {
    let mut rng = StdRng::seed_from_u64(42);

    for _ in 0..500 {
        let report = resolve(&climb(), &dummy_stats(), &mut rng);

        assert_eq!(report.roll_id, "r1");
        assert_eq!(report.roll_description, "climb");
        assert_eq!(report.results.len(), 2);

        let strength = &report.results[0];
        assert_eq!(strength.stat_name, StatName::Strength);
        assert_eq!(strength.modifier, 2);
        assert!((1..=20).contains(&strength.dice_value));
        assert_eq!(strength.total_value, strength.dice_value + 2);

        let wisdom = &report.results[1];
        assert_eq!(wisdom.stat_name, StatName::Wisdom);
        assert_eq!(wisdom.modifier, -1);
        assert!((1..=20).contains(&wisdom.dice_value));
        assert_eq!(wisdom.total_value, wisdom.dice_value - 1);
    }
}

#[test]
fn test_same_seed_same_report() {
    let first = resolve(&climb(), &dummy_stats(), &mut StdRng::seed_from_u64(7));
    let second = resolve(&climb(), &dummy_stats(), &mut StdRng::seed_from_u64(7));

    assert_eq!(first, second);
}

#[test]
fn test_every_face_shows_up() {
    let mut rng = StdRng::seed_from_u64(3);
    let request = DiceRollRequest {
        id: "many".to_string(),
        stats_to_roll: vec![StatName::Charisma; 1000],
        description: "persuade the crowd".to_string(),
    };
    let report = resolve(&request, &dummy_stats(), &mut rng);

    for face in 1..=20 {
        assert!(
            report.results.iter().any(|r| r.dice_value == face),
            "face {face} never rolled"
        );
    }
}

#[test]
fn test_report_messages() {
    let report = DiceRollReport {
        roll_id: "r1".to_string(),
        roll_description: "climb".to_string(),
        results: vec![
            SingleStatRollResult {
                stat_name: StatName::Strength,
                dice_value: 14,
                modifier: 2,
                total_value: 16,
            },
            SingleStatRollResult {
                stat_name: StatName::Wisdom,
                dice_value: 8,
                modifier: -1,
                total_value: 7,
            },
            SingleStatRollResult {
                stat_name: StatName::Dexterity,
                dice_value: 3,
                modifier: 0,
                total_value: 3,
            },
        ],
    };

    let summary = "Strength - total 16 (roll 14, mod +2); Wisdom - total 7 (roll 8, mod -1); Dexterity - total 3 (roll 3, mod 0)";
    assert_eq!(report.results_summary(), summary);
    assert_eq!(
        report.to_narration_message(),
        format!("[Roll result for \"climb\" (ID: r1): {summary}]")
    );
    assert_eq!(
        report.to_player_notice(),
        format!("You rolled for \"climb\": {summary}")
    );
}

#[test]
fn test_report_serializes_camel_case() {
    let report = resolve(&climb(), &dummy_stats(), &mut StdRng::seed_from_u64(1));
    let json = serde_json::to_value(&report).expect("report serializes");

    assert_eq!(json["rollId"], "r1");
    assert_eq!(json["results"][0]["statName"], "Strength");
    assert!(json["results"][1]["totalValue"].is_i64());
}

#[test]
fn test_gate_lifecycle() {
    let mut gate = RollGate::default();
    let mut rng = StdRng::seed_from_u64(11);
    assert!(!gate.is_active());
    assert_eq!(
        gate.roll(&dummy_stats(), &mut rng),
        Err(DiceError::NoActiveRoll)
    );

    gate.arm(climb()).expect("idle gate accepts a request");
    assert!(gate.is_active());

    let dodge = DiceRollRequest {
        id: "r2".to_string(),
        stats_to_roll: vec![StatName::Dexterity],
        description: "dodge".to_string(),
    };
    assert_eq!(
        gate.arm(dodge),
        Err(DirectiveError::RollAlreadyActive {
            active: "r1".to_string(),
            rejected: "r2".to_string()
        })
    );

    let report = gate.roll(&dummy_stats(), &mut rng).expect("roll");
    // Rolling again hands back the same report instead of re-rolling.
    let again = gate.roll(&dummy_stats(), &mut rng).expect("roll again");
    assert_eq!(report, again);
    assert!(gate.is_active());

    let mut forged = report.clone();
    forged.roll_id = "r9".to_string();
    assert!(matches!(
        gate.release(&forged),
        Err(DiceError::MismatchedReport { .. })
    ));
    assert!(gate.is_active());

    let released = gate.release(&report).expect("release");
    assert_eq!(released, climb());
    assert_eq!(gate, RollGate::Idle);
    assert_eq!(gate.release(&report), Err(DiceError::NoActiveRoll));
}

#[test]
fn test_release_before_roll_keeps_the_request() {
    let mut gate = RollGate::default();
    gate.arm(climb()).expect("arm");
    let report = resolve(&climb(), &dummy_stats(), &mut StdRng::seed_from_u64(5));

    assert_eq!(gate.release(&report), Err(DiceError::NoActiveRoll));
    assert_eq!(gate, RollGate::Awaiting(climb()));
}
