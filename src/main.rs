use color_eyre::eyre::Result;
use std::collections::HashMap;
use std::io::Write;
use strum::IntoEnumIterator;
use taleforge::character::{Class, Race};
use taleforge::composer::PointBuyMode;
use taleforge::creation::{BackstoryAnalyst, CharacterDraft, suggest_or_neutral};
use taleforge::message::{MessageType, THINKING_PLACEHOLDER};
use taleforge::narration::OpenAINarrator;
use taleforge::session::{Session, SessionEvent};
use taleforge::settings::Settings;
use taleforge::stats::StatName;
use taleforge::{CharacterSheet, logging};
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::sync::mpsc;

type Input = Lines<BufReader<Stdin>>;

const HELP: &str = "Type what your character does. /roll rolls a requested check, /sheet shows your character, /quit leaves.";

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let settings = Settings::load().unwrap_or_default();
    if let Err(e) = logging::init(settings.debug_mode) {
        eprintln!("Logging disabled: {e}");
    }
    log::info!("Starting taleforge with model {}", settings.model);

    let mut input = BufReader::new(tokio::io::stdin()).lines();
    let api_key = settings.resolved_api_key();
    if api_key.is_none() {
        println!("No OpenAI API key found. Set it in the settings file or the OPENAI_API_KEY variable.");
    }

    let Some(sheet) = create_character(&settings, api_key.clone(), &mut input).await? else {
        return Ok(());
    };

    let narrator = OpenAINarrator::new(
        api_key.unwrap_or_default(),
        settings.api_base.clone(),
        settings.model.clone(),
    )
    .with_language(settings.language.clone());

    let (event_sender, event_receiver) = mpsc::unbounded_channel();
    let printer = tokio::spawn(print_events(event_receiver));
    let mut session = Session::start(sheet, narrator, event_sender).await;

    if !session.is_disabled() {
        println!("\n{HELP}\n");
        let _ = session.begin().await;
        run_session(&mut session, &mut input).await?;
    }

    drop(session);
    let _ = printer.await;
    Ok(())
}

async fn run_session(session: &mut Session<OpenAINarrator>, input: &mut Input) -> Result<()> {
    let mut rng = rand::rng();
    while let Some(line) = prompt_line(input, "> ").await? {
        match line.trim() {
            "/quit" => break,
            "/sheet" => print_sheet(&session.state().sheet),
            "/roll" => {
                if session.pending_roll().is_none() {
                    println!("No roll is pending.");
                    continue;
                }
                if let Err(e) = session.complete_roll(&mut rng).await {
                    log::warn!("Roll dispatch failed: {e}");
                }
            }
            text => match session.submit_input(text).await {
                Ok(_) => {}
                Err(taleforge::SessionError::Narration(_)) => {} // Already surfaced as a notice.
                Err(e) => println!("{e}"),
            },
        }
    }
    Ok(())
}

// region:  --- Character creation

async fn create_character(
    settings: &Settings,
    api_key: Option<String>,
    input: &mut Input,
) -> Result<Option<CharacterSheet>> {
    let mut draft = CharacterDraft::new(settings.point_buy_rules());

    loop {
        let Some(name) = prompt_line(input, "Character name: ").await? else {
            return Ok(None);
        };
        match draft.set_name(&name) {
            Ok(()) => break,
            Err(e) => println!("{e}"),
        }
    }

    for race in Race::iter() {
        println!("  {race:<8} {}", race.description());
    }
    loop {
        let Some(id) = prompt_line(input, "Race: ").await? else {
            return Ok(None);
        };
        match draft.choose_race(&id.to_lowercase()) {
            Ok(_) => break,
            Err(e) => println!("{e}"),
        }
    }

    for class in Class::iter() {
        let [first, second] = class.abilities();
        println!("  {class:<8} {} ({first}, {second})", class.description());
    }
    loop {
        let Some(id) = prompt_line(input, "Class: ").await? else {
            return Ok(None);
        };
        match draft.choose_class(&id.to_lowercase()) {
            Ok(_) => break,
            Err(e) => println!("{e}"),
        }
    }

    loop {
        let Some(backstory) = prompt_line(input, "Backstory: ").await? else {
            return Ok(None);
        };
        match draft.set_backstory(&backstory) {
            Ok(()) => break,
            Err(e) => println!("{e}"),
        }
    }

    let Some(nsfw) = prompt_line(input, "Allow mature content? (y/N): ").await? else {
        return Ok(None);
    };
    draft.set_nsfw(nsfw.trim().eq_ignore_ascii_case("y"));

    if let (Some(race), Some(class)) = (draft.race(), draft.class()) {
        println!("Reading your backstory...");
        let analyst = api_key
            .map(|key| BackstoryAnalyst::new(key, settings.api_base.clone(), settings.model.clone()));
        let suggestion = suggest_or_neutral(analyst.as_ref(), race, class, draft.backstory()).await;
        for element in &suggestion.world_elements {
            println!("  World: {element}");
        }
        for skill in &suggestion.skills {
            println!("  Skill: {} - {}", skill.name, skill.description);
        }
        draft.apply_suggestion(suggestion);
    }

    if !tune_stats(&mut draft, input).await? {
        return Ok(None);
    }

    loop {
        match draft.clone().finalize() {
            Ok(sheet) => {
                print_sheet(&sheet);
                return Ok(Some(sheet));
            }
            Err(e) => {
                println!("{e}");
                draft.point_buy().reset();
                if !tune_stats(&mut draft, input).await? {
                    return Ok(None);
                }
            }
        }
    }
}

// Manual point-buy. Returns false when input ends.
async fn tune_stats(draft: &mut CharacterDraft, input: &mut Input) -> Result<bool> {
    println!("Tune your stats: +str / -wis, 'free' toggles unbounded mode, 'reset', 'done'.");
    loop {
        print_stats(draft);
        let Some(command) = prompt_line(input, "stats> ").await? else {
            return Ok(false);
        };
        let command = command.trim().to_lowercase();
        match command.as_str() {
            "done" | "" => return Ok(true),
            "reset" => draft.point_buy().reset(),
            "free" => {
                let mode = match draft.point_buy().mode() {
                    PointBuyMode::Bounded => PointBuyMode::Unbounded,
                    PointBuyMode::Unbounded => PointBuyMode::Bounded,
                };
                draft.set_mode(mode);
                println!("Point-buy mode: {mode:?}");
            }
            _ => {
                let mut chars = command.chars();
                let sign = chars.next();
                let Some(stat) = find_stat(chars.as_str()) else {
                    println!("Unknown command {command:?}");
                    continue;
                };
                let outcome = match sign {
                    Some('+') => draft.point_buy().increment(stat),
                    Some('-') => draft.point_buy().decrement(stat),
                    _ => {
                        println!("Unknown command {command:?}");
                        continue;
                    }
                };
                if let Err(e) = outcome {
                    println!("{e}");
                }
            }
        }
    }
}

fn find_stat(name: &str) -> Option<StatName> {
    StatName::iter().find(|stat| {
        stat.abbreviation().eq_ignore_ascii_case(name) || stat.as_ref().eq_ignore_ascii_case(name)
    })
}

fn print_stats(draft: &mut CharacterDraft) {
    let point_buy = draft.point_buy();
    for (stat, value) in point_buy.current().iter() {
        let reference = point_buy.reference().get(stat);
        println!(
            "  {} {value:>2} ({:+})",
            stat.abbreviation(),
            value - reference
        );
    }
    if point_buy.mode() == PointBuyMode::Bounded {
        println!(
            "  Points left to add: {}, to reduce: {}",
            point_buy.points_available_to_add(),
            point_buy.points_available_to_reduce()
        );
    }
}

// endregion:  --- Character creation

fn print_sheet(sheet: &CharacterSheet) {
    println!("\n{} - HP {}/{}", sheet.title(), sheet.hp, sheet.max_hp);
    let stats: Vec<String> = sheet
        .stats
        .iter()
        .map(|(stat, value)| format!("{} {value}", stat.abbreviation()))
        .collect();
    println!("{}", stats.join("  "));
    if !sheet.statuses.is_empty() {
        println!("Statuses: {}", sheet.statuses.join(", "));
    }
    println!();
}

async fn prompt_line(input: &mut Input, prompt: &str) -> Result<Option<String>> {
    print!("{prompt}");
    std::io::stdout().flush()?;
    Ok(input.next_line().await?)
}

// Narration arrives as the full displayable text so far; only the new suffix is printed.
async fn print_events(mut events: mpsc::UnboundedReceiver<SessionEvent>) {
    let mut printed: HashMap<uuid::Uuid, String> = HashMap::new();
    while let Some(event) = events.recv().await {
        match event {
            SessionEvent::NarrationStarted(id) => {
                printed.insert(id, String::new());
            }
            SessionEvent::NarrationUpdated { text, .. } if text == THINKING_PLACEHOLDER => {}
            SessionEvent::NarrationUpdated { id, text } => {
                let shown = printed.entry(id).or_default();
                if let Some(suffix) = text.strip_prefix(shown.as_str()) {
                    print!("{suffix}");
                    let _ = std::io::stdout().flush();
                    *shown = text;
                }
            }
            SessionEvent::NarrationFinished(message) => {
                let shown = printed.remove(&message.id).unwrap_or_default();
                match message.content.strip_prefix(shown.as_str()) {
                    Some(rest) => println!("{rest}\n"),
                    None => println!("\n{}\n", message.content),
                }
            }
            SessionEvent::NarrationDiscarded(id) => {
                if printed.remove(&id).is_some_and(|shown| !shown.is_empty()) {
                    println!();
                }
            }
            SessionEvent::StateChanged(state) => {
                log::debug!("HP {}/{}", state.sheet.hp, state.sheet.max_hp);
                if let Some(focus) = &state.focus {
                    println!("[Focus: {} ({})]", focus.name, focus.kind);
                }
            }
            SessionEvent::RollRequested(request) => {
                let stats: Vec<String> = request.stats_to_roll.iter().map(ToString::to_string).collect();
                println!(
                    "[Roll requested: {} ({}). Type /roll]",
                    request.description,
                    stats.join(", ")
                );
            }
            SessionEvent::Notice(message) if message.message_type == MessageType::System => {
                println!("[{}]", message.content);
            }
            SessionEvent::Notice(message) => println!("{}", message.content),
        }
    }
}
