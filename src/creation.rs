// Character creation: identity, race and class, backstory analysis, manual point-buy, finalize.
use crate::character::{CharacterIdentity, CharacterSheet, Class, Race, Skill};
use crate::composer::{PointBuy, PointBuyMode, PointBuyRules, ai_baseline};
use crate::error::{CreationError, NarrationError};
use crate::prompt;
use crate::stats::{StatBlock, StatDeltas};
use async_openai::{
    Client,
    config::OpenAIConfig,
    types::{
        ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequestArgs, ResponseFormat,
    },
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;

// What the model suggests after reading the backstory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiStatSuggestion {
    pub stat_modifiers: StatDeltas,
    pub world_elements: Vec<String>,
    pub skills: Vec<Skill>,
}

// Raw model output. Modifier keys are free text until matched against attribute names.
#[derive(Debug, Deserialize)]
struct RawSuggestion {
    #[serde(default)]
    stat_modifiers: BTreeMap<String, i32>,
    #[serde(default)]
    world_elements: Vec<String>,
    #[serde(default)]
    skills: Vec<Skill>,
}

impl AiStatSuggestion {
    // Zero modifiers, used when the analysis is unavailable or failed.
    pub fn neutral(reason: &str) -> Self {
        Self {
            stat_modifiers: StatDeltas::new(),
            world_elements: vec![reason.to_string()],
            skills: vec![Skill {
                name: "No skills generated".to_string(),
                description: reason.to_string(),
            }],
        }
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let raw: RawSuggestion = serde_json::from_str(json)?;
        Ok(Self {
            stat_modifiers: StatDeltas::from_loose(&raw.stat_modifiers),
            world_elements: raw.world_elements,
            skills: raw.skills,
        })
    }
}

pub struct BackstoryAnalyst {
    client: Client<OpenAIConfig>,
    model: String,
}

impl BackstoryAnalyst {
    pub fn new(api_key: String, api_base: Option<String>, model: String) -> Self {
        let mut config = OpenAIConfig::new().with_api_key(api_key);
        if let Some(api_base) = api_base {
            config = config.with_api_base(api_base);
        }
        Self {
            client: Client::with_config(config),
            model,
        }
    }

    pub async fn analyze(
        &self,
        race: Race,
        class: Class,
        backstory: &str,
    ) -> Result<AiStatSuggestion, NarrationError> {
        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .response_format(ResponseFormat::JsonObject)
            .messages(vec![
                ChatCompletionRequestSystemMessageArgs::default()
                    .content(prompt::ANALYST_PREAMBLE)
                    .build()?
                    .into(),
                ChatCompletionRequestUserMessageArgs::default()
                    .content(prompt::backstory_request(race, class, backstory))
                    .build()?
                    .into(),
            ])
            .build()?;

        let response = self.client.chat().create(request).await?;
        let content = response
            .choices
            .into_iter()
            .find_map(|choice| choice.message.content)
            .ok_or(NarrationError::NoContent)?;
        log::debug!("Backstory analysis: {content}");

        Ok(AiStatSuggestion::from_json(&content)?)
    }
}

// Runs the analysis when possible, and always comes back with a usable suggestion.
pub async fn suggest_or_neutral(
    analyst: Option<&BackstoryAnalyst>,
    race: Race,
    class: Class,
    backstory: &str,
) -> AiStatSuggestion {
    let Some(analyst) = analyst else {
        return AiStatSuggestion::neutral("AI features are disabled: no API key.");
    };
    match analyst.analyze(race, class, backstory).await {
        Ok(suggestion) => suggestion,
        Err(e) => {
            log::error!("Backstory analysis failed: {e:#?}");
            AiStatSuggestion::neutral("AI analysis failed.")
        }
    }
}

// Step-by-step builder of the initial character sheet.
#[derive(Debug, Clone)]
pub struct CharacterDraft {
    name: String,
    race: Option<Race>,
    class: Option<Class>,
    backstory: String,
    nsfw_enabled: bool,
    suggestion: Option<AiStatSuggestion>,
    point_buy: Option<PointBuy>,
    mode: PointBuyMode,
    rules: PointBuyRules,
}

impl CharacterDraft {
    pub fn new(rules: PointBuyRules) -> Self {
        Self {
            name: String::new(),
            race: None,
            class: None,
            backstory: String::new(),
            nsfw_enabled: false,
            suggestion: None,
            point_buy: None,
            mode: PointBuyMode::default(),
            rules,
        }
    }

    pub fn set_name(&mut self, name: &str) -> Result<(), CreationError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(CreationError::MissingName);
        }
        self.name = name.to_string();
        Ok(())
    }

    pub fn choose_race(&mut self, id: &str) -> Result<Race, CreationError> {
        let race = Race::from_str(id.trim()).map_err(|_| CreationError::UnknownRace(id.to_string()))?;
        self.race = Some(race);
        self.point_buy = None;
        Ok(race)
    }

    pub fn choose_class(&mut self, id: &str) -> Result<Class, CreationError> {
        let class =
            Class::from_str(id.trim()).map_err(|_| CreationError::UnknownClass(id.to_string()))?;
        self.class = Some(class);
        self.point_buy = None;
        Ok(class)
    }

    pub fn set_backstory(&mut self, backstory: &str) -> Result<(), CreationError> {
        let backstory = backstory.trim();
        if backstory.is_empty() {
            return Err(CreationError::MissingBackstory);
        }
        self.backstory = backstory.to_string();
        Ok(())
    }

    pub fn set_nsfw(&mut self, enabled: bool) {
        self.nsfw_enabled = enabled;
    }

    pub fn race(&self) -> Option<Race> {
        self.race
    }

    pub fn class(&self) -> Option<Class> {
        self.class
    }

    pub fn backstory(&self) -> &str {
        &self.backstory
    }

    // Base plus race plus class, before any suggestion.
    pub fn baseline(&self) -> StatBlock {
        let race = self.race.map(|race| race.stat_modifiers()).unwrap_or_default();
        let class = self.class.map(|class| class.stat_modifiers()).unwrap_or_default();
        ai_baseline(&StatBlock::default(), &race, &class)
    }

    // The suggestion's deltas define the new reference; manual tuning restarts from zero.
    pub fn apply_suggestion(&mut self, suggestion: AiStatSuggestion) {
        let reference = self.baseline().with_deltas(&suggestion.stat_modifiers);
        self.point_buy = Some(PointBuy::new(reference, self.mode, self.rules));
        self.suggestion = Some(suggestion);
    }

    pub fn set_mode(&mut self, mode: PointBuyMode) {
        self.mode = mode;
        if let Some(point_buy) = self.point_buy.as_mut() {
            point_buy.set_mode(mode);
        }
    }

    pub fn point_buy(&mut self) -> &mut PointBuy {
        let reference = match &self.suggestion {
            Some(suggestion) => self.baseline().with_deltas(&suggestion.stat_modifiers),
            None => self.baseline(),
        };
        let (mode, rules) = (self.mode, self.rules);
        self.point_buy
            .get_or_insert_with(|| PointBuy::new(reference, mode, rules))
    }

    pub fn finalize(mut self) -> Result<CharacterSheet, CreationError> {
        if self.name.is_empty() {
            return Err(CreationError::MissingName);
        }
        let race = self.race.ok_or(CreationError::MissingRace)?;
        let class = self.class.ok_or(CreationError::MissingClass)?;
        if self.backstory.is_empty() {
            return Err(CreationError::MissingBackstory);
        }

        let point_buy = self.point_buy();
        point_buy.validate()?;
        let stats = point_buy.current().clone();

        let (world_elements, skills) = match self.suggestion.take() {
            Some(suggestion) => (suggestion.world_elements, suggestion.skills),
            None => (
                vec!["No special world elements from the backstory.".to_string()],
                vec![Skill {
                    name: "No generated skills".to_string(),
                    description: "The backstory was not analyzed.".to_string(),
                }],
            ),
        };

        let identity = CharacterIdentity::new(self.name, race, class, self.backstory, self.nsfw_enabled);
        let sheet = CharacterSheet::new(identity, stats, skills, world_elements);
        log::info!("Character created: {} ({}/{} HP)", sheet.title(), sheet.hp, sheet.max_hp);
        Ok(sheet)
    }
}
