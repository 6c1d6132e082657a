// Shared fixtures for the integration tests.
#![allow(dead_code)]

use async_trait::async_trait;
use futures::stream;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use taleforge::character::{CharacterIdentity, CharacterSheet, Class, Race, Skill};
use taleforge::narration::{NarrationChannel, NarrationStream};
use taleforge::stats::{StatBlock, StatName};
use taleforge::NarrationError;

// Strength 14, Wisdom 8, everything else 10.
pub fn dummy_stats() -> StatBlock {
    let mut stats = StatBlock::default();
    stats.set(StatName::Strength, 14);
    stats.set(StatName::Wisdom, 8);
    stats
}

pub fn dummy_sheet() -> CharacterSheet {
    let identity = CharacterIdentity::new(
        "Mira".to_string(),
        Race::Elf,
        Class::Ranger,
        "Raised by wolves at the edge of the Thornwood.".to_string(),
        false,
    );
    CharacterSheet::new(
        identity,
        dummy_stats(),
        vec![Skill {
            name: "Tracking".to_string(),
            description: "Reads trails like a book.".to_string(),
        }],
        vec!["The Thornwood".to_string()],
    )
}

// What the scripted channel answers to the next outbound message.
#[derive(Debug, Clone)]
pub enum Script {
    Reply(Vec<String>),
    FailSend,
    FailMidStream(Vec<String>),
}

impl Script {
    // The whole text split into chunks of `size` characters.
    pub fn chunked(text: &str, size: usize) -> Self {
        let chars: Vec<char> = text.chars().collect();
        Script::Reply(
            chars
                .chunks(size.max(1))
                .map(|chunk| chunk.iter().collect())
                .collect(),
        )
    }

    pub fn whole(text: &str) -> Self {
        Script::Reply(vec![text.to_string()])
    }
}

// Everything the channel saw, shared with the test after the channel moves into the session.
#[derive(Debug, Default)]
pub struct ChannelLog {
    pub preamble: Option<String>,
    pub sent: Vec<String>,
    pub completed: Vec<String>,
    pub abandoned: usize,
}

// In-memory narration channel replaying scripted replies in order.
pub struct ScriptedChannel {
    scripts: VecDeque<Script>,
    fail_open: bool,
    log: Arc<Mutex<ChannelLog>>,
}

impl ScriptedChannel {
    pub fn new(scripts: Vec<Script>) -> (Self, Arc<Mutex<ChannelLog>>) {
        let log = Arc::new(Mutex::new(ChannelLog::default()));
        let channel = Self {
            scripts: scripts.into(),
            fail_open: false,
            log: Arc::clone(&log),
        };
        (channel, log)
    }

    pub fn failing_open() -> (Self, Arc<Mutex<ChannelLog>>) {
        let (mut channel, log) = Self::new(Vec::new());
        channel.fail_open = true;
        (channel, log)
    }
}

#[async_trait]
impl NarrationChannel for ScriptedChannel {
    async fn open(&mut self, preamble: &str) -> Result<(), NarrationError> {
        if self.fail_open {
            return Err(NarrationError::MissingApiKey);
        }
        self.log.lock().expect("log lock").preamble = Some(preamble.to_string());
        Ok(())
    }

    async fn send(&mut self, message: &str) -> Result<NarrationStream, NarrationError> {
        self.log.lock().expect("log lock").sent.push(message.to_string());
        let items: Vec<Result<String, NarrationError>> = match self.scripts.pop_front() {
            None => return Err(NarrationError::Stream("script exhausted".to_string())),
            Some(Script::FailSend) => {
                return Err(NarrationError::Stream("connection refused".to_string()));
            }
            Some(Script::Reply(chunks)) => chunks.into_iter().map(Ok).collect(),
            Some(Script::FailMidStream(chunks)) => chunks
                .into_iter()
                .map(Ok)
                .chain(std::iter::once(Err(NarrationError::Stream(
                    "connection reset".to_string(),
                ))))
                .collect(),
        };
        Ok(Box::pin(stream::iter(items)))
    }

    fn complete(&mut self, reply: &str) {
        self.log.lock().expect("log lock").completed.push(reply.to_string());
    }

    fn abandon(&mut self) {
        self.log.lock().expect("log lock").abandoned += 1;
    }
}
