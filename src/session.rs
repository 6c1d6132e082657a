//! The session loop.
//!
//! One exchange at a time: send a message (player input, the opening request or a dice report),
//! stream the reply through the parser, then apply its directives before anything else may be
//! sent. Methods take `&mut self`, so a second exchange cannot start while one is in flight.
use crate::character::CharacterSheet;
use crate::dice::{DiceRollReport, RollGate};
use crate::directive::DiceRollRequest;
use crate::error::{NarrationError, SessionError};
use crate::message::{Message, MessageType, THINKING_PLACEHOLDER};
use crate::narration::{NarrationChannel, NarrationStream};
use crate::parser::StreamingParser;
use crate::prompt;
use crate::reducer::{self, Rejection, SceneState};
use futures::StreamExt;
use rand::Rng;
use tokio::sync::mpsc;
use uuid::Uuid;

// What the presentation layer is told while the session runs.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    NarrationStarted(Uuid),
    NarrationUpdated { id: Uuid, text: String },
    NarrationFinished(Message),
    NarrationDiscarded(Uuid), // The reply had nothing to display, or the exchange failed.
    StateChanged(Box<SceneState>),
    RollRequested(DiceRollRequest),
    Notice(Message),
}

// Summary of one completed exchange.
#[derive(Debug, Clone, PartialEq)]
pub struct ExchangeOutcome {
    pub narration: Option<Message>,
    pub rejected: Vec<Rejection>,
    pub roll_requested: Option<DiceRollRequest>,
}

pub struct Session<C: NarrationChannel> {
    channel: C,
    state: SceneState,
    messages: Vec<Message>,
    events: mpsc::UnboundedSender<SessionEvent>,
    disabled: Option<String>, // Set when the channel could not be initialized.
}

impl<C: NarrationChannel> Session<C> {
    // Open the channel with the narrator preamble. A failure here disables the session for good.
    pub async fn start(
        sheet: CharacterSheet,
        mut channel: C,
        events: mpsc::UnboundedSender<SessionEvent>,
    ) -> Self {
        let disabled = match channel.open(&prompt::narrator_preamble(&sheet)).await {
            Ok(()) => None,
            Err(e) => {
                log::error!("Failed to initialize the narration channel: {e:#?}");
                Some(e.to_string())
            }
        };
        let mut session = Self {
            channel,
            state: SceneState::new(sheet),
            messages: Vec::new(),
            events,
            disabled,
        };
        if let Some(reason) = session.disabled.clone() {
            session.notice(format!(
                "Could not start the adventure with the narrator ({reason}). Check your API key and try again."
            ));
        }
        session
    }

    pub fn state(&self) -> &SceneState {
        &self.state
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled.is_some()
    }

    pub fn pending_roll(&self) -> Option<&DiceRollRequest> {
        self.state.roll_gate.request()
    }

    // Free-text input is accepted only when the narrator is reachable and no roll is pending.
    pub fn accepts_input(&self) -> bool {
        self.disabled.is_none() && !self.state.roll_gate.is_active()
    }

    // Ask the narrator for the opening scene.
    pub async fn begin(&mut self) -> Result<ExchangeOutcome, SessionError> {
        self.ensure_enabled()?;
        let stream = self.dispatch(prompt::OPENING_REQUEST).await?;
        self.stream_response(stream, None).await
    }

    pub async fn submit_input(&mut self, input: &str) -> Result<ExchangeOutcome, SessionError> {
        self.ensure_enabled()?;
        if let Some(request) = self.state.roll_gate.request() {
            return Err(SessionError::RollPending(request.description.clone()));
        }
        let input = input.trim();
        if input.is_empty() {
            return Err(SessionError::EmptyInput);
        }

        self.record(Message::user(input));
        let stream = self.dispatch(input).await?;
        self.stream_response(stream, None).await
    }

    // Roll the pending request, send the report, and release the gate once the reply has streamed
    // in full. If sending or streaming fails the report is kept, and a retry sends it again.
    pub async fn complete_roll(
        &mut self,
        rng: &mut impl Rng,
    ) -> Result<ExchangeOutcome, SessionError> {
        self.ensure_enabled()?;
        let first_attempt = matches!(self.state.roll_gate, RollGate::Awaiting(_));
        let report = self.state.roll_gate.roll(&self.state.sheet.stats, rng)?;
        if first_attempt {
            self.notice(report.to_player_notice());
        }

        let stream = self.dispatch(&report.to_narration_message()).await?;
        self.stream_response(stream, Some(&report)).await
    }

    fn ensure_enabled(&self) -> Result<(), SessionError> {
        match &self.disabled {
            Some(reason) => Err(SessionError::Disabled(reason.clone())),
            None => Ok(()),
        }
    }

    async fn dispatch(&mut self, outbound: &str) -> Result<NarrationStream, SessionError> {
        log::debug!("Sending to narrator: {outbound}");
        match self.channel.send(outbound).await {
            Ok(stream) => Ok(stream),
            Err(e) => Err(self.fail_exchange(e, None)),
        }
    }

    // `settles` is the dice report the outbound message carried. The gate is released once the
    // reply has arrived in full, before its directives run, so the reply may arm the next roll.
    async fn stream_response(
        &mut self,
        mut stream: NarrationStream,
        settles: Option<&DiceRollReport>,
    ) -> Result<ExchangeOutcome, SessionError> {
        let live = Message::game(THINKING_PLACEHOLDER);
        let live_id = live.id;
        self.record(live);
        self.emit(SessionEvent::NarrationStarted(live_id));

        let mut parser = StreamingParser::new();
        while let Some(fragment) = stream.next().await {
            match fragment {
                Ok(chunk) => {
                    let text = parser.push(&chunk);
                    let text = if text.is_empty() {
                        THINKING_PLACEHOLDER.to_string()
                    } else {
                        text
                    };
                    self.set_content(live_id, &text);
                    self.emit(SessionEvent::NarrationUpdated { id: live_id, text });
                }
                Err(e) => return Err(self.fail_exchange(e, Some(live_id))),
            }
        }

        self.channel.complete(parser.buffer());
        if let Some(report) = settles {
            self.state.roll_gate.release(report)?;
        }
        let parsed = parser.finish();
        let reduction = reducer::apply_all(self.state.clone(), &parsed.directives);
        let state_changed = settles.is_some() || !reduction.applied.is_empty();
        let roll_requested = reduction
            .roll_armed()
            .then(|| reduction.state.roll_gate.request().cloned())
            .flatten();
        self.state = reduction.state;

        let narration = if parsed.text.is_empty() {
            self.remove_message(live_id);
            self.emit(SessionEvent::NarrationDiscarded(live_id));
            None
        } else {
            self.set_content(live_id, &parsed.text);
            let message = self.messages.iter().find(|m| m.id == live_id).cloned();
            if let Some(message) = &message {
                self.emit(SessionEvent::NarrationFinished(message.clone()));
            }
            message
        };

        if state_changed {
            self.emit(SessionEvent::StateChanged(Box::new(self.state.clone())));
        }
        if let Some(request) = &roll_requested {
            self.emit(SessionEvent::RollRequested(request.clone()));
        }
        log::debug!(
            "Exchange finished: {} directive(s) applied, {} rejected",
            reduction.applied.len(),
            reduction.rejected.len()
        );

        Ok(ExchangeOutcome {
            narration,
            rejected: reduction.rejected,
            roll_requested,
        })
    }

    // Abandon the exchange: drop the partial narration, tell the player, keep accepting input.
    fn fail_exchange(&mut self, error: NarrationError, live_id: Option<Uuid>) -> SessionError {
        log::error!("Narration exchange failed: {error:#?}");
        self.channel.abandon();
        if let Some(id) = live_id {
            self.remove_message(id);
            self.emit(SessionEvent::NarrationDiscarded(id));
        }
        self.notice(format!(
            "The connection to the narrator was lost ({error}). Try sending your message again."
        ));
        SessionError::Narration(error)
    }

    fn notice(&mut self, content: String) {
        let message = Message::system(content);
        self.record(message.clone());
        self.emit(SessionEvent::Notice(message));
    }

    fn record(&mut self, message: Message) {
        self.messages.push(message);
    }

    fn set_content(&mut self, id: Uuid, content: &str) {
        if let Some(message) = self.messages.iter_mut().find(|m| m.id == id) {
            message.content = content.to_string();
        }
    }

    fn remove_message(&mut self, id: Uuid) {
        self.messages
            .retain(|m| !(m.id == id && m.message_type == MessageType::Game));
    }

    fn emit(&self, event: SessionEvent) {
        let _ = self.events.send(event);
    }
}
