// The narration channel: one outbound message, then a stream of text fragments back.
use crate::error::NarrationError;
use async_openai::{
    Client,
    config::OpenAIConfig,
    types::{
        ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage,
        ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequestArgs,
    },
};
use async_trait::async_trait;
use futures::{Stream, StreamExt};
use std::pin::Pin;

// Fragments carry no meaning at their boundaries; the end of the stream is the end marker.
pub type NarrationStream = Pin<Box<dyn Stream<Item = Result<String, NarrationError>> + Send>>;

#[async_trait]
pub trait NarrationChannel: Send {
    // Prepare the conversation with the narrator's system instruction.
    async fn open(&mut self, preamble: &str) -> Result<(), NarrationError>;

    // Send one message and get the response stream.
    async fn send(&mut self, message: &str) -> Result<NarrationStream, NarrationError>;

    // Record the full raw reply once the stream ended cleanly.
    fn complete(&mut self, reply: &str);

    // Forget the pending exchange after a failure.
    fn abandon(&mut self);
}

// Chat-completion streaming against any OpenAI-compatible endpoint.
pub struct OpenAINarrator {
    client: Client<OpenAIConfig>,
    model: String,
    has_api_key: bool,
    language: Option<String>, // Appended to the preamble when set.
    history: Vec<ChatCompletionRequestMessage>,
    pending: Option<ChatCompletionRequestMessage>,
}

impl OpenAINarrator {
    pub fn new(api_key: String, api_base: Option<String>, model: String) -> Self {
        let has_api_key = !api_key.trim().is_empty();
        let mut config = OpenAIConfig::new().with_api_key(api_key);
        if let Some(api_base) = api_base {
            config = config.with_api_base(api_base);
        }
        Self {
            client: Client::with_config(config),
            model,
            has_api_key,
            language: None,
            history: Vec::new(),
            pending: None,
        }
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into()).filter(|l: &String| !l.trim().is_empty());
        self
    }
}

#[async_trait]
impl NarrationChannel for OpenAINarrator {
    async fn open(&mut self, preamble: &str) -> Result<(), NarrationError> {
        if !self.has_api_key {
            return Err(NarrationError::MissingApiKey);
        }
        let content = match &self.language {
            Some(language) => format!("{preamble}\nAlways write the narration in {language}.\n"),
            None => preamble.to_string(),
        };
        let system = ChatCompletionRequestSystemMessageArgs::default()
            .content(content)
            .build()?;
        self.history = vec![system.into()];
        self.pending = None;
        log::debug!("Narrator opened with model {}", self.model);
        Ok(())
    }

    async fn send(&mut self, message: &str) -> Result<NarrationStream, NarrationError> {
        if self.history.is_empty() {
            return Err(NarrationError::NotInitialized);
        }
        let user: ChatCompletionRequestMessage = ChatCompletionRequestUserMessageArgs::default()
            .content(message)
            .build()?
            .into();

        let mut messages = self.history.clone();
        messages.push(user.clone());
        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .build()?;

        let stream = self.client.chat().create_stream(request).await?;
        self.pending = Some(user);

        let fragments = stream.filter_map(|response| async move {
            match response {
                Ok(response) => {
                    let text: String = response
                        .choices
                        .into_iter()
                        .filter_map(|choice| choice.delta.content)
                        .collect();
                    (!text.is_empty()).then_some(Ok(text))
                }
                Err(e) => Some(Err(NarrationError::Stream(e.to_string()))),
            }
        });
        Ok(Box::pin(fragments))
    }

    fn complete(&mut self, reply: &str) {
        let Some(user) = self.pending.take() else {
            return;
        };
        match ChatCompletionRequestAssistantMessageArgs::default()
            .content(reply)
            .build()
        {
            Ok(assistant) => {
                self.history.push(user);
                self.history.push(assistant.into());
            }
            Err(e) => log::error!("Failed to record narrator reply: {e:#?}"),
        }
    }

    fn abandon(&mut self) {
        self.pending = None;
    }
}
