use crate::llm::client::LLMClient;
use crate::types::{AppError, Result};
use async_trait::async_trait;
use ollama_rs::{
    Ollama,
    generation::chat::{ChatMessage, request::ChatMessageRequest},
};
use url::Url;

pub struct OllamaClient {
    client: Ollama,
    model: String,
}

impl OllamaClient {
    pub fn new(base_url: &str, model: String) -> Result<Self> {
        let url = Url::parse(base_url).map_err(|e| {
            AppError::Configuration(format!("Invalid Ollama base URL '{}': {}", base_url, e))
        })?;

        Ok(Self {
            client: Ollama::from_url(url),
            model,
        })
    }

    async fn chat(&self, messages: Vec<ChatMessage>) -> Result<String> {
        let request = ChatMessageRequest::new(self.model.clone(), messages);

        let response = self
            .client
            .send_chat_messages(request)
            .await
            .map_err(|e| AppError::Transport(format!("Ollama error: {}", e)))?;

        Ok(response.message.content)
    }
}

#[async_trait]
impl LLMClient for OllamaClient {
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.chat(vec![ChatMessage::user(prompt.to_string())]).await
    }

    async fn generate_with_system(&self, system: &str, prompt: &str) -> Result<String> {
        self.chat(vec![
            ChatMessage::system(system.to_string()),
            ChatMessage::user(prompt.to_string()),
        ])
        .await
    }

    async fn complete(&self, system: &str, messages: &[(String, String)]) -> Result<String> {
        let mut chat_messages = vec![ChatMessage::system(system.to_string())];
        chat_messages.extend(messages.iter().map(|(role, content)| match role.as_str() {
            "system" => ChatMessage::system(content.clone()),
            "assistant" => ChatMessage::assistant(content.clone()),
            _ => ChatMessage::user(content.clone()),
        }));

        self.chat(chat_messages).await
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
