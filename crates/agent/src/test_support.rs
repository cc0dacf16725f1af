use std::sync::Mutex;

use async_trait::async_trait;

use parley_core::prompts::ChatPrompt;

use crate::llm::{LlmClient, LlmError};

/// Scripted model: returns the queued reply, or a 500 when constructed with `failing`.
pub struct ScriptedLlm {
    reply: Option<String>,
    pub prompts: Mutex<Vec<ChatPrompt>>,
}

impl ScriptedLlm {
    pub fn replying(reply: &str) -> Self {
        Self { reply: Some(reply.to_string()), prompts: Mutex::default() }
    }

    pub fn failing() -> Self {
        Self { reply: None, prompts: Mutex::default() }
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().expect("prompt lock").len()
    }

    pub fn last_prompt(&self) -> Option<ChatPrompt> {
        self.prompts.lock().expect("prompt lock").last().cloned()
    }
}

#[async_trait]
impl LlmClient for ScriptedLlm {
    async fn complete(&self, prompt: &ChatPrompt) -> Result<String, LlmError> {
        self.prompts.lock().expect("prompt lock").push(prompt.clone());
        self.reply.clone().ok_or_else(|| LlmError::Status {
            status: 500,
            message: "upstream exploded".to_string(),
        })
    }
}
