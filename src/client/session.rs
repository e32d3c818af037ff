use super::model::{ChatModel, Reply};

use anyhow::Result;
use serde_json::Value;

#[derive(Debug, Clone, PartialEq)]
pub enum Turn {
    User(String),
    Model(Reply),
    FunctionResult {
        call_id: String,
        name: String,
        response: Value,
    },
}

/// Append-only conversation history with the model.
#[derive(Debug, Default)]
pub struct ChatSession {
    turns: Vec<Turn>,
}

impl ChatSession {
    pub fn new() -> Self {
        Self { turns: vec![] }
    }

    /// Append `turns` and ask the model for the next reply. The reply is not
    /// part of the history until it is passed to `record`.
    pub async fn send<M>(&mut self, model: &M, turns: Vec<Turn>) -> Result<Reply>
    where
        M: ChatModel + ?Sized,
    {
        self.turns.extend(turns);
        tracing::debug!(turns = self.turns.len(), "sending chat session");
        model.generate(&self.turns).await
    }

    /// Append a model reply. Empty replies leave the history untouched.
    pub fn record(&mut self, reply: Reply) {
        if !reply.is_empty() {
            self.turns.push(Turn::Model(reply));
        }
    }
}
