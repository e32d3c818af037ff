use super::session::Turn;

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;

/// A function invocation requested by the model.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionCall {
    pub id: String,
    pub name: String,
    pub args: Value,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Part {
    Text(String),
    FunctionCall(FunctionCall),
}

/// One model response, as ordered content parts.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Reply {
    pub parts: Vec<Part>,
}

impl Reply {
    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    pub fn function_calls(&self) -> impl Iterator<Item = &FunctionCall> {
        self.parts.iter().filter_map(|part| match part {
            Part::FunctionCall(call) => Some(call),
            Part::Text(_) => None,
        })
    }

    /// This reply with its function calls removed.
    pub fn without_function_calls(self) -> Reply {
        Reply {
            parts: self
                .parts
                .into_iter()
                .filter(|part| matches!(part, Part::Text(_)))
                .collect(),
        }
    }

    /// All text parts concatenated in order.
    pub fn text(&self) -> String {
        self.parts
            .iter()
            .filter_map(|part| match part {
                Part::Text(text) => Some(text.as_str()),
                Part::FunctionCall(_) => None,
            })
            .collect()
    }
}

/// The remote side of a chat session.
///
/// Given every turn so far, produce the model's next reply.
#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn generate(&self, turns: &[Turn]) -> Result<Reply>;
}
