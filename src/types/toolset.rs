use super::Tool;
use super::tool_object::{ToolObject, ValidationError};

use async_openai::types::ChatCompletionTool;
use schemars::JsonSchema;
use serde::de::Deserialize;
use std::collections::hash_map::HashMap;
use thiserror::Error;

/// Fixed registry of local tools, keyed by name.
#[derive(Default)]
pub struct ToolSet {
    tools: HashMap<String, ToolObject>,
    // registration order, used when advertising
    order: Vec<String>,
}

#[derive(Debug, Error)]
pub enum ToolSetCreationError {
    #[error("error validating schema")]
    Validation(ValidationError),
    #[error("two or more tools have the same name: {0}")]
    NameConflict(String),
}

#[derive(Debug, Error)]
pub enum ToolCallError {
    #[error("malformed input (possible hallucination): {0}")]
    Deserialization(serde_json::Error),
    #[error("unknown function: {0}")]
    NotFound(String),
    #[error("{0}")]
    Execution(anyhow::Error),
}

impl ToolSet {
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
            order: vec![],
        }
    }

    pub fn add_tool<T>(mut self) -> Result<Self, ToolSetCreationError>
    where
        T: JsonSchema + Tool + Send + Sync + for<'de> Deserialize<'de> + 'static,
    {
        let tool_object =
            ToolObject::try_from_tool::<T>().map_err(ToolSetCreationError::Validation)?;
        if self.tools.contains_key(&tool_object.name) {
            Err(ToolSetCreationError::NameConflict(tool_object.name.clone()))
        } else {
            self.order.push(tool_object.name.clone());
            self.tools.insert(tool_object.name.clone(), tool_object);
            Ok(self)
        }
    }

    pub fn get(&self, tool_name: &str) -> Option<&ToolObject> {
        self.tools.get(tool_name)
    }

    pub fn try_tool_call(&self, tool_name: &str, json: &str) -> Result<String, ToolCallError> {
        self.get(tool_name)
            .ok_or_else(|| ToolCallError::NotFound(tool_name.to_owned()))?
            .call(json)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }
}

impl ToolSet {
    pub fn openai_chatcompletion_toolset(&self) -> Vec<ChatCompletionTool> {
        self.order
            .iter()
            .filter_map(|name| self.tools.get(name))
            .map(ChatCompletionTool::from)
            .collect()
    }
}
