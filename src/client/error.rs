use crate::types::ToolCallError;

use thiserror::Error;

/// Failures that abort a turn, and with it the whole session.
#[derive(Debug, Error)]
pub enum TurnError {
    #[error("empty response from model")]
    EmptyResponse,
    #[error("model called unknown function: {0}")]
    UnknownFunction(String),
    #[error("error marshaling function args: {0}")]
    ArgumentEncoding(serde_json::Error),
    #[error("error executing function {name}: {source}")]
    ToolExecution { name: String, source: ToolCallError },
}
