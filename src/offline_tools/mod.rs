mod calculator;

use crate::types::{ToolSet, ToolSetCreationError};

use calculator::Calculator;

pub fn offline_toolset() -> Result<ToolSet, ToolSetCreationError> {
    ToolSet::new().add_tool::<Calculator>()
}
