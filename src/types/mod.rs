mod tool;
mod tool_object;
mod toolset;

pub use tool::Tool;
pub use toolset::{ToolCallError, ToolSet, ToolSetCreationError};
