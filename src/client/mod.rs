pub mod cli;
mod error;
pub mod gemini;
mod model;
mod session;

pub use error::TurnError;
pub use model::{ChatModel, Reply};
pub use session::{ChatSession, Turn};
